//! Error handling foundation for flowdeck.
//!
//! Only the `Result` alias lives here. Each crate defines its own error
//! enum in its own `error` module; operations that cross I/O return those
//! wrapped in a rootcause `Report`, pure algorithms return them bare.

use rootcause::Report;

/// A Result whose error is a rootcause `Report` over context `C`.
pub type Result<T, C = ()> = std::result::Result<T, Report<C>>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;

    #[derive(Debug)]
    struct Unreachable;

    impl fmt::Display for Unreachable {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "engine unreachable")
        }
    }

    impl std::error::Error for Unreachable {}

    fn ping(up: bool) -> Result<u16, Unreachable> {
        if !up {
            return Err(Unreachable.into());
        }
        Ok(200)
    }

    #[test]
    fn context_converts_into_report() {
        assert_eq!(ping(true).expect("up"), 200);
        let report = ping(false).unwrap_err();
        assert!(report.to_string().contains("engine unreachable"));
    }
}
