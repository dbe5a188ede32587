//! Unique node naming.

/// Returns a name derived from `base` that is not in `existing`.
///
/// `base` is returned unchanged when it is free. Otherwise the smallest
/// positive integer suffix `n` such that `base{n}` is free is appended.
pub fn generate_unique_name<S>(base: &str, existing: &[S]) -> String
where
    S: AsRef<str>,
{
    let taken = |candidate: &str| existing.iter().any(|name| name.as_ref() == candidate);

    if !taken(base) {
        return base.to_string();
    }

    let mut suffix: u64 = 1;
    loop {
        let candidate = format!("{base}{suffix}");
        if !taken(&candidate) {
            return candidate;
        }
        suffix += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_name_is_unchanged() {
        let existing: [&str; 0] = [];
        assert_eq!(generate_unique_name("HTTP Request", &existing), "HTTP Request");
    }

    #[test]
    fn taken_name_gets_first_suffix() {
        assert_eq!(
            generate_unique_name("HTTP Request", &["HTTP Request"]),
            "HTTP Request1"
        );
        assert_eq!(
            generate_unique_name("HTTP Request", &["HTTP Request", "HTTP Request1"]),
            "HTTP Request2"
        );
    }

    #[test]
    fn fills_the_smallest_gap() {
        let existing = vec![
            "Set".to_string(),
            "Set1".to_string(),
            "Set3".to_string(),
        ];
        assert_eq!(generate_unique_name("Set", &existing), "Set2");
    }

    #[test]
    fn unrelated_names_do_not_interfere() {
        assert_eq!(generate_unique_name("Code", &["Code1", "Set"]), "Code");
    }
}
