//! Engine REST API client.

use crate::config::EngineConfig;
use crate::error::EngineError;
use async_trait::async_trait;
use flowdeck_core::ExecutionId;
use flowdeck_execution::{ExecutionQuery, ExecutionRecord, FetchError};
use flowdeck_workflow::{InMemoryCatalog, NodeTypeDescription};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use tracing::{debug, instrument};

/// Read-only client for the engine's REST API.
#[derive(Clone)]
pub struct EngineClient {
    http: reqwest::Client,
    base_url: Url,
    include_data: bool,
}

impl EngineClient {
    /// Creates a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::InvalidConfig` if the base URL or API key
    /// header cannot be used.
    pub fn new(config: &EngineConfig) -> flowdeck_core::Result<Self, EngineError> {
        let base_url = parse_base_url(&config.base_url)?;

        let mut headers = HeaderMap::new();
        if let Some(key) = &config.api_key {
            let (name, value) = api_key_header(&config.api_key_header, key)?;
            headers.insert(name, value);
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| EngineError::InvalidConfig {
                reason: e.to_string(),
            })?;

        Ok(Self {
            http,
            base_url,
            include_data: config.include_data,
        })
    }

    /// Returns the API base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Fetches one execution. Returns `None` if the engine does not know it.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the engine answers with an
    /// error status, or the body is not an execution record.
    #[instrument(skip(self, id), fields(execution_id = %id))]
    pub async fn fetch_execution(
        &self,
        id: &ExecutionId,
    ) -> flowdeck_core::Result<Option<ExecutionRecord>, EngineError> {
        Ok(self.get_execution(id).await?)
    }

    /// Fetches every node type the engine has installed.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the engine answers with an
    /// error status, or the body is not a node-type list.
    #[instrument(skip(self))]
    pub async fn fetch_node_types(
        &self,
    ) -> flowdeck_core::Result<Vec<NodeTypeDescription>, EngineError> {
        let url = self.endpoint(&["node-types"])?;
        let Some(body) = self.get(url).await? else {
            return Ok(Vec::new());
        };
        let node_types = decode_node_types(&body)?;
        debug!(count = node_types.len(), "fetched node types");
        Ok(node_types)
    }

    /// Fetches the node types and indexes them into a catalog.
    ///
    /// # Errors
    ///
    /// Returns an error under the same conditions as
    /// [`fetch_node_types`](Self::fetch_node_types).
    pub async fn load_catalog(&self) -> flowdeck_core::Result<InMemoryCatalog, EngineError> {
        Ok(self.fetch_node_types().await?.into_iter().collect())
    }

    async fn get_execution(
        &self,
        id: &ExecutionId,
    ) -> Result<Option<ExecutionRecord>, EngineError> {
        let mut url = self.endpoint(&["executions", id.as_str()])?;
        url.query_pairs_mut()
            .append_pair("includeData", if self.include_data { "true" } else { "false" });

        match self.get(url).await? {
            Some(body) => decode_execution(&body).map(Some),
            None => Ok(None),
        }
    }

    /// Issues a GET. Returns `None` on 404.
    async fn get(&self, url: Url) -> Result<Option<Vec<u8>>, EngineError> {
        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|e| EngineError::RequestFailed {
                reason: e.to_string(),
            })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            debug!(%url, "engine returned not found");
            return Ok(None);
        }
        if !status.is_success() {
            return Err(EngineError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| EngineError::RequestFailed {
                reason: e.to_string(),
            })?;
        Ok(Some(body.to_vec()))
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, EngineError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| EngineError::InvalidConfig {
                reason: format!("base URL cannot carry a path: {}", self.base_url),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

impl std::fmt::Debug for EngineClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineClient")
            .field("base_url", &self.base_url.as_str())
            .field("include_data", &self.include_data)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ExecutionQuery for EngineClient {
    async fn fetch_execution(&self, id: &ExecutionId) -> Result<ExecutionRecord, FetchError> {
        self.get_execution(id)
            .await?
            .ok_or_else(|| FetchError::NotFound {
                execution_id: id.clone(),
            })
    }
}

fn parse_base_url(raw: &str) -> Result<Url, EngineError> {
    let url = Url::parse(raw).map_err(|e| EngineError::InvalidConfig {
        reason: format!("invalid base URL {raw:?}: {e}"),
    })?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(EngineError::InvalidConfig {
            reason: format!("base URL must be http or https: {raw}"),
        });
    }
    Ok(url)
}

fn api_key_header(name: &str, key: &str) -> Result<(HeaderName, HeaderValue), EngineError> {
    let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| EngineError::InvalidConfig {
        reason: format!("invalid API key header name: {e}"),
    })?;
    let mut value = HeaderValue::from_str(key).map_err(|e| EngineError::InvalidConfig {
        reason: format!("invalid API key: {e}"),
    })?;
    value.set_sensitive(true);
    Ok((name, value))
}

/// The engine answers either with a bare record or wrapped in `data`.
#[derive(Deserialize)]
#[serde(untagged)]
enum Envelope<T> {
    Wrapped { data: T },
    Bare(T),
}

impl<T> Envelope<T> {
    fn into_inner(self) -> T {
        match self {
            Self::Wrapped { data } | Self::Bare(data) => data,
        }
    }
}

fn decode_execution(body: &[u8]) -> Result<ExecutionRecord, EngineError> {
    serde_json::from_slice::<Envelope<ExecutionRecord>>(body)
        .map(Envelope::into_inner)
        .map_err(|e| EngineError::ResponseParseFailed {
            reason: e.to_string(),
        })
}

fn decode_node_types(body: &[u8]) -> Result<Vec<NodeTypeDescription>, EngineError> {
    serde_json::from_slice::<Envelope<Vec<NodeTypeDescription>>>(body)
        .map(Envelope::into_inner)
        .map_err(|e| EngineError::ResponseParseFailed {
            reason: e.to_string(),
        })
}
