//! The search action invocation surface.
//!
//! The controller is generic over [`SearchExecutor`], so customer and
//! ticket search (and tests) share one implementation.
//! [`HttpSearchExecutor`] is the production one, using [`reqwest`].

use std::time::Duration;

use async_trait::async_trait;
use repairdesk_core::search::{ActionResponse, SearchRequest, SearchResult};
use serde::de::DeserializeOwned;

use crate::error::ClientError;

/// Default quiet period before a typed query is searched.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Invoke the search action once.
#[async_trait]
pub trait SearchExecutor<T>: Send + Sync {
    /// Send `request` and return the action envelope.
    ///
    /// Server-side failures come back as `Ok` with `server_error` or
    /// `validation_errors` set; `Err` is reserved for transport problems.
    async fn execute(
        &self,
        request: SearchRequest,
    ) -> Result<ActionResponse<SearchResult<T>>, ClientError>;
}

/// Connection settings for the search client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API root, e.g. `http://localhost:3000/api/v1`.
    pub base_url: String,
    /// Bearer token sent with every request.
    pub token: Option<String>,
    /// Debounce delay for typed queries.
    pub debounce: Duration,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: None,
            debounce: DEFAULT_DEBOUNCE,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }
}

/// HTTP client for one search action endpoint.
pub struct HttpSearchExecutor {
    client: reqwest::Client,
    url: String,
    token: Option<String>,
}

impl HttpSearchExecutor {
    /// Executor for the action at `{base_url}/{path}`.
    pub fn new(config: &ClientConfig, path: &str) -> Self {
        Self::with_client(reqwest::Client::new(), config, path)
    }

    /// Create an executor reusing an existing [`reqwest::Client`]
    /// (useful for connection pooling across endpoints).
    pub fn with_client(client: reqwest::Client, config: &ClientConfig, path: &str) -> Self {
        Self {
            client,
            url: format!(
                "{}/{}",
                config.base_url.trim_end_matches('/'),
                path.trim_start_matches('/')
            ),
            token: config.token.clone(),
        }
    }

    /// `POST /customers/search`.
    pub fn customers(config: &ClientConfig) -> Self {
        Self::new(config, "customers/search")
    }

    /// `POST /tickets/search`.
    pub fn tickets(config: &ClientConfig) -> Self {
        Self::new(config, "tickets/search")
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl<T: DeserializeOwned + Send> SearchExecutor<T> for HttpSearchExecutor {
    async fn execute(
        &self,
        request: SearchRequest,
    ) -> Result<ActionResponse<SearchResult<T>>, ClientError> {
        let mut builder = self.client.post(&self.url).json(&request);
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        decode_envelope(status, body)
    }
}

/// Parse an action envelope regardless of HTTP status.
///
/// 400, 429 and 500 responses still carry an envelope; anything that does
/// not parse (a proxy error page, an auth rejection) becomes
/// [`ClientError::Decode`].
pub fn decode_envelope<T: DeserializeOwned>(
    status: u16,
    body: String,
) -> Result<ActionResponse<SearchResult<T>>, ClientError> {
    match serde_json::from_str::<ActionResponse<SearchResult<T>>>(&body) {
        Ok(envelope)
            if envelope.data.is_some()
                || envelope.server_error.is_some()
                || envelope.validation_errors.is_some() =>
        {
            Ok(envelope)
        }
        _ => Err(ClientError::Decode { status, body }),
    }
}
