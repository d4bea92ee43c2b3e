/// Errors from invoking the search action over HTTP.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The server answered with something that is not an action envelope.
    #[error("Unexpected response ({status}): {body}")]
    Decode {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },
}
