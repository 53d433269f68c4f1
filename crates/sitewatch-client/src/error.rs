//! Error types for sitewatch-client

use thiserror::Error;

/// Errors raised while talking to the hosting provider.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Transport failure (DNS, TLS, connection reset, timeout)
    #[error("HTTP error: {0}")]
    Http(String),

    /// Non-success status from the API
    #[error("hosting API returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The requested site or deploy does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Response body did not match the expected shape
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// Site or deploy id that cannot name a single path segment
    #[error("invalid id: {0:?}")]
    InvalidId(String),

    /// Configured API base URL cannot carry a path
    #[error("invalid API URL: {0}")]
    InvalidUrl(String),

    /// No API token configured
    #[error("no API token configured (set SITEWATCH_API_TOKEN or NETLIFY_AUTH_TOKEN)")]
    MissingToken,
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Http(err.to_string())
    }
}

/// Result type for client operations
pub type ClientResult<T> = std::result::Result<T, ClientError>;
