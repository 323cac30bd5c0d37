use serde::{Deserialize, Serialize};
use thiserror::Error;

/// JSON error body returned by the HTTP endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
}

impl ApiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

/// A credential could not be obtained from the issuing endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("Token fetch failed: {status_text}")]
    Status { status_text: String },
    #[error("Token fetch failed: {0}")]
    Transport(String),
    #[error("Token fetch failed: malformed response: {0}")]
    MalformedResponse(String),
    #[error("Token fetch cancelled: session is shutting down")]
    Cancelled,
}
