use axum::http::StatusCode;
use thiserror::Error;

/// Error taxonomy for the gateway. Every failure a request can hit maps onto
/// one of these before it reaches the HTTP layer.
#[derive(Debug, Error)]
pub enum ChatError {
    /// Malformed or missing request data. Maps to 400.
    #[error("invalid request: {0}")]
    InvalidInput(String),

    /// A provider call failed. The provider's status code is propagated to
    /// the caller when one was reported, otherwise 500.
    #[error("{provider} request failed: {message}")]
    Upstream {
        provider: &'static str,
        status: Option<u16>,
        message: String,
    },

    /// Anything uncaught. Maps to 500 with a generic body.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ChatError {
    pub fn upstream(provider: &'static str, status: Option<u16>, message: impl Into<String>) -> Self {
        ChatError::Upstream {
            provider,
            status,
            message: message.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ChatError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ChatError::Upstream { status, .. } => status
                .and_then(|s| StatusCode::from_u16(s).ok())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            ChatError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
