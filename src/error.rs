use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid upstream URL: {0}")]
    InvalidUpstreamUrl(String),

    #[error("Upstream error: {0}")]
    UpstreamError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

pub type Result<T> = std::result::Result<T, ProxyError>;

impl ProxyError {
    /// Status code surfaced to the caller when this error ends a request.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ProxyError::UpstreamError(_) => StatusCode::BAD_GATEWAY,
            ProxyError::ConfigError(_)
            | ProxyError::InvalidUpstreamUrl(_)
            | ProxyError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match status {
            StatusCode::BAD_GATEWAY => "Bad gateway",
            _ => "Internal server error",
        };
        (status, message).into_response()
    }
}
