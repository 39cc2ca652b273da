use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::any::Any;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(#[source] reqwest::Error),

    #[error("Payload Too Large: {0}")]
    PayloadTooLarge(String),

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Internal Server Error: {0}")]
    Internal(String),
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        match self {
            ProxyError::BackendUnavailable(e) => {
                tracing::error!("Backend proxy error: {:?}", e);
                error_envelope(
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Backend service unavailable",
                    "Unable to connect to the backend service",
                )
            }
            ProxyError::PayloadTooLarge(msg) => {
                tracing::warn!("Rejected request body: {}", msg);
                error_envelope(StatusCode::PAYLOAD_TOO_LARGE, "Payload Too Large", &msg)
            }
            ProxyError::BadRequest(msg) => {
                tracing::warn!("Unreadable request body: {}", msg);
                error_envelope(StatusCode::BAD_REQUEST, "Bad Request", &msg)
            }
            ProxyError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                internal_error()
            }
        }
    }
}

/// JSON error body shared by every failure the proxy produces itself.
pub fn error_envelope(status: StatusCode, error: &str, message: &str) -> Response {
    (
        status,
        [(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*")],
        Json(json!({
            "error": error,
            "message": message,
        })),
    )
        .into_response()
}

fn internal_error() -> Response {
    error_envelope(
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal Server Error",
        "An unexpected error occurred",
    )
}

/// Turns a handler panic into the 500 envelope.
pub fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    tracing::error!("Handler panicked: {}", detail);
    internal_error()
}
