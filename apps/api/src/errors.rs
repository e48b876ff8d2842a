use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
///
/// Only failures that happen before an SSE channel is opened become `AppError`s.
/// Faults after that point are reported in-band as terminal stream events.
#[derive(Debug, Error)]
pub enum AppError {
    /// Missing or malformed request fields. Never reaches a provider.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unsupported provider: {0}")]
    UnsupportedProvider(String),

    #[error("Unprocessable entity: {0}")]
    UnprocessableEntity(String),

    /// The provider failed before any streaming began. `message` is already classified.
    #[error("Upstream error from {provider} (status {status}): {message}")]
    Upstream {
        message: String,
        status: u16,
        provider: String,
    },

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": msg }))).into_response()
            }
            AppError::UnsupportedProvider(provider) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": format!("Unsupported provider: {provider}") })),
            )
                .into_response(),
            AppError::UnprocessableEntity(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, Json(json!({ "error": msg }))).into_response()
            }
            AppError::Upstream {
                message,
                status,
                provider,
            } => {
                tracing::warn!("Upstream {provider} failed with {status}: {message}");
                (
                    StatusCode::BAD_GATEWAY,
                    Json(json!({
                        "error": message,
                        "status": status,
                        "provider": provider,
                    })),
                )
                    .into_response()
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "An internal server error occurred" })),
                )
                    .into_response()
            }
        }
    }
}
