use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use roomwatch_core::error::CoreError;
use roomwatch_detector::DetectionError;
use roomwatch_pipeline::SamplingError;
use roomwatch_registry::RegistryError;
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps the error enums of every layer and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Sampling(#[from] SamplingError),

    /// The detection capability failed on a request-driven call.
    #[error(transparent)]
    Detection(#[from] DetectionError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::NotFound { entity, id } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} with id {id} not found"),
                ),
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
                CoreError::Internal(msg) => internal(msg),
            },

            // --- Registry ---
            AppError::Registry(err) => match err {
                RegistryError::NotFound(_) | RegistryError::UnknownRoom(_) => {
                    (StatusCode::NOT_FOUND, "NOT_FOUND", err.to_string())
                }
                RegistryError::InconsistentStatus { .. }
                | RegistryError::OccupancyAboveCeiling { .. } => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", err.to_string())
                }
            },

            // --- Sampling control ---
            AppError::Sampling(err) => match err {
                SamplingError::UnknownRoom(_) => {
                    (StatusCode::NOT_FOUND, "NOT_FOUND", err.to_string())
                }
                SamplingError::ShuttingDown => {
                    (StatusCode::CONFLICT, "SHUTTING_DOWN", err.to_string())
                }
                SamplingError::TaskFailed { .. } => internal(&err.to_string()),
            },

            AppError::Detection(err) => {
                tracing::warn!(error = %err, "Detection request failed");
                (StatusCode::BAD_GATEWAY, "DETECTION_FAILED", err.to_string())
            }

            // --- HTTP-specific errors ---
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::InternalError(msg) => internal(msg),
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

fn internal(msg: &str) -> (StatusCode, &'static str, String) {
    tracing::error!(error = %msg, "Internal error");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}
