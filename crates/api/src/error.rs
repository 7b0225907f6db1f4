use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use paranoia_core::error::CoreError;
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] and maps each variant to a status and error code.
/// Implements [`IntoResponse`] to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `paranoia_core`.
    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// HTTP status, stable error code and client-facing message.
    fn classify(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Core(core) => match core {
                CoreError::InvalidUpdate(_) => {
                    (StatusCode::BAD_REQUEST, "INVALID_UPDATE", core.to_string())
                }
                CoreError::InvalidInput(_)
                | CoreError::InvalidEntity(_)
                | CoreError::InvalidSource(_) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", core.to_string())
                }
                CoreError::EntityNotFound { .. } => {
                    (StatusCode::NOT_FOUND, "ENTITY_NOT_FOUND", core.to_string())
                }
                CoreError::NoEntities => (StatusCode::NOT_FOUND, "NO_ENTITIES", core.to_string()),
                CoreError::ConcurrentModification { .. } => {
                    tracing::warn!(error = %core, "Update abandoned after repeated conflicts");
                    (StatusCode::CONFLICT, "CONCURRENT_MODIFICATION", core.to_string())
                }
                CoreError::StoreUnavailable(msg) => {
                    tracing::error!(error = %msg, "Entity store unavailable");
                    (
                        StatusCode::SERVICE_UNAVAILABLE,
                        "STORE_UNAVAILABLE",
                        "The entity store is unavailable".to_string(),
                    )
                }
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.classify();

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}
