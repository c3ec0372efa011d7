// =============================================================================
// ERROR MODULE
// =============================================================================
// Custom error types and their HTTP responses.
//
// Only the service layer can fail: the upstream storage API and the xlsx
// writer. Redis failures never reach a request; the cache degrades instead.
// The item pipeline itself (normalize, filter, grid, stats) has no error
// paths and never shows up here.
// =============================================================================

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

#[derive(Debug, Error)]
pub enum AppError {
    // -------------------------------------------------------------------------
    // UPSTREAM ERRORS
    // -------------------------------------------------------------------------
    /// Storage API answered with a non-success status
    #[error("Storage API error {status}: {message}")]
    Upstream { status: u16, message: String },

    /// Storage API could not be reached (connect, timeout, bad body)
    #[error("Storage API unreachable: {0}")]
    Network(#[from] reqwest::Error),

    // -------------------------------------------------------------------------
    // EXPORT ERRORS
    // -------------------------------------------------------------------------
    /// Workbook rendering failed
    #[error("Export error: {0}")]
    Export(#[from] rust_xlsxwriter::XlsxError),

    // -------------------------------------------------------------------------
    // REQUEST ERRORS
    // -------------------------------------------------------------------------
    /// Invalid request data
    #[error("Invalid request: {0}")]
    BadRequest(String),

    // -------------------------------------------------------------------------
    // INTERNAL ERRORS
    // -------------------------------------------------------------------------
    #[error("Internal error: {0}")]
    Internal(String),
}

// =============================================================================
// HTTP RESPONSE CONVERSION
// =============================================================================
// Upstream failures surface as 502 so the dashboard can tell "the storage API
// is down" apart from a bug in this service.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AppError::Upstream { status, message } => (
                StatusCode::BAD_GATEWAY,
                ErrorResponse::with_details(
                    "UPSTREAM_ERROR",
                    format!("Ошибка сервера: {}", message),
                    format!("storage API status {}", status),
                ),
            ),

            AppError::Network(_) => (
                StatusCode::BAD_GATEWAY,
                ErrorResponse::new(
                    "NETWORK_ERROR",
                    "Ошибка сети. Проверьте подключение к интернету",
                ),
            ),

            AppError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::new("BAD_REQUEST", msg.clone()),
            ),

            AppError::Export(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse::new("EXPORT_ERROR", "Не удалось экспортировать данные"),
            ),

            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse::new("INTERNAL_ERROR", msg.clone()),
            ),
        };

        tracing::error!(
            error_code = %body.error,
            error = %self,
            "Request failed"
        );

        (status, Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let upstream = AppError::Upstream {
            status: 500,
            message: "boom".to_string(),
        };
        assert_eq!(upstream.into_response().status(), StatusCode::BAD_GATEWAY);

        let bad = AppError::BadRequest("page".to_string());
        assert_eq!(bad.into_response().status(), StatusCode::BAD_REQUEST);

        let internal: AppError = anyhow::anyhow!("oops").into();
        assert_eq!(internal.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_upstream_message() {
        let err = AppError::Upstream {
            status: 503,
            message: "maintenance".to_string(),
        };
        assert_eq!(err.to_string(), "Storage API error 503: maintenance");
    }
}
