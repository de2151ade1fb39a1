use crate::utils::error::SitePulseError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

pub const DATABASE_UNAVAILABLE: &str = "Database service not available.";
pub const INVALID_BODY: &str = "Invalid JSON body.";
pub const MONITOR_NOT_FOUND: &str = "Monitor not found.";

/// Every error leaves the API as `{"error": "..."}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn unavailable() -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, DATABASE_UNAVAILABLE)
    }

    pub fn invalid_body(reason: impl std::fmt::Display) -> Self {
        tracing::debug!("Rejected request body: {}", reason);
        Self::new(StatusCode::BAD_REQUEST, INVALID_BODY)
    }

    /// 驗證類錯誤原樣回傳，其餘錯誤記錄後以 `fallback` 訊息回應 500
    pub fn from_error(err: SitePulseError, fallback: &str) -> Self {
        match err {
            SitePulseError::ValidationError { message } => {
                Self::new(StatusCode::BAD_REQUEST, message)
            }
            SitePulseError::NotFound { .. } => Self::new(StatusCode::NOT_FOUND, MONITOR_NOT_FOUND),
            SitePulseError::StoreUnavailable => Self::unavailable(),
            other => {
                tracing::error!(
                    "{} {} (Category: {:?}, Severity: {:?})",
                    fallback,
                    other,
                    other.category(),
                    other.severity()
                );
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, fallback)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}
