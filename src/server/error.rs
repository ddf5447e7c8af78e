use crate::core::LevelError;
use crate::error::GateError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

pub type ApiResult<T> = Result<T, ApiError>;

/// Failures reported to HTTP clients as `{"status": "error", "message": ...}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Invalid level.")]
    InvalidLevel,

    #[error("Unauthorized access. Please authenticate first.")]
    Unauthorized,

    #[error("Image too large.")]
    PayloadTooLarge,

    #[error("Error processing image: {0}")]
    Processing(#[from] GateError),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::InvalidLevel => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::FORBIDDEN,
            ApiError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Processing(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<LevelError> for ApiError {
    fn from(err: LevelError) -> Self {
        match err {
            LevelError::Unrecognized(_) => ApiError::BadRequest("Invalid level value.".into()),
            LevelError::NotANumber(_) => {
                ApiError::BadRequest("Invalid input. Level must be a number.".into())
            }
            LevelError::OutOfRange(_) => ApiError::InvalidLevel,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("{}", self);
        }

        let body = Json(json!({
            "status": "error",
            "message": self.to_string(),
        }));
        (status, body).into_response()
    }
}
