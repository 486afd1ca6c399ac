use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// The submitted code does not match the live challenge (or it was
    /// already used, superseded, or expired).  The body deliberately does
    /// not say which.
    #[error("Invalid OTP")]
    InvalidOtp,

    #[error("Missing or invalid auth token")]
    Unauthorized,

    #[error("User not found")]
    UserNotFound,

    #[error("Too many OTP requests for this number")]
    TooManyRequests,

    /// Upstream SMS delivery failed.
    #[error("OTP delivery failed: {0}")]
    Delivery(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::InvalidOtp => (StatusCode::BAD_REQUEST, self.to_string()),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
            ApiError::UserNotFound => (StatusCode::NOT_FOUND, self.to_string()),
            ApiError::TooManyRequests => (StatusCode::TOO_MANY_REQUESTS, self.to_string()),
            ApiError::Delivery(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "OTP delivery failed".to_string())
            }
            ApiError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        let body = serde_json::json!({
            "error": message,
        });

        (status, axum::Json(body)).into_response()
    }
}
