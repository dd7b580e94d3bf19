use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::error;

use crate::application::error::AppError;

use super::models::{Envelope, Meta, RESULT_FAIL};

pub mod codes {
    pub const BAD_REQUEST: &str = "BAD_REQUEST";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const CONFLICT: &str = "CONFLICT";
    pub const SERVICE_UNAVAILABLE: &str = "SERVICE_UNAVAILABLE";
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    error_code: &'static str,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, error_code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            error_code,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, codes::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, codes::NOT_FOUND, message)
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        match &err {
            AppError::InvalidArgument(_) => Self::bad_request(err.to_string()),
            AppError::NotFound(_) => Self::not_found(err.to_string()),
            AppError::Conflict(_) => {
                Self::new(StatusCode::CONFLICT, codes::CONFLICT, err.to_string())
            }
            AppError::Unavailable { dependency } => {
                error!(dependency, "request failed on exhausted downstream");
                Self::new(
                    StatusCode::SERVICE_UNAVAILABLE,
                    codes::SERVICE_UNAVAILABLE,
                    "service temporarily unavailable",
                )
            }
            AppError::Internal(detail) => {
                error!(detail, "internal error");
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    codes::INTERNAL_ERROR,
                    "internal server error",
                )
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Envelope::<()> {
            meta: Meta {
                result: RESULT_FAIL.to_string(),
                error_code: Some(self.error_code.to_string()),
                message: Some(self.message),
            },
            data: None,
        };
        (self.status, Json(body)).into_response()
    }
}
