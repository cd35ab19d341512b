//! Request failures and their HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::{error, warn};

use crate::storage::StorageError;

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    MethodNotAllowed,
    NotFound(String),
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            ApiError::BadRequest(msg) | ApiError::NotFound(msg) => {
                warn!(status = status.as_u16(), message = %msg, "request rejected");
                (status, msg).into_response()
            }
            ApiError::MethodNotAllowed => (status, "Method Not Allowed").into_response(),
            ApiError::Internal(msg) => {
                error!(message = %msg, "request failed");
                (status, "Internal Server Error").into_response()
            }
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(error: StorageError) -> Self {
        match error {
            StorageError::InvalidName => ApiError::BadRequest("invalid file name".into()),
            StorageError::NotFound => ApiError::NotFound("File Not Found".into()),
            StorageError::Interrupted(_) | StorageError::Io(_) => {
                ApiError::Internal(error.to_string())
            }
        }
    }
}
