use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),
    #[error("Listing not found")]
    NotFound,
    #[error("{0}")]
    Conflict(String),
    #[error("Internal server error: {0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Serialize)]
struct MessageBody {
    message: String,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }
}

impl From<rentals_core::Error> for AppError {
    fn from(error: rentals_core::Error) -> Self {
        use rentals_core::Error;
        match error {
            Error::Validation(message) => Self::BadRequest(message),
            Error::NotFound(_) => Self::NotFound,
            Error::Conflict(message) => Self::Conflict(message),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if let Self::Internal(detail) = &self {
            tracing::error!("Request failed: {}", detail);
        }

        let message = self.to_string();
        if matches!(self, Self::NotFound) {
            (status, Json(MessageBody { message })).into_response()
        } else {
            (status, Json(ErrorBody { error: message })).into_response()
        }
    }
}
