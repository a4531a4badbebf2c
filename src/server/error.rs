use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use crate::Error;

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Error returned by handlers; carries the status it maps to
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

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

/// HTTP status for a library error
pub fn status_for(err: &Error) -> StatusCode {
    match err {
        Error::InvalidName(_) => StatusCode::BAD_REQUEST,
        Error::NameNotFound(_) => StatusCode::UNPROCESSABLE_ENTITY,
        Error::Credential(_) | Error::Pool(_) => StatusCode::SERVICE_UNAVAILABLE,
        Error::Storage(_)
        | Error::Io(_)
        | Error::Serialization(_)
        | Error::InvalidNamespace(_)
        | Error::Render(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self::new(status_for(&err), err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, error = %self.message, "request failed");
        } else {
            tracing::warn!(status = %self.status, error = %self.message, "request rejected");
        }
        (self.status, Json(ErrorResponse { error: self.message })).into_response()
    }
}
