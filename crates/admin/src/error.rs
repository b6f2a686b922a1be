//! Unified error handling for the back office.
//!
//! Most handlers turn storage failures into a flash message and a redirect.
//! `AppError` covers the cases that end the request instead: missing records
//! on detail pages, malformed input and unexpected storage failures.

use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;

use crate::filters;
use crate::storage::StorageError;

/// Application-level error type for the back office.
#[derive(Debug, Error)]
pub enum AppError {
    /// Storage operation failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Template rendering failed.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error page shown for 404 and 5xx responses.
#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub current_path: String,
    pub status: u16,
    pub title: String,
    pub message: String,
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Storage(StorageError::NotFound(_)) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Storage(StorageError::Request(_) | StorageError::Api { .. }) => {
                StatusCode::BAD_GATEWAY
            }
            Self::Storage(_) | Self::Template(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Log server errors with Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Back office request error"
            );
        }

        // Don't expose internal error details to clients
        let message = match &self {
            Self::NotFound(what) => format!("{what} could not be found."),
            Self::BadRequest(reason) => reason.clone(),
            Self::Storage(StorageError::NotFound(_)) => {
                "The requested item could not be found.".to_string()
            }
            Self::Storage(StorageError::Request(_) | StorageError::Api { .. }) => {
                "The storage service could not complete the request.".to_string()
            }
            _ => "Something went wrong on our side.".to_string(),
        };

        error_page(status, message)
    }
}

/// Render the error page, falling back to plain text if the template fails.
pub fn error_page(status: StatusCode, message: String) -> Response {
    let template = ErrorTemplate {
        current_path: String::new(),
        status: status.as_u16(),
        title: status
            .canonical_reason()
            .unwrap_or("Error")
            .to_string(),
        message,
    };

    match template.render() {
        Ok(html) => (status, Html(html)).into_response(),
        Err(_) => (status, template.message).into_response(),
    }
}

/// Result type for handlers.
pub type Result<T, E = AppError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("Customer C1".to_string());
        assert_eq!(err.to_string(), "Not found: Customer C1");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        fn get_status(err: AppError) -> StatusCode {
            err.into_response().status()
        }

        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Storage(StorageError::NotFound("x".to_string()))),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Storage(StorageError::Api {
                status: 503,
                message: "ServerBusy".to_string()
            })),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
