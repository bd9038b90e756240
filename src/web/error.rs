//! Web error type
//!
//! Handlers return `WebError`; its response carries an `ErrorPage`
//! extension that `render_error_pages` turns into the `error.html` page.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::services::ServiceError;

#[derive(Debug, Error)]
pub enum WebError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unprocessable(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

pub type WebResult<T> = Result<T, WebError>;

impl WebError {
    pub fn status(&self) -> StatusCode {
        match self {
            WebError::NotFound(_) => StatusCode::NOT_FOUND,
            WebError::Conflict(_) => StatusCode::CONFLICT,
            WebError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            WebError::BadRequest(_) => StatusCode::BAD_REQUEST,
            WebError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message shown to the user; internal details stay in the log
    pub fn public_message(&self) -> String {
        match self {
            WebError::Internal(_) => "Došlo je do neočekivane greške".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<ServiceError> for WebError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound(msg) => WebError::NotFound(msg),
            ServiceError::Conflict(msg) | ServiceError::InUse(msg) => WebError::Conflict(msg),
            e @ ServiceError::InsufficientFunds { .. } => WebError::Conflict(e.to_string()),
            ServiceError::Validation(errors) => WebError::Unprocessable(errors.to_string()),
            ServiceError::Internal(e) => WebError::Internal(e),
        }
    }
}

impl From<crate::views::ViewError> for WebError {
    fn from(err: crate::views::ViewError) -> Self {
        WebError::Internal(err.into())
    }
}

/// Marker left on error responses for the error page layer
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorPage {
    pub status: StatusCode,
    pub message: String,
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        if let WebError::Internal(e) = &self {
            tracing::error!("Request failed: {:#}", e);
        }

        let page = ErrorPage {
            status: self.status(),
            message: self.public_message(),
        };
        let mut response = (page.status, page.message.clone()).into_response();
        response.extensions_mut().insert(page);
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ValidationErrors;

    #[test]
    fn test_service_errors_map_to_status() {
        let cases = [
            (ServiceError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (ServiceError::Conflict("x".into()), StatusCode::CONFLICT),
            (ServiceError::InUse("x".into()), StatusCode::CONFLICT),
            (
                ServiceError::InsufficientFunds { balance: 0, requested: 100 },
                StatusCode::CONFLICT,
            ),
            (
                ServiceError::Validation(ValidationErrors::single("naziv", "Naziv je obavezan")),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                ServiceError::Internal(anyhow::anyhow!("disk")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(WebError::from(err).status(), status);
        }
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let err = WebError::Internal(anyhow::anyhow!("database is locked"));
        assert!(!err.public_message().contains("locked"));

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let page = response.extensions().get::<ErrorPage>().unwrap();
        assert_eq!(page.message, "Došlo je do neočekivane greške");
    }
}
