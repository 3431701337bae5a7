//! # Error Handling
//!
//! This module defines the application error type and how it turns into an
//! HTTP response.
//!
//! Handlers return [`AppResult`]. When an [`AppError`] becomes a response, it
//! carries an [`ErrorReport`] in the response extensions. The error boundary
//! (`middleware::error_boundary`) picks the report up and renders the shared
//! error view, so every failure looks the same to the client.

use axum::{
    extract::rejection::{FormRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::any::Any;
use thiserror::Error;

/// Application-wide error type
///
/// ## The `#[from]` attribute
/// This enables automatic conversion using the `?` operator. For example:
/// ```rust,ignore
/// let rows = sqlx::query_as::<_, Category>(...).fetch_all(pool).await?;
/// // The ? converts sqlx::Error to AppError::Database
/// ```
#[derive(Error, Debug)]
pub enum AppError {
    /// Database errors (SQLx library errors)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Template lookup or rendering failed
    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),

    /// The session store could not load or save session data
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Password hashing or verification failed
    #[error("Password error: {0}")]
    Password(#[from] bcrypt::BcryptError),

    /// Resource not found errors (404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request errors (400)
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Authenticated but not allowed (403)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Internal server errors (500)
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Database(_)
            | AppError::Template(_)
            | AppError::Session(_)
            | AppError::Password(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
        }
    }

    /// Message safe to show to the client.
    ///
    /// Library errors get a generic message; their detail only reaches the
    /// logs and, in development, the error page.
    pub fn public_message(&self) -> String {
        match self {
            AppError::Database(_) => "Database error".to_string(),
            AppError::Template(_) => "Rendering error".to_string(),
            AppError::Session(_) => "Session error".to_string(),
            AppError::Password(_) => "Authentication error".to_string(),
            AppError::Internal(_) => "Internal server error".to_string(),
            AppError::NotFound(_) | AppError::BadRequest(_) | AppError::Forbidden(_) => {
                self.to_string()
            }
        }
    }
}

/// Malformed form bodies are the client's fault, whatever axum's status says.
impl From<FormRejection> for AppError {
    fn from(rejection: FormRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

/// Error details attached to an error response for the error boundary.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub status: StatusCode,
    pub message: String,
    /// Full error detail; only rendered in development
    pub detail: String,
}

impl ErrorReport {
    pub fn new(status: StatusCode, message: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            detail: detail.into(),
        }
    }
}

/// Plain-text response carrying the report.
///
/// The body is only what the client sees if no error boundary is installed.
impl IntoResponse for ErrorReport {
    fn into_response(self) -> Response {
        let mut response = (self.status, self.message.clone()).into_response();
        response.extensions_mut().insert(self);
        response
    }
}

/// Convert AppError into an HTTP response
///
/// ## How it works
/// 1. Log detailed error information (for server debugging)
/// 2. Determine appropriate HTTP status code
/// 3. Attach an [`ErrorReport`] for the error boundary to render
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!(error = ?self, "request failed");
        } else {
            tracing::debug!(error = %self, "request rejected");
        }

        ErrorReport::new(status, self.public_message(), format!("{:?}", self)).into_response()
    }
}

/// Whether the error boundary should render this response.
///
/// True for responses carrying a report and for bare 4xx/5xx responses
/// produced by the framework or a layer.
pub fn is_error_response(response: &Response) -> bool {
    let status = response.status();
    response.extensions().get::<ErrorReport>().is_some()
        || status.is_client_error()
        || status.is_server_error()
}

/// Response used when a handler panics.
///
/// Installed with `tower_http::catch_panic::CatchPanicLayer::custom`, so a
/// panic becomes a 500 rendered by the error boundary instead of a dropped
/// connection.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };

    tracing::error!(panic = %detail, "handler panicked");

    ErrorReport::new(
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error",
        format!("panic: {}", detail),
    )
    .into_response()
}

/// Convenience type alias for Results using AppError
pub type AppResult<T> = Result<T, AppError>;
