//! Error types for the web API.

use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use cleanstreet_core::CoreError;
use thiserror::Error;

/// Errors that can occur while handling a request.
#[derive(Debug, Error)]
pub enum WebError {
    /// Failure reported by a core operation.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// No signed-in session.
    #[error("Sign in required")]
    Unauthenticated,

    /// Signed in with a role the route does not serve.
    #[error("This area is for {0} accounts")]
    Forbidden(&'static str),

    /// Malformed request body.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Multipart body could not be read.
    #[error("Invalid upload: {0}")]
    Multipart(#[from] MultipartError),

    /// Session store failure.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),
}

impl WebError {
    /// Machine-readable kind reported in the response body.
    pub fn kind(&self) -> &'static str {
        match self {
            WebError::Core(err) => err.kind(),
            WebError::Unauthenticated => "unauthenticated",
            WebError::Forbidden(_) => "unauthorized",
            WebError::BadRequest(_) | WebError::Multipart(_) => "bad_request",
            WebError::Session(_) => "session",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            WebError::Core(err) => core_status(err),
            WebError::Unauthenticated => StatusCode::UNAUTHORIZED,
            WebError::Forbidden(_) => StatusCode::FORBIDDEN,
            WebError::BadRequest(_) | WebError::Multipart(_) => StatusCode::BAD_REQUEST,
            WebError::Session(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn core_status(err: &CoreError) -> StatusCode {
    match err {
        CoreError::NotFound { .. } | CoreError::AccountNotFound { .. } => StatusCode::NOT_FOUND,
        CoreError::Unauthorized { .. } | CoreError::RequiresExternalAuth => StatusCode::FORBIDDEN,
        CoreError::InvalidCredential => StatusCode::UNAUTHORIZED,
        CoreError::DuplicateIdentity(_)
        | CoreError::HasActiveWork { .. }
        | CoreError::InvalidTransition { .. } => StatusCode::CONFLICT,
        CoreError::MissingDescription
        | CoreError::MissingAfterEvidence
        | CoreError::InvalidEmailFormat(_)
        | CoreError::InvalidEvidence(_)
        | CoreError::InvalidInput(_) => StatusCode::UNPROCESSABLE_ENTITY,
        CoreError::VerifierUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        CoreError::Storage(_) | CoreError::Evidence(_) | CoreError::PasswordHash(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(kind = self.kind(), "Request failed: {}", self);
        }

        let body = serde_json::json!({
            "error": self.to_string(),
            "kind": self.kind(),
        });

        (status, Json(body)).into_response()
    }
}

/// Result type for handlers.
pub type Result<T> = std::result::Result<T, WebError>;
