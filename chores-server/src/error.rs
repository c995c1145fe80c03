//! HTTP error mapping for the board API.
//!
//! Every error response carries a JSON body of the form
//! `{"error": {"code": "...", "message": "..."}}`.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chores::auth::AuthError;
use chores::laundry::LaundryError;
use chores::{BoardError, StoreError};
use serde::Serialize;

/// Error returned by API handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request was malformed or broke a rule.
    #[error("{0}")]
    BadRequest(String),
    /// No valid session or wrong credentials.
    #[error("{0}")]
    Unauthorized(String),
    /// Authenticated but not allowed.
    #[error("{0}")]
    Forbidden(String),
    /// The target does not exist.
    #[error("{0}")]
    NotFound(String),
    /// The target is held by someone else.
    #[error("{0}")]
    Conflict(String),
    /// The server failed to complete the request.
    #[error("{0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    code: &'static str,
    message: &'a str,
}

#[derive(Debug, Serialize)]
struct ErrorEnvelope<'a> {
    error: ErrorBody<'a>,
}

impl ApiError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code for this error.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "invalid_argument",
            Self::Unauthorized(_) => "unauthorized",
            Self::Forbidden(_) => "forbidden",
            Self::NotFound(_) => "not_found",
            Self::Conflict(_) => "conflict",
            Self::Internal(_) => "internal",
        }
    }

    fn message(&self) -> &str {
        match self {
            Self::BadRequest(m)
            | Self::Unauthorized(m)
            | Self::Forbidden(m)
            | Self::NotFound(m)
            | Self::Conflict(m)
            | Self::Internal(m) => m,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorEnvelope {
            error: ErrorBody {
                code: self.code(),
                message: self.message(),
            },
        };
        (status, Json(body)).into_response()
    }
}

impl From<BoardError> for ApiError {
    fn from(err: BoardError) -> Self {
        let message = err.to_string();
        match err {
            BoardError::Store(StoreError::NotFound(_)) => Self::NotFound(message),
            BoardError::Store(StoreError::Unauthorized { .. }) => Self::Forbidden(message),
            BoardError::Store(_) => {
                tracing::error!(error = %message, "task store failure");
                Self::Internal(message)
            }
            BoardError::Laundry(laundry) => laundry.into(),
            BoardError::Auth(auth) => auth.into(),
            BoardError::Persistence(_) => {
                tracing::error!(error = %message, "board could not be saved");
                Self::Internal("failed to save the board".to_string())
            }
        }
    }
}

impl From<LaundryError> for ApiError {
    fn from(err: LaundryError) -> Self {
        let message = err.to_string();
        match err {
            LaundryError::SlotTaken { .. } => Self::Conflict(message),
            LaundryError::NotFound { .. } => Self::NotFound(message),
            LaundryError::NotOwner(_) => Self::Forbidden(message),
            LaundryError::InPast(_)
            | LaundryError::TooFarAhead(_)
            | LaundryError::WeeklyLimit
            | LaundryError::SameSlotLimit(_) => Self::BadRequest(message),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        let message = err.to_string();
        match err {
            AuthError::InvalidCredentials | AuthError::WrongPassword => {
                Self::Unauthorized(message)
            }
            AuthError::UnknownUser(_) => Self::NotFound(message),
            AuthError::PasswordTooShort => Self::BadRequest(message),
        }
    }
}
