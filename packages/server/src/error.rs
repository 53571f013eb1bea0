use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::TransitionError;
use sea_orm::{DbErr, SqlErr};
use serde::Serialize;

/// `{code, message}` body of every failed request.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    #[schema(example = "INVALID_STATE_TRANSITION")]
    pub code: &'static str,
    #[schema(example = "Registration is already confirmed and can no longer change")]
    pub message: String,
}

#[derive(Debug)]
pub enum AppError {
    Validation(String),
    TokenMissing,
    TokenInvalid,
    InvalidCredentials,
    PermissionDenied,
    NotFound(String),
    /// Duplicate registration, full workshop, or a registration changed
    /// under a concurrent review.
    Conflict(String),
    EmailTaken,
    /// Review or settlement of a registration whose status does not allow it.
    InvalidTransition(String),
    /// Logged server-side; the client only sees a generic message.
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::TokenMissing | Self::TokenInvalid | Self::InvalidCredentials => {
                StatusCode::UNAUTHORIZED
            }
            Self::PermissionDenied => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) | Self::EmailTaken | Self::InvalidTransition(_) => {
                StatusCode::CONFLICT
            }
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::TokenMissing => "TOKEN_MISSING",
            Self::TokenInvalid => "TOKEN_INVALID",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::PermissionDenied => "PERMISSION_DENIED",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Conflict(_) => "CONFLICT",
            Self::EmailTaken => "EMAIL_TAKEN",
            Self::InvalidTransition(_) => "INVALID_STATE_TRANSITION",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Map a unique-index violation to `on_duplicate`; any other database
    /// error stays internal.
    pub fn unique_or(err: DbErr, on_duplicate: AppError) -> AppError {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => on_duplicate,
            _ => AppError::from(err),
        }
    }

    fn into_body(self) -> ErrorBody {
        let code = self.code();
        let message = match self {
            Self::Validation(msg)
            | Self::NotFound(msg)
            | Self::Conflict(msg)
            | Self::InvalidTransition(msg) => msg,
            Self::TokenMissing => "Authentication required".into(),
            Self::TokenInvalid => "Invalid or expired token".into(),
            Self::InvalidCredentials => "Invalid email or password".into(),
            Self::PermissionDenied => "Insufficient permissions".into(),
            Self::EmailTaken => "An account with this email already exists".into(),
            Self::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                "An unexpected error occurred".into()
            }
        };
        ErrorBody { code, message }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(self.into_body())).into_response()
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<TransitionError> for AppError {
    fn from(err: TransitionError) -> Self {
        AppError::InvalidTransition(err.to_string())
    }
}
