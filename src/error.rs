use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use crate::response::ApiResponse;

/// Failures of the credential store.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("record not found")]
    NotFound,
    #[error("duplicate key")]
    Duplicate,
    #[error("store call timed out")]
    Timeout,
    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),
}

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => RepoError::NotFound,
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                RepoError::Duplicate
            }
            sqlx::Error::PoolTimedOut => RepoError::Timeout,
            other => RepoError::Database(other),
        }
    }
}

/// Why a token failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,
    #[error("bad token signature")]
    BadSignature,
    #[error("token expired")]
    Expired,
}

/// Errors returned by the auth workflow and rendered by the HTTP layer.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),
    #[error("email already registered")]
    EmailTaken,
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("user not found")]
    NotFound,
    #[error("token expired")]
    TokenExpired,
    #[error("invalid token")]
    TokenInvalid,
    #[error("internal error")]
    Internal(#[source] anyhow::Error),
}

impl AuthError {
    pub fn validation(message: impl Into<String>) -> Self {
        AuthError::Validation(message.into())
    }

    pub fn internal(err: impl Into<anyhow::Error>) -> Self {
        AuthError::Internal(err.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::Validation(_) | AuthError::EmailTaken => StatusCode::BAD_REQUEST,
            AuthError::InvalidCredentials | AuthError::TokenExpired | AuthError::TokenInvalid => {
                StatusCode::UNAUTHORIZED
            }
            AuthError::NotFound => StatusCode::NOT_FOUND,
            AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => AuthError::TokenExpired,
            TokenError::Malformed | TokenError::BadSignature => AuthError::TokenInvalid,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        if let AuthError::Internal(ref e) = self {
            error!(error = %format!("{e:#}"), "internal error");
        }
        ApiResponse::<()>::error(status, self.to_string())
    }
}
