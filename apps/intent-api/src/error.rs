//! Error types for the Intent API.
//!
//! ```text
//! ┌───────────────────────────────┬────────┬──────────────────────────────┐
//! │ Failure                       │ Status │ Body                         │
//! ├───────────────────────────────┼────────┼──────────────────────────────┤
//! │ AuthError::MissingCredential  │  401   │ success:false, UNAUTHORIZED  │
//! │ AuthError::InvalidCredential  │  401   │ success:false, UNAUTHORIZED  │
//! │ AuthError::UserMismatch       │  403   │ success:false, FORBIDDEN     │
//! │ AuthError::NotMember          │  403   │ success:false, FORBIDDEN     │
//! │ AuthError::Forbidden          │  403   │ success:false, FORBIDDEN     │
//! │ AuthError::Store              │  500   │ success:false, store code    │
//! │ ApiError::BadRequest          │  400   │ success:false, BAD_REQUEST   │
//! │ ApiError::Internal            │  500   │ success:false, INTERNAL      │
//! └───────────────────────────────┴────────┴──────────────────────────────┘
//! ```
//!
//! Handler-level failures (insufficient stock, validation) are not errors
//! at this layer; they travel as `success:false` with status 200.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use tally_core::Intent;
use tally_db::StoreError;

use crate::response::ExecuteResponse;

/// Credential and authorization failures.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Missing bearer credential")]
    MissingCredential,

    #[error("Invalid credential: {0}")]
    InvalidCredential(String),

    #[error("Token subject does not match context.user_id")]
    UserMismatch,

    #[error("You are not a member of this business")]
    NotMember,

    #[error("Your role ({role}) is not allowed to {intent}")]
    Forbidden { role: String, intent: Intent },

    #[error("Could not verify membership: {0}")]
    Store(#[from] StoreError),
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::MissingCredential | AuthError::InvalidCredential(_) => StatusCode::UNAUTHORIZED,
            AuthError::UserMismatch | AuthError::NotMember | AuthError::Forbidden { .. } => StatusCode::FORBIDDEN,
            AuthError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &str {
        match self {
            AuthError::MissingCredential | AuthError::InvalidCredential(_) => "UNAUTHORIZED",
            AuthError::UserMismatch | AuthError::NotMember | AuthError::Forbidden { .. } => "FORBIDDEN",
            AuthError::Store(e) => e.code(),
        }
    }
}

/// Errors that end a request before or outside the router.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Auth(e) => e.status(),
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &str {
        match self {
            ApiError::Auth(e) => e.code(),
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Internal(_) => "INTERNAL",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ExecuteResponse::failure(self.to_string(), self.code());
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forbidden_names_intent() {
        let err = AuthError::Forbidden {
            role: "cashier".to_string(),
            intent: Intent::RecordExpense,
        };
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
        assert_eq!(err.to_string(), "Your role (cashier) is not allowed to record_expense");
    }

    #[test]
    fn test_store_failure_is_500() {
        let err = ApiError::from(AuthError::Store(StoreError::Connection("refused".into())));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.code(), "CONNECTION");
    }
}
