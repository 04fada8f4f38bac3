//! Error handling for the API server
//!
//! Handlers return `Result<T, ApiError>`; the error renders as
//! `{"error", "message", "details"}` JSON with a matching status code.
//!
//! # Status codes
//!
//! - `400 bad_request`: the client used an identifier the server does not accept
//! - `400 authentication_failed`: wrong credentials, disabled or unverified
//!   account (one `non_field_errors` detail)
//! - `409 conflict`: a concurrent write claimed the same username
//! - `422 validation_error`: per-field validation failures
//! - `500 internal_error`: logged, never exposed

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use labelgate_shared::{
    account::{error::NON_FIELD_ERRORS, AccountError},
    auth::{jwt::JwtError, password::PasswordError},
    store::StoreError,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400)
    BadRequest(String),

    /// Login rejected (400), reported under `non_field_errors`
    AuthenticationFailed(String),

    /// Conflict (409)
    Conflict(String),

    /// Unprocessable entity (422) - validation errors
    ValidationError(Vec<ValidationErrorDetail>),

    /// Internal server error (500)
    InternalError(String),
}

/// Validation error detail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    /// Field that failed validation
    pub field: String,

    /// Error message
    pub message: String,
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code (e.g., "bad_request", "validation_error")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Optional validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationErrorDetail>>,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::AuthenticationFailed(msg) => write!(f, "Authentication failed: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::ValidationError(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message, details) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg, None),
            ApiError::AuthenticationFailed(msg) => (
                StatusCode::BAD_REQUEST,
                "authentication_failed",
                msg.clone(),
                Some(vec![ValidationErrorDetail {
                    field: NON_FIELD_ERRORS.to_string(),
                    message: msg,
                }]),
            ),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg, None),
            ApiError::ValidationError(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "validation_error",
                "Request validation failed".to_string(),
                Some(errors),
            ),
            ApiError::InternalError(msg) => {
                // Log internal errors but don't expose details to clients
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
            details,
        });

        (status, body).into_response()
    }
}

/// Convert request-body validation failures to API errors
impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        let mut errors: Vec<ValidationErrorDetail> = err
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| ValidationErrorDetail {
                    field: field.to_string(),
                    message: error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "Validation failed".to_string()),
                })
            })
            .collect();
        errors.sort_by(|a, b| a.field.cmp(&b.field));
        ApiError::ValidationError(errors)
    }
}

/// Convert store errors to API errors
impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(msg) => ApiError::Conflict(msg),
            StoreError::Database(err) => ApiError::InternalError(format!("Database error: {}", err)),
        }
    }
}

/// Convert password errors to API errors
impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::InternalError(format!("Password operation failed: {}", err))
    }
}

/// Convert JWT errors to API errors
///
/// Tokens are only issued here, never checked, so a failure is ours.
impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        ApiError::InternalError(format!("Token operation failed: {}", err))
    }
}

/// Convert account errors to API errors
impl From<AccountError> for ApiError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::MethodMismatch(hint) => ApiError::BadRequest(hint),
            AccountError::InvalidCredentials
            | AccountError::MissingCredentials(_)
            | AccountError::AccountDisabled
            | AccountError::EmailNotVerified => ApiError::AuthenticationFailed(err.to_string()),
            AccountError::Store(err) => err.into(),
            AccountError::Password(err) => err.into(),
            AccountError::Token(err) => err.into(),
            AccountError::Mail(err) => ApiError::InternalError(err.to_string()),
            other => {
                let field = other.field();
                ApiError::ValidationError(
                    other
                        .messages()
                        .into_iter()
                        .map(|message| ValidationErrorDetail {
                            field: field.to_string(),
                            message,
                        })
                        .collect(),
                )
            }
        }
    }
}
