//! Authentication endpoints
//!
//! This module provides user account endpoints:
//! - Registration (completes placeholder accounts created ahead of time)
//! - Login (username, e-mail or either, per server configuration)
//! - Password reset e-mail
//!
//! # Endpoints
//!
//! - `POST /v1/auth/register` - Register new user
//! - `POST /v1/auth/login` - Login and get an access token
//! - `POST /v1/auth/password/reset` - Send a password reset e-mail

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    Json,
};
use labelgate_shared::{
    account::{LoginRequest, SignupData},
    auth::jwt,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

/// Register request
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct RegisterRequest {
    /// Username (format and uniqueness are checked by the registration adapter)
    #[validate(length(min = 1, message = "This field is required."))]
    pub username: String,

    /// Email address
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,

    /// Password
    #[validate(length(min = 1, message = "This field is required."))]
    pub password1: String,

    /// Password confirmation
    #[validate(length(min = 1, message = "This field is required."))]
    pub password2: String,

    #[validate(length(max = 150, message = "Ensure this field has no more than 150 characters."))]
    pub first_name: Option<String>,

    #[validate(length(max = 150, message = "Ensure this field has no more than 150 characters."))]
    pub last_name: Option<String>,
}

impl From<RegisterRequest> for SignupData {
    fn from(req: RegisterRequest) -> Self {
        SignupData {
            username: req.username,
            email: req.email,
            password1: Some(req.password1),
            password2: Some(req.password2),
            first_name: req.first_name,
            last_name: req.last_name,
        }
    }
}

/// Register response
#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    /// User ID
    pub user_id: String,

    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

/// Login response
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    /// User ID
    pub user_id: String,

    /// Access token (24h)
    pub access_token: String,

    /// Always "Bearer"
    pub token_type: String,

    /// Access token lifetime in seconds
    pub expires_in: i64,
}

/// Password reset request
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct PasswordResetRequest {
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,
}

/// Password reset response
#[derive(Debug, Serialize, Deserialize)]
pub struct PasswordResetResponse {
    pub detail: String,
}

/// Register a new user
///
/// When a placeholder account (unusable password, single unverified e-mail
/// record) exists for the e-mail, that account is completed instead of a new
/// one being created.
///
/// # Endpoint
///
/// ```text
/// POST /v1/auth/register
/// Content-Type: application/json
///
/// {
///   "username": "jdoe",
///   "email": "user@example.com",
///   "password1": "SecureP@ss123",
///   "password2": "SecureP@ss123",
///   "first_name": "John",
///   "last_name": "Doe"
/// }
/// ```
///
/// # Errors
///
/// - `422 Unprocessable Entity`: Validation failed (duplicate e-mail or
///   username, password policy, mismatched passwords)
/// - `409 Conflict`: Username claimed concurrently
/// - `500 Internal Server Error`: Server error
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<RegisterResponse>)> {
    req.validate()?;

    let registered = state.registration().register(req.into()).await?;
    let user = registered.user;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user_id: user.id.to_string(),
            username: user.username,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
        }),
    ))
}

/// Login endpoint
///
/// Accepts `username`, `email` or both, depending on
/// `ACCOUNT_AUTHENTICATION_METHOD`.
///
/// # Endpoint
///
/// ```text
/// POST /v1/auth/login
/// Content-Type: application/json
///
/// {
///   "email": "user@example.com",
///   "password": "SecureP@ss123"
/// }
/// ```
///
/// # Response
///
/// ```json
/// {
///   "user_id": "uuid",
///   "access_token": "eyJ...",
///   "token_type": "Bearer",
///   "expires_in": 86400
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Identifier not accepted by this server, invalid
///   credentials, disabled account or unverified e-mail
/// - `500 Internal Server Error`: Server error
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let user = state.login().validate(&req).await?;

    state.store.update_last_login(user.id).await?;

    let claims = jwt::Claims::new(user.id, jwt::TokenType::Access);
    let access_token = jwt::create_token(&claims, state.jwt_secret())?;

    info!(user_id = %user.id, "User logged in");

    Ok(Json(LoginResponse {
        user_id: user.id.to_string(),
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: jwt::TokenType::Access.default_expiration().num_seconds(),
    }))
}

/// Password reset endpoint
///
/// Always answers with the same message, whether or not an account uses the
/// e-mail. Links point at `UI_HOST[:UI_PORT]` when configured, otherwise at the
/// request's `Host`.
///
/// # Endpoint
///
/// ```text
/// POST /v1/auth/password/reset
/// Content-Type: application/json
///
/// { "email": "user@example.com" }
/// ```
pub async fn password_reset(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<PasswordResetRequest>,
) -> ApiResult<Json<PasswordResetResponse>> {
    req.validate()?;

    let host = headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok());

    state.password_reset().save(&req.email, host).await?;

    Ok(Json(PasswordResetResponse {
        detail: "Password reset e-mail has been sent.".to_string(),
    }))
}
