//! Password-reset token generation
//!
//! Reset links carry a token bound to the account's current state: the
//! fingerprint covers the password hash and last login time, so a token
//! stops working as soon as the password changes or the user logs in.

use super::jwt::{self, Claims, JwtError, TokenType};
use crate::models::user::User;
use sha2::{Digest, Sha256};

/// Makes and checks single-purpose tokens for password reset links
pub trait TokenGenerator: Send + Sync {
    fn make_token(&self, user: &User) -> Result<String, JwtError>;

    fn check_token(&self, user: &User, token: &str) -> bool;
}

/// Signs reset tokens as JWTs
#[derive(Clone)]
pub struct JwtTokenGenerator {
    secret: String,
}

impl JwtTokenGenerator {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }
}

/// Hex SHA-256 over the state a reset must invalidate
pub fn account_fingerprint(user: &User) -> String {
    let mut hasher = Sha256::new();
    hasher.update(user.id.as_bytes());
    hasher.update(user.password_hash.as_deref().unwrap_or_default().as_bytes());
    if let Some(last_login) = user.last_login {
        hasher.update(last_login.timestamp().to_be_bytes());
    }
    hex::encode(hasher.finalize())
}

impl TokenGenerator for JwtTokenGenerator {
    fn make_token(&self, user: &User) -> Result<String, JwtError> {
        let claims =
            Claims::new(user.id, TokenType::PasswordReset).with_fingerprint(account_fingerprint(user));
        jwt::create_token(&claims, &self.secret)
    }

    fn check_token(&self, user: &User, token: &str) -> bool {
        match jwt::validate_token_of_type(token, &self.secret, TokenType::PasswordReset) {
            Ok(claims) => {
                claims.sub == user.id
                    && claims.fp.as_deref() == Some(account_fingerprint(user).as_str())
            }
            Err(_) => false,
        }
    }
}
