//! Password hashing and password policy
//!
//! Hashing uses Argon2id (64 MB memory, 3 passes, 4 lanes, 32-byte output).
//! The policy collects *every* rule a candidate password breaks, so clients
//! can show all problems at once.
//!
//! # Example
//!
//! ```
//! use labelgate_shared::auth::password::{hash_password, verify_password, PasswordPolicy};
//! use labelgate_shared::models::user::User;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let hash = hash_password("correct horse battery")?;
//! assert!(verify_password("correct horse battery", &hash)?);
//!
//! let policy = PasswordPolicy::default();
//! let err = policy.validate("1234", &User::blank()).unwrap_err();
//! assert_eq!(err.violations.len(), 2);
//! # Ok(())
//! # }
//! ```

use crate::models::user::User;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, ParamsBuilder, Version,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Error type for password hashing operations
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    /// Failed to hash password
    #[error("Failed to hash password: {0}")]
    HashError(String),

    /// Failed to verify password
    #[error("Failed to verify password: {0}")]
    VerifyError(String),

    /// Invalid password hash format
    #[error("Invalid password hash format: {0}")]
    InvalidHash(String),
}

/// Hashes a password with Argon2id and a random 16-byte salt
///
/// Returns a PHC string (`$argon2id$v=19$m=65536,t=3,p=4$...`).
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    let params = ParamsBuilder::new()
        .m_cost(65536)
        .t_cost(3)
        .p_cost(4)
        .output_len(32)
        .build()
        .map_err(|e| PasswordError::HashError(format!("Invalid parameters: {}", e)))?;

    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, params);

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::HashError(format!("Hash generation failed: {}", e)))?;

    Ok(password_hash.to_string())
}

/// Verifies a password against a PHC hash in constant time
///
/// `Ok(false)` means the password is wrong; `Err` means the hash is unusable.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| PasswordError::InvalidHash(format!("Failed to parse hash: {}", e)))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(_) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::VerifyError(format!("Verification failed: {}", e))),
    }
}

/// One broken password rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordViolation {
    /// Stable machine-readable code, e.g. `password_too_short`
    pub code: String,

    /// Human-readable explanation
    pub message: String,
}

impl PasswordViolation {
    fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

/// Every rule a rejected password broke
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordPolicyError {
    pub violations: Vec<PasswordViolation>,
}

impl PasswordPolicyError {
    pub fn messages(&self) -> Vec<String> {
        self.violations.iter().map(|v| v.message.clone()).collect()
    }

    pub fn has_code(&self, code: &str) -> bool {
        self.violations.iter().any(|v| v.code == code)
    }
}

impl fmt::Display for PasswordPolicyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.messages().join(" "))
    }
}

impl std::error::Error for PasswordPolicyError {}

/// Password rules applied at registration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordPolicy {
    /// Minimum number of characters
    pub min_length: usize,

    /// Require upper, lower, digit and special characters
    pub require_character_classes: bool,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: 8,
            require_character_classes: false,
        }
    }
}

/// Attributes shorter than this are not checked for similarity
const MIN_SIMILAR_ATTRIBUTE_LEN: usize = 3;

impl PasswordPolicy {
    pub fn with_min_length(min_length: usize) -> Self {
        Self {
            min_length,
            ..Self::default()
        }
    }

    /// Checks `password` for `user`, returning every violation found
    pub fn validate(&self, password: &str, user: &User) -> Result<(), PasswordPolicyError> {
        let mut violations = Vec::new();

        if password.chars().count() < self.min_length {
            violations.push(PasswordViolation::new(
                "password_too_short",
                format!(
                    "This password is too short. It must contain at least {} characters.",
                    self.min_length
                ),
            ));
        }

        if !password.is_empty() && password.chars().all(|c| c.is_ascii_digit()) {
            violations.push(PasswordViolation::new(
                "password_entirely_numeric",
                "This password is entirely numeric.",
            ));
        }

        if let Some(attribute) = similar_attribute(password, user) {
            violations.push(PasswordViolation::new(
                "password_too_similar",
                format!("The password is too similar to the {}.", attribute),
            ));
        }

        if self.require_character_classes {
            let missing = missing_character_classes(password);
            if !missing.is_empty() {
                violations.push(PasswordViolation::new(
                    "password_missing_character_class",
                    format!("The password must contain at least one {}.", missing.join(", ")),
                ));
            }
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(PasswordPolicyError { violations })
        }
    }
}

fn similar_attribute(password: &str, user: &User) -> Option<&'static str> {
    let password = password.to_lowercase();
    let local_part = user.email.split('@').next().unwrap_or_default();

    [
        ("username", user.username.as_str()),
        ("email address", local_part),
        ("first name", user.first_name.as_str()),
        ("last name", user.last_name.as_str()),
    ]
    .into_iter()
    .find(|(_, value)| {
        let value = value.trim().to_lowercase();
        value.chars().count() >= MIN_SIMILAR_ATTRIBUTE_LEN && password.contains(&value)
    })
    .map(|(name, _)| name)
}

fn missing_character_classes(password: &str) -> Vec<&'static str> {
    let mut missing = Vec::new();
    if !password.chars().any(|c| c.is_uppercase()) {
        missing.push("uppercase letter");
    }
    if !password.chars().any(|c| c.is_lowercase()) {
        missing.push("lowercase letter");
    }
    if !password.chars().any(|c| c.is_numeric()) {
        missing.push("digit");
    }
    if !password.chars().any(|c| !c.is_alphanumeric()) {
        missing.push("special character");
    }
    missing
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        let mut user = User::blank();
        user.username = "jdoe".to_string();
        user.email = "john.doe@example.com".to_string();
        user.first_name = "John".to_string();
        user.last_name = "Doe".to_string();
        user
    }

    #[test]
    fn test_hash_password() {
        let hash = hash_password("test_password_123").expect("Hash should succeed");

        assert!(hash.starts_with("$argon2id$"));
        assert!(hash.contains("v=19"));
        assert!(hash.contains("m=65536"));
        assert!(hash.contains("t=3"));
        assert!(hash.contains("p=4"));
    }

    #[test]
    fn test_verify_password() {
        let hash = hash_password("correct_password").expect("Hash should succeed");

        assert!(verify_password("correct_password", &hash).unwrap());
        assert!(!verify_password("wrong_password", &hash).unwrap());
        assert!(!verify_password("", &hash).unwrap());
    }

    #[test]
    fn test_verify_password_invalid_hash() {
        assert!(verify_password("password", "invalid_hash").is_err());
        assert!(verify_password("password", "$argon2id$invalid").is_err());
    }

    #[test]
    fn test_policy_accepts_reasonable_password() {
        let policy = PasswordPolicy::default();
        assert!(policy.validate("purple-tractor-42", &user()).is_ok());
    }

    #[test]
    fn test_policy_too_short() {
        let err = PasswordPolicy::default()
            .validate("x7!b", &user())
            .unwrap_err();
        assert!(err.has_code("password_too_short"));
        assert!(err.messages()[0].contains("at least 8 characters"));
    }

    #[test]
    fn test_policy_collects_all_violations() {
        let err = PasswordPolicy::default().validate("123", &user()).unwrap_err();
        assert!(err.has_code("password_too_short"));
        assert!(err.has_code("password_entirely_numeric"));
        assert_eq!(err.violations.len(), 2);
    }

    #[test]
    fn test_policy_rejects_similar_to_user() {
        let policy = PasswordPolicy::default();

        let err = policy.validate("JDoe-rocks-2024", &user()).unwrap_err();
        assert!(err.has_code("password_too_similar"));
        assert!(err.to_string().contains("username"));

        let err = policy.validate("my-john.doe-pass", &user()).unwrap_err();
        assert!(err.has_code("password_too_similar"));
    }

    #[test]
    fn test_policy_ignores_short_attributes() {
        let mut short = user();
        short.username = "jd".to_string();
        short.first_name = "Al".to_string();
        short.last_name = String::new();
        short.email = "jd@example.com".to_string();

        assert!(PasswordPolicy::default().validate("jd-al-tractor", &short).is_ok());
    }

    #[test]
    fn test_policy_character_classes() {
        let policy = PasswordPolicy {
            require_character_classes: true,
            ..PasswordPolicy::default()
        };

        assert!(policy.validate("Str0ng!Pass", &user()).is_ok());

        let err = policy.validate("lowercase1!", &user()).unwrap_err();
        assert!(err.has_code("password_missing_character_class"));
        assert!(err.to_string().contains("uppercase letter"));
    }

    #[test]
    fn test_with_min_length() {
        let policy = PasswordPolicy::with_min_length(12);
        assert!(policy.validate("tractor-blue", &user()).is_ok());
        assert!(policy.validate("tractor-bl", &user()).is_err());
    }
}
