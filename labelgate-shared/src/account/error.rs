//! Account error types

use crate::auth::{
    jwt::JwtError,
    password::{PasswordError, PasswordPolicyError},
};
use crate::mail::MailError;
use crate::store::StoreError;

/// Field name for errors that belong to the request as a whole
pub const NON_FIELD_ERRORS: &str = "non_field_errors";

/// Errors raised by registration, login and password reset
#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    /// A required field was empty
    #[error("This field is required.")]
    Required(&'static str),

    #[error("A user is already registered with this e-mail address.")]
    DuplicateEmail,

    #[error("A user with that username already exists.")]
    DuplicateUsername,

    /// Username failed the format rules
    #[error("{0}")]
    InvalidUsername(String),

    #[error("The two password fields didn't match.")]
    PasswordMismatch,

    /// Password policy violations, one entry per broken rule
    #[error("{0}")]
    PasswordPolicy(#[from] PasswordPolicyError),

    /// The client used an identifier the server is not configured to accept
    #[error("{0}")]
    MethodMismatch(String),

    /// Deliberately vague: no hint whether the account exists
    #[error("Unable to login with provided credentials")]
    InvalidCredentials,

    #[error("{0}")]
    MissingCredentials(&'static str),

    #[error("User account is disabled.")]
    AccountDisabled,

    #[error("E-mail is not verified.")]
    EmailNotVerified,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Token(#[from] JwtError),

    #[error(transparent)]
    Mail(#[from] MailError),
}

/// Result type for account operations
pub type AccountResult<T> = Result<T, AccountError>;

impl AccountError {
    /// Whether the error is the client's fault (as opposed to an internal failure)
    pub fn is_validation(&self) -> bool {
        !matches!(
            self,
            AccountError::Store(_)
                | AccountError::Password(_)
                | AccountError::Token(_)
                | AccountError::Mail(_)
        )
    }

    /// Request field the error is reported under
    pub fn field(&self) -> &'static str {
        match self {
            AccountError::Required(field) => *field,
            AccountError::DuplicateEmail => "email",
            AccountError::DuplicateUsername | AccountError::InvalidUsername(_) => "username",
            AccountError::PasswordPolicy(_) => "password1",
            _ => NON_FIELD_ERRORS,
        }
    }

    /// Client-facing messages; one per policy violation for password errors
    pub fn messages(&self) -> Vec<String> {
        match self {
            AccountError::PasswordPolicy(policy) => policy.messages(),
            other => vec![other.to_string()],
        }
    }
}
