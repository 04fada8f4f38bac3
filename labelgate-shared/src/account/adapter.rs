//! Overridable account behaviour
//!
//! [`AccountAdapter`] bundles the small decisions the registration and reset
//! flows delegate: how e-mails and usernames are cleaned, which password rules
//! apply, how a new user record starts out and what happens right after
//! sign-up. Every method except [`AccountAdapter::password_policy`] has a
//! default, so a host application overrides only what it needs.
//!
//! # Example
//!
//! ```
//! use async_trait::async_trait;
//! use labelgate_shared::account::{AccountAdapter, AccountResult};
//! use labelgate_shared::auth::password::PasswordPolicy;
//! use labelgate_shared::models::user::User;
//!
//! struct WelcomeAdapter {
//!     policy: PasswordPolicy,
//! }
//!
//! #[async_trait]
//! impl AccountAdapter for WelcomeAdapter {
//!     fn password_policy(&self) -> &PasswordPolicy {
//!         &self.policy
//!     }
//!
//!     async fn custom_signup(&self, user: &User) -> AccountResult<()> {
//!         println!("welcome, {}", user.username);
//!         Ok(())
//!     }
//! }
//! ```

use super::error::{AccountError, AccountResult};
use super::registration::CleanedRegistration;
use crate::auth::password::{PasswordPolicy, PasswordPolicyError};
use crate::models::user::User;
use async_trait::async_trait;

/// Longest username accepted
pub const USERNAME_MAX_LENGTH: usize = 150;

#[async_trait]
pub trait AccountAdapter: Send + Sync {
    /// Rules applied by [`AccountAdapter::clean_password`]
    fn password_policy(&self) -> &PasswordPolicy;

    /// Canonical form of an e-mail address
    fn clean_email(&self, email: &str) -> String {
        normalize_email(email)
    }

    /// Trims the username and checks its format; uniqueness is checked by the caller
    fn clean_username(&self, username: &str) -> AccountResult<String> {
        let username = username.trim();
        if username.is_empty() {
            return Err(AccountError::Required("username"));
        }
        if username.chars().count() > USERNAME_MAX_LENGTH {
            return Err(AccountError::InvalidUsername(format!(
                "Ensure this field has no more than {} characters.",
                USERNAME_MAX_LENGTH
            )));
        }
        if !username
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
        {
            return Err(AccountError::InvalidUsername(
                "Usernames can only contain letters, digits and @/./+/-/_.".to_string(),
            ));
        }
        Ok(username.to_string())
    }

    /// Checks a candidate password for the user it will belong to
    fn clean_password(&self, password: &str, user: &User) -> Result<(), PasswordPolicyError> {
        self.password_policy().validate(password, user)
    }

    /// Starting point for an account that does not exist yet
    fn new_user(&self) -> User {
        User::blank()
    }

    /// Copies the sign-up fields onto the user without saving it
    fn populate_user(&self, user: &mut User, data: &CleanedRegistration) {
        user.username = data.username.clone();
        user.email = data.email.clone();
        user.first_name = data.first_name.clone();
        user.last_name = data.last_name.clone();
    }

    /// Runs after the account is saved; does nothing by default
    async fn custom_signup(&self, _user: &User) -> AccountResult<()> {
        Ok(())
    }
}

/// Adapter with stock behaviour and a configurable password policy
#[derive(Debug, Clone, Default)]
pub struct DefaultAccountAdapter {
    policy: PasswordPolicy,
}

impl DefaultAccountAdapter {
    pub fn new(policy: PasswordPolicy) -> Self {
        Self { policy }
    }
}

#[async_trait]
impl AccountAdapter for DefaultAccountAdapter {
    fn password_policy(&self) -> &PasswordPolicy {
        &self.policy
    }
}

/// Trims the address and lowercases its domain part
///
/// The local part keeps its case; some mail servers treat it as significant.
pub fn normalize_email(email: &str) -> String {
    let email = email.trim();
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{}@{}", local, domain.to_lowercase()),
        None => email.to_string(),
    }
}
