//! Account registration
//!
//! Sign-up with first/last name and takeover of placeholder accounts.
//!
//! Accounts can be created ahead of time (bulk import, invitations) with an
//! unusable password and an unverified e-mail address. When someone later
//! signs up with that e-mail, the placeholder is completed in place instead of
//! a duplicate being created, so everything already attached to it (project
//! memberships, assignments) carries over.
//!
//! # Flow
//!
//! ```text
//! validate(data)
//!   ├─> clean + check e-mail (duplicate unless a placeholder owns it)
//!   ├─> clean + check username (the placeholder itself is not a clash)
//!   └─> password1 == password2
//! save(cleaned)
//!   ├─> target = placeholder for e-mail, or a new user
//!   ├─> copy profile fields, check password policy, hash password
//!   ├─> persist, run custom_signup hook
//!   └─> new accounts only: set up the primary e-mail address
//! ```

use super::adapter::AccountAdapter;
use super::error::{AccountError, AccountResult};
use super::settings::AccountSettings;
use crate::auth::password;
use crate::models::user::User;
use crate::store::UserStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// Raw sign-up input
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignupData {
    pub username: String,
    pub email: String,
    pub password1: Option<String>,
    pub password2: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Sign-up input after validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanedRegistration {
    pub username: String,
    pub email: String,
    pub password: Option<String>,
    pub first_name: String,
    pub last_name: String,
}

/// Outcome of a successful registration
#[derive(Debug, Clone)]
pub struct Registered {
    pub user: User,

    /// True when an existing placeholder account was completed
    pub reconciled: bool,
}

/// Registration adapter
#[derive(Clone)]
pub struct Registration {
    store: Arc<dyn UserStore>,
    adapter: Arc<dyn AccountAdapter>,
    settings: Arc<AccountSettings>,
}

impl Registration {
    pub fn new(
        store: Arc<dyn UserStore>,
        adapter: Arc<dyn AccountAdapter>,
        settings: Arc<AccountSettings>,
    ) -> Self {
        Self {
            store,
            adapter,
            settings,
        }
    }

    /// Canonicalizes the e-mail and enforces uniqueness
    ///
    /// An e-mail owned by a placeholder account passes: that account will be
    /// completed rather than duplicated.
    pub async fn validate_email(&self, email: &str) -> AccountResult<String> {
        let email = self.adapter.clean_email(email);
        if email.is_empty() {
            return Err(AccountError::Required("email"));
        }

        if self.settings.unique_email
            && self.store.email_exists(&email).await?
            && self.store.dummy_user(&email).await?.is_none()
        {
            debug!(email = %email, "Rejecting sign-up with registered e-mail");
            return Err(AccountError::DuplicateEmail);
        }

        Ok(email)
    }

    /// Cleans the username and rejects it if taken by anyone but the placeholder
    /// being claimed with `email`
    pub async fn validate_username(&self, username: &str, email: &str) -> AccountResult<String> {
        let username = self.adapter.clean_username(username)?;
        let claimed = self.store.dummy_user(email).await?.map(|user| user.id);

        if self.store.username_exists(&username, claimed).await? {
            return Err(AccountError::DuplicateUsername);
        }

        Ok(username)
    }

    /// Validates every field of a sign-up request
    pub async fn validate(&self, data: SignupData) -> AccountResult<CleanedRegistration> {
        let email = self.validate_email(&data.email).await?;
        let username = self.validate_username(&data.username, &email).await?;

        let password = match (data.password1, data.password2) {
            (None, None) => None,
            (Some(first), Some(second)) if first == second => Some(first),
            _ => return Err(AccountError::PasswordMismatch),
        };

        Ok(CleanedRegistration {
            username,
            email,
            password,
            first_name: data.first_name.unwrap_or_default(),
            last_name: data.last_name.unwrap_or_default(),
        })
    }

    /// Persists the account, completing a placeholder when one owns the e-mail
    pub async fn save(&self, cleaned: CleanedRegistration) -> AccountResult<Registered> {
        let dummy = self.store.dummy_user(&cleaned.email).await?;
        let reconciled = dummy.is_some();
        let mut user = match dummy {
            Some(user) => user,
            None => self.adapter.new_user(),
        };

        self.adapter.populate_user(&mut user, &cleaned);

        if let Some(password) = &cleaned.password {
            self.adapter.clean_password(password, &user)?;
            user.set_password_hash(password::hash_password(password)?);
        }

        let user = self.store.save_user(&user).await?;
        self.adapter.custom_signup(&user).await?;

        if !reconciled {
            self.store.setup_user_email(&user).await?;
        }

        info!(
            user_id = %user.id,
            username = %user.username,
            reconciled,
            "Account registered"
        );

        Ok(Registered { user, reconciled })
    }

    /// Validates and saves in one step
    pub async fn register(&self, data: SignupData) -> AccountResult<Registered> {
        let cleaned = self.validate(data).await?;
        self.save(cleaned).await
    }
}
