//! Credential validation for login
//!
//! Which identifier a client may log in with is a server setting
//! ([`AuthenticationMethod`]). A client built for a different setting gets an
//! explicit mismatch error naming the setting to check, instead of a
//! misleading "wrong credentials".

use super::error::{AccountError, AccountResult};
use super::settings::{AuthenticationMethod, AccountSettings, EmailVerification};
use crate::auth::password;
use crate::models::user::User;
use crate::store::UserStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

const EMAIL_USED_ON_USERNAME_SERVER: &str = "Attempt to authenticate with email/password. \
     But username/password are used for authentication on the server. \
     Please check your server configuration ACCOUNT_AUTHENTICATION_METHOD.";

const USERNAME_USED_ON_EMAIL_SERVER: &str = "Attempt to authenticate with username/password. \
     But email/password are used for authentication on the server. \
     Please check your server configuration ACCOUNT_AUTHENTICATION_METHOD.";

/// Login input; empty identifiers count as missing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: String,
}

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Login adapter
#[derive(Clone)]
pub struct Login {
    store: Arc<dyn UserStore>,
    settings: Arc<AccountSettings>,
}

impl Login {
    pub fn new(store: Arc<dyn UserStore>, settings: Arc<AccountSettings>) -> Self {
        Self { store, settings }
    }

    fn password_matches(user: &User, candidate: &str) -> bool {
        let Some(hash) = user.password_hash.as_deref() else {
            return false;
        };
        match password::verify_password(candidate, hash) {
            Ok(valid) => valid,
            Err(e) => {
                warn!(user_id = %user.id, error = %e, "Stored password hash is unreadable");
                false
            }
        }
    }

    async fn authenticate_by_email(&self, email: &str, password: &str) -> AccountResult<User> {
        self.store
            .filter_users_by_email(email)
            .await?
            .into_iter()
            .find(|user| Self::password_matches(user, password))
            .ok_or(AccountError::InvalidCredentials)
    }

    async fn authenticate_by_username(&self, username: &str, password: &str) -> AccountResult<User> {
        self.store
            .find_by_username(username)
            .await?
            .filter(|user| Self::password_matches(user, password))
            .ok_or(AccountError::InvalidCredentials)
    }

    /// Authenticates with e-mail and password
    pub async fn validate_email(&self, email: Option<&str>, password: &str) -> AccountResult<User> {
        match present(email) {
            Some(email) if !password.is_empty() => {
                self.authenticate_by_email(email, password).await
            }
            _ => Err(AccountError::MissingCredentials(
                "Must include \"email\" and \"password\".",
            )),
        }
    }

    /// Authenticates with username and password
    pub async fn validate_username(
        &self,
        username: Option<&str>,
        password: &str,
    ) -> AccountResult<User> {
        match present(username) {
            Some(username) if !password.is_empty() => {
                self.authenticate_by_username(username, password).await
            }
            _ => Err(AccountError::MissingCredentials(
                "Must include \"username\" and \"password\".",
            )),
        }
    }

    /// Authenticates with whichever identifier was given, e-mail first
    pub async fn validate_username_email(
        &self,
        username: Option<&str>,
        email: Option<&str>,
        password: &str,
    ) -> AccountResult<User> {
        if password.is_empty() {
            return Err(AccountError::MissingCredentials(
                "Must include either \"username\" or \"email\" and \"password\".",
            ));
        }

        if let Some(email) = present(email) {
            return self.authenticate_by_email(email, password).await;
        }
        if let Some(username) = present(username) {
            return self.authenticate_by_username(username, password).await;
        }

        Err(AccountError::MissingCredentials(
            "Must include either \"username\" or \"email\" and \"password\".",
        ))
    }

    /// Resolves the user for a login attempt under the configured method
    pub async fn auth_user(
        &self,
        username: Option<&str>,
        email: Option<&str>,
        password: &str,
    ) -> AccountResult<User> {
        let method = self.settings.authentication_method;
        let username = present(username);
        let email = present(email);

        if method == AuthenticationMethod::Username && username.is_none() && email.is_some() {
            return Err(AccountError::MethodMismatch(
                EMAIL_USED_ON_USERNAME_SERVER.to_string(),
            ));
        }
        if method == AuthenticationMethod::Email && email.is_none() && username.is_some() {
            return Err(AccountError::MethodMismatch(
                USERNAME_USED_ON_EMAIL_SERVER.to_string(),
            ));
        }

        match method {
            AuthenticationMethod::Email => self.validate_email(email, password).await,
            AuthenticationMethod::Username => self.validate_username(username, password).await,
            AuthenticationMethod::UsernameEmail => {
                if let Some(email) = email {
                    let owners = self.store.filter_users_by_email(email).await?;
                    if owners.len() != 1 {
                        debug!(owners = owners.len(), "E-mail does not identify one account");
                        return Err(AccountError::InvalidCredentials);
                    }
                }
                self.validate_username_email(username, email, password).await
            }
        }
    }

    /// Full login check: credentials, then account state
    pub async fn validate(&self, request: &LoginRequest) -> AccountResult<User> {
        let user = self
            .auth_user(
                request.username.as_deref(),
                request.email.as_deref(),
                &request.password,
            )
            .await
            .map_err(|e| {
                if matches!(e, AccountError::InvalidCredentials) {
                    warn!(
                        method = %self.settings.authentication_method,
                        "Rejected login attempt"
                    );
                }
                e
            })?;

        if !user.is_active {
            return Err(AccountError::AccountDisabled);
        }

        if self.settings.email_verification == EmailVerification::Mandatory
            && !self.store.has_verified_email(&user).await?
        {
            return Err(AccountError::EmailNotVerified);
        }

        Ok(user)
    }
}
