//! Account behaviour settings
//!
//! Built once at startup (see the API crate's `config` module) and handed to
//! each account adapter at construction.

use crate::auth::password::PasswordPolicy;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which identifier login accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthenticationMethod {
    /// Username and password only
    Username,

    /// E-mail and password only
    Email,

    /// Either username or e-mail, plus password
    UsernameEmail,
}

impl AuthenticationMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthenticationMethod::Username => "username",
            AuthenticationMethod::Email => "email",
            AuthenticationMethod::UsernameEmail => "username_email",
        }
    }
}

impl fmt::Display for AuthenticationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuthenticationMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "username" => Ok(AuthenticationMethod::Username),
            "email" => Ok(AuthenticationMethod::Email),
            "username_email" | "either" => Ok(AuthenticationMethod::UsernameEmail),
            other => Err(format!(
                "Unknown authentication method '{}' (expected username, email or username_email)",
                other
            )),
        }
    }
}

/// Whether login requires a confirmed e-mail address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailVerification {
    None,
    Optional,
    Mandatory,
}

impl FromStr for EmailVerification {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" => Ok(EmailVerification::None),
            "optional" => Ok(EmailVerification::Optional),
            "mandatory" => Ok(EmailVerification::Mandatory),
            other => Err(format!(
                "Unknown e-mail verification mode '{}' (expected none, optional or mandatory)",
                other
            )),
        }
    }
}

/// Settings shared by the registration, login and password-reset adapters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSettings {
    pub authentication_method: AuthenticationMethod,

    /// Reject sign-ups whose e-mail already belongs to an account
    pub unique_email: bool,

    pub email_verification: EmailVerification,

    /// Host of the web UI; replaces the link domain in account e-mails
    pub ui_host: Option<String>,

    /// Port of the web UI, only used together with `ui_host`
    pub ui_port: Option<u16>,

    /// Links in e-mails use https
    pub use_https: bool,

    /// Fallback link domain when neither an override nor a request host is known
    pub site_domain: String,

    pub site_name: String,

    pub password_policy: PasswordPolicy,
}

impl Default for AccountSettings {
    fn default() -> Self {
        Self {
            authentication_method: AuthenticationMethod::UsernameEmail,
            unique_email: true,
            email_verification: EmailVerification::None,
            ui_host: None,
            ui_port: None,
            use_https: false,
            site_domain: "localhost".to_string(),
            site_name: "Labelgate".to_string(),
            password_policy: PasswordPolicy::default(),
        }
    }
}
