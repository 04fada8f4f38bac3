//! Configuration management for the API server
//!
//! This module loads configuration from environment variables and provides
//! a type-safe configuration struct.
//!
//! # Environment Variables
//!
//! - `API_HOST`: Host to bind to (default: 0.0.0.0)
//! - `API_PORT`: Port to bind to (default: 8080)
//! - `CORS_ORIGINS`: Comma-separated allowed origins, `*` for any (default: *)
//! - `DATABASE_URL`: PostgreSQL connection string (required)
//! - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
//! - `JWT_SECRET`: Secret key for token signing, at least 32 characters (required)
//! - `ACCOUNT_AUTHENTICATION_METHOD`: `username`, `email` or `username_email`
//!   (default: username_email)
//! - `ACCOUNT_UNIQUE_EMAIL`: Reject sign-ups with a registered e-mail (default: true)
//! - `ACCOUNT_EMAIL_VERIFICATION`: `none`, `optional` or `mandatory` (default: none)
//! - `UI_HOST` / `UI_PORT`: Web UI address used in reset links (default: unset)
//! - `UI_USE_HTTPS`: Reset links use https (default: false)
//! - `SITE_DOMAIN` / `SITE_NAME`: Fallback link domain and site name
//! - `PASSWORD_MIN_LENGTH`: Minimum password length (default: 8)
//! - `RUST_LOG`: Log filter (default: labelgate_api=debug,tower_http=debug)
//!
//! # Example
//!
//! ```no_run
//! use labelgate_api::config::Config;
//!
//! # fn example() -> anyhow::Result<()> {
//! let config = Config::from_env()?;
//! println!("Server will listen on {}", config.bind_address());
//! # Ok(())
//! # }
//! ```

use labelgate_shared::account::{AccountSettings, AuthenticationMethod, EmailVerification};
use labelgate_shared::auth::password::PasswordPolicy;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// JWT configuration
    pub jwt: JwtConfig,

    /// Registration, login and password-reset behaviour
    pub account: AccountConfig,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Allowed CORS origins (`*` allows any)
    pub cors_origins: Vec<String>,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,
}

/// JWT configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Secret key for signing access and password-reset tokens
    ///
    /// IMPORTANT: This must be kept secret and should be at least 32 bytes.
    /// Generate with: `openssl rand -hex 32`
    pub secret: String,
}

/// Account configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountConfig {
    pub authentication_method: AuthenticationMethod,
    pub unique_email: bool,
    pub email_verification: EmailVerification,
    pub ui_host: Option<String>,
    pub ui_port: Option<u16>,
    pub use_https: bool,
    pub site_domain: String,
    pub site_name: String,
    pub password_min_length: usize,
}

impl Default for AccountConfig {
    fn default() -> Self {
        let settings = AccountSettings::default();
        Self {
            authentication_method: settings.authentication_method,
            unique_email: settings.unique_email,
            email_verification: settings.email_verification,
            ui_host: settings.ui_host,
            ui_port: settings.ui_port,
            use_https: settings.use_https,
            site_domain: settings.site_domain,
            site_name: settings.site_name,
            password_min_length: settings.password_policy.min_length,
        }
    }
}

impl AccountConfig {
    /// Settings handed to the account adapters
    pub fn settings(&self) -> AccountSettings {
        AccountSettings {
            authentication_method: self.authentication_method,
            unique_email: self.unique_email,
            email_verification: self.email_verification,
            ui_host: self.ui_host.clone(),
            ui_port: self.ui_port,
            use_https: self.use_https,
            site_domain: self.site_domain.clone(),
            site_name: self.site_name.clone(),
            password_policy: PasswordPolicy::with_min_length(self.password_min_length),
        }
    }
}

/// Parses a boolean flag (`true/false`, `1/0`, `yes/no`, `on/off`)
fn parse_bool(name: &str, value: &str) -> anyhow::Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => anyhow::bail!("{} must be a boolean, got '{}'", name, other),
    }
}

/// Splits a comma-separated list, dropping empty entries
fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Treats blank values as unset
fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parse_value<T>(name: &str, value: &str) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|e| anyhow::anyhow!("Invalid {}: {}", name, e))
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Required environment variables are missing
    /// - Environment variables have invalid values
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from any variable source
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| non_empty(lookup(name));

        let api_host = var("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let api_port = match var("API_PORT") {
            Some(port) => parse_value::<u16>("API_PORT", &port)?,
            None => 8080,
        };
        let cors_origins = var("CORS_ORIGINS")
            .map(|origins| parse_list(&origins))
            .unwrap_or_else(|| vec!["*".to_string()]);

        let database_url = var("DATABASE_URL")
            .ok_or_else(|| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let max_connections = match var("DATABASE_MAX_CONNECTIONS") {
            Some(value) => parse_value::<u32>("DATABASE_MAX_CONNECTIONS", &value)?,
            None => 10,
        };

        let jwt_secret = var("JWT_SECRET")
            .ok_or_else(|| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;

        if jwt_secret.len() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 characters long");
        }

        let defaults = AccountConfig::default();
        let account = AccountConfig {
            authentication_method: match var("ACCOUNT_AUTHENTICATION_METHOD") {
                Some(value) => parse_value("ACCOUNT_AUTHENTICATION_METHOD", &value)?,
                None => defaults.authentication_method,
            },
            unique_email: match var("ACCOUNT_UNIQUE_EMAIL") {
                Some(value) => parse_bool("ACCOUNT_UNIQUE_EMAIL", &value)?,
                None => defaults.unique_email,
            },
            email_verification: match var("ACCOUNT_EMAIL_VERIFICATION") {
                Some(value) => parse_value("ACCOUNT_EMAIL_VERIFICATION", &value)?,
                None => defaults.email_verification,
            },
            ui_host: var("UI_HOST"),
            ui_port: var("UI_PORT")
                .map(|port| parse_value::<u16>("UI_PORT", &port))
                .transpose()?,
            use_https: match var("UI_USE_HTTPS") {
                Some(value) => parse_bool("UI_USE_HTTPS", &value)?,
                None => defaults.use_https,
            },
            site_domain: var("SITE_DOMAIN").unwrap_or(defaults.site_domain),
            site_name: var("SITE_NAME").unwrap_or(defaults.site_name),
            password_min_length: match var("PASSWORD_MIN_LENGTH") {
                Some(value) => parse_value::<usize>("PASSWORD_MIN_LENGTH", &value)?,
                None => defaults.password_min_length,
            },
        };

        Ok(Self {
            api: ApiConfig {
                host: api_host,
                port: api_port,
                cors_origins,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections,
            },
            jwt: JwtConfig {
                secret: jwt_secret,
            },
            account,
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    fn load(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    fn required() -> Vec<(&'static str, &'static str)> {
        vec![
            ("DATABASE_URL", "postgresql://localhost/test"),
            ("JWT_SECRET", SECRET),
        ]
    }

    #[test]
    fn test_defaults() {
        let config = load(&required()).unwrap();

        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.api.cors_origins, vec!["*"]);
        assert_eq!(config.database.max_connections, 10);
        assert_eq!(
            config.account.authentication_method,
            AuthenticationMethod::UsernameEmail
        );
        assert!(config.account.unique_email);
        assert!(config.account.ui_host.is_none());
        assert!(config.account.ui_port.is_none());
        assert_eq!(config.account.password_min_length, 8);
    }

    #[test]
    fn test_missing_required_variables() {
        let err = load(&[("JWT_SECRET", SECRET)]).unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));

        let err = load(&[("DATABASE_URL", "postgresql://localhost/test")]).unwrap_err();
        assert!(err.to_string().contains("JWT_SECRET"));
    }

    #[test]
    fn test_short_jwt_secret_rejected() {
        let err = load(&[
            ("DATABASE_URL", "postgresql://localhost/test"),
            ("JWT_SECRET", "too-short"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("at least 32 characters"));
    }

    #[test]
    fn test_account_section() {
        let mut vars = required();
        vars.extend([
            ("ACCOUNT_AUTHENTICATION_METHOD", "email"),
            ("ACCOUNT_UNIQUE_EMAIL", "false"),
            ("ACCOUNT_EMAIL_VERIFICATION", "mandatory"),
            ("UI_HOST", "example.com"),
            ("UI_PORT", "8080"),
            ("UI_USE_HTTPS", "yes"),
            ("PASSWORD_MIN_LENGTH", "12"),
        ]);
        let settings = load(&vars).unwrap().account.settings();

        assert_eq!(settings.authentication_method, AuthenticationMethod::Email);
        assert!(!settings.unique_email);
        assert_eq!(settings.email_verification, EmailVerification::Mandatory);
        assert_eq!(settings.ui_host.as_deref(), Some("example.com"));
        assert_eq!(settings.ui_port, Some(8080));
        assert!(settings.use_https);
        assert_eq!(settings.password_policy.min_length, 12);
    }

    #[test]
    fn test_blank_ui_host_is_unset() {
        let mut vars = required();
        vars.push(("UI_HOST", "  "));
        assert!(load(&vars).unwrap().account.ui_host.is_none());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut vars = required();
        vars.push(("UI_PORT", "eighty"));
        assert!(load(&vars).unwrap_err().to_string().contains("UI_PORT"));

        let mut vars = required();
        vars.push(("ACCOUNT_AUTHENTICATION_METHOD", "phone"));
        assert!(load(&vars).is_err());
    }

    #[test]
    fn test_parse_helpers() {
        assert!(parse_bool("X", "On").unwrap());
        assert!(!parse_bool("X", "0").unwrap());
        assert!(parse_bool("X", "maybe").is_err());
        assert_eq!(
            parse_list("http://a.com, http://b.com,,"),
            vec!["http://a.com", "http://b.com"]
        );
    }
}
