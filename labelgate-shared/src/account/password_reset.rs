//! Password reset e-mails
//!
//! The web UI is often served from a different host than the API (a separate
//! frontend container, a dev server on another port). Reset links must point
//! at the UI, so when `ui_host` is configured it replaces whatever domain the
//! request arrived on.

use super::adapter::AccountAdapter;
use super::error::AccountResult;
use super::settings::AccountSettings;
use crate::auth::tokens::TokenGenerator;
use crate::mail::{EmailMessage, Mailer};
use crate::models::user::User;
use crate::store::UserStore;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

/// Path of the UI page that consumes reset links
pub const RESET_CONFIRM_PATH: &str = "/auth/password/reset/confirm";

/// Options handed to the reset-mail renderer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmailOptions {
    /// `host` or `host:port` replacing the link domain
    pub domain_override: Option<String>,
}

/// Values available to the reset e-mail body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResetContext {
    pub email: String,
    pub domain: String,
    pub site_name: String,
    pub uid: String,
    pub token: String,
    pub protocol: &'static str,
}

impl ResetContext {
    /// Absolute link to the reset confirmation page
    pub fn link(&self) -> String {
        format!(
            "{}://{}{}?uid={}&token={}",
            self.protocol, self.domain, RESET_CONFIRM_PATH, self.uid, self.token
        )
    }

    fn render(&self) -> EmailMessage {
        EmailMessage {
            to: self.email.clone(),
            subject: format!("Password reset on {}", self.site_name),
            body: format!(
                "You're receiving this email because you requested a password reset \
                 for your user account at {}.\n\n\
                 Please go to the following page and choose a new password:\n\n{}\n\n\
                 Thanks for using our site!\n\nThe {} team\n",
                self.site_name,
                self.link(),
                self.site_name
            ),
        }
    }
}

/// Password-reset adapter
#[derive(Clone)]
pub struct PasswordReset {
    store: Arc<dyn UserStore>,
    mailer: Arc<dyn Mailer>,
    tokens: Arc<dyn TokenGenerator>,
    adapter: Arc<dyn AccountAdapter>,
    settings: Arc<AccountSettings>,
}

impl PasswordReset {
    pub fn new(
        store: Arc<dyn UserStore>,
        mailer: Arc<dyn Mailer>,
        tokens: Arc<dyn TokenGenerator>,
        adapter: Arc<dyn AccountAdapter>,
        settings: Arc<AccountSettings>,
    ) -> Self {
        Self {
            store,
            mailer,
            tokens,
            adapter,
            settings,
        }
    }

    /// Link domain override derived from `ui_host` and `ui_port`
    ///
    /// A port of 0 counts as unset.
    pub fn email_options(&self) -> EmailOptions {
        let port = self.settings.ui_port.filter(|port| *port != 0);
        let domain_override = self.settings.ui_host.as_ref().map(|host| {
            match port {
                Some(port) => format!("{}:{}", host, port),
                None => host.clone(),
            }
        });

        EmailOptions { domain_override }
    }

    fn context_for(&self, user: &User, domain: &str, site_name: &str) -> AccountResult<ResetContext> {
        Ok(ResetContext {
            email: user.email.clone(),
            domain: domain.to_string(),
            site_name: site_name.to_string(),
            uid: user.id.to_string(),
            token: self.tokens.make_token(user)?,
            protocol: if self.settings.use_https { "https" } else { "http" },
        })
    }

    /// Sends a reset e-mail to every active account with a usable password
    /// registered under `email`
    ///
    /// Returns how many messages went out. An unknown address is not an error,
    /// so callers cannot probe which e-mails have accounts.
    pub async fn save(&self, email: &str, request_host: Option<&str>) -> AccountResult<usize> {
        let email = self.adapter.clean_email(email);
        let options = self.email_options();

        let domain = options
            .domain_override
            .as_deref()
            .or(request_host)
            .unwrap_or(&self.settings.site_domain)
            .to_string();
        let site_name = options
            .domain_override
            .clone()
            .unwrap_or_else(|| self.settings.site_name.clone());

        let users: Vec<User> = self
            .store
            .filter_users_by_email(&email)
            .await?
            .into_iter()
            .filter(|user| user.is_active && user.has_usable_password())
            .collect();

        if users.is_empty() {
            debug!(email = %email, "No account eligible for password reset");
            return Ok(0);
        }

        for user in &users {
            let context = self.context_for(user, &domain, &site_name)?;
            self.mailer.send(context.render()).await?;
            info!(user_id = %user.id, domain = %domain, "Password reset e-mail sent");
        }

        Ok(users.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::adapter::DefaultAccountAdapter;
    use crate::auth::tokens::JwtTokenGenerator;
    use crate::mail::MemoryMailer;
    use crate::store::MemoryUserStore;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    struct Fixture {
        store: MemoryUserStore,
        mailer: MemoryMailer,
        tokens: JwtTokenGenerator,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                store: MemoryUserStore::new(),
                mailer: MemoryMailer::new(),
                tokens: JwtTokenGenerator::new(SECRET),
            }
        }

        fn reset(&self, settings: AccountSettings) -> PasswordReset {
            PasswordReset::new(
                Arc::new(self.store.clone()),
                Arc::new(self.mailer.clone()),
                Arc::new(self.tokens.clone()),
                Arc::new(DefaultAccountAdapter::default()),
                Arc::new(settings),
            )
        }

        async fn add_user(&self, username: &str, email: &str, usable: bool) -> User {
            let mut user = User::blank();
            user.username = username.to_string();
            user.email = email.to_string();
            if usable {
                user.set_password_hash("$argon2id$v=19$stub".to_string());
            }
            self.store.save_user(&user).await.unwrap()
        }
    }

    fn with_ui(host: Option<&str>, port: Option<u16>) -> AccountSettings {
        AccountSettings {
            ui_host: host.map(str::to_string),
            ui_port: port,
            ..AccountSettings::default()
        }
    }

    #[test]
    fn test_email_options_host_and_port() {
        let fixture = Fixture::new();
        let options = fixture
            .reset(with_ui(Some("example.com"), Some(8080)))
            .email_options();
        assert_eq!(options.domain_override.as_deref(), Some("example.com:8080"));
    }

    #[test]
    fn test_email_options_host_only() {
        let fixture = Fixture::new();
        let options = fixture.reset(with_ui(Some("example.com"), None)).email_options();
        assert_eq!(options.domain_override.as_deref(), Some("example.com"));
    }

    #[test]
    fn test_email_options_port_without_host() {
        let fixture = Fixture::new();
        let options = fixture.reset(with_ui(None, Some(8080))).email_options();
        assert_eq!(options, EmailOptions::default());
    }

    #[test]
    fn test_email_options_zero_port_is_unset() {
        let fixture = Fixture::new();
        let options = fixture
            .reset(with_ui(Some("ui.example.com"), Some(0)))
            .email_options();
        assert_eq!(options.domain_override.as_deref(), Some("ui.example.com"));
    }

    #[tokio::test]
    async fn test_link_uses_override() {
        let fixture = Fixture::new();
        let user = fixture.add_user("alice", "alice@example.com", true).await;

        let sent = fixture
            .reset(with_ui(Some("ui.example.com"), Some(8080)))
            .save("alice@example.com", Some("api.internal:7000"))
            .await
            .unwrap();
        assert_eq!(sent, 1);

        let messages = fixture.mailer.sent().await;
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].to, "alice@example.com");
        assert!(messages[0]
            .body
            .contains("http://ui.example.com:8080/auth/password/reset/confirm?uid="));
        assert!(messages[0].body.contains(&user.id.to_string()));
        assert!(messages[0].subject.contains("ui.example.com:8080"));
    }

    #[tokio::test]
    async fn test_link_falls_back_to_request_host_then_site_domain() {
        let fixture = Fixture::new();
        fixture.add_user("alice", "alice@example.com", true).await;
        let reset = fixture.reset(AccountSettings::default());

        reset
            .save("alice@example.com", Some("api.example.com"))
            .await
            .unwrap();
        reset.save("alice@example.com", None).await.unwrap();

        let messages = fixture.mailer.sent().await;
        assert!(messages[0].body.contains("http://api.example.com/auth/"));
        assert!(messages[1].body.contains("http://localhost/auth/"));
        assert!(messages[1].subject.contains("Labelgate"));
    }

    #[tokio::test]
    async fn test_https_links() {
        let fixture = Fixture::new();
        fixture.add_user("alice", "alice@example.com", true).await;
        let settings = AccountSettings {
            use_https: true,
            ..with_ui(Some("example.com"), None)
        };

        fixture
            .reset(settings)
            .save("alice@example.com", None)
            .await
            .unwrap();

        assert!(fixture.mailer.sent().await[0]
            .body
            .contains("https://example.com/auth/password/reset/confirm"));
    }

    #[tokio::test]
    async fn test_token_in_link_is_valid() {
        let fixture = Fixture::new();
        let user = fixture.add_user("alice", "alice@example.com", true).await;
        let reset = fixture.reset(AccountSettings::default());

        let context = reset.context_for(&user, "example.com", "Labelgate").unwrap();
        assert!(fixture.tokens.check_token(&user, &context.token));
        assert_eq!(
            context.link(),
            format!(
                "http://example.com/auth/password/reset/confirm?uid={}&token={}",
                user.id, context.token
            )
        );
    }

    #[tokio::test]
    async fn test_unknown_email_sends_nothing() {
        let fixture = Fixture::new();
        let sent = fixture
            .reset(AccountSettings::default())
            .save("ghost@example.com", None)
            .await
            .unwrap();

        assert_eq!(sent, 0);
        assert!(fixture.mailer.sent().await.is_empty());
    }

    #[tokio::test]
    async fn test_skips_inactive_and_unusable_accounts() {
        let fixture = Fixture::new();
        fixture.add_user("placeholder", "shared@example.com", false).await;
        let mut inactive = fixture.add_user("gone", "shared@example.com", true).await;
        inactive.is_active = false;
        fixture.store.save_user(&inactive).await.unwrap();
        fixture.add_user("alice", "Shared@Example.com", true).await;

        let sent = fixture
            .reset(AccountSettings::default())
            .save("SHARED@example.com", None)
            .await
            .unwrap();

        assert_eq!(sent, 1);
    }
}
