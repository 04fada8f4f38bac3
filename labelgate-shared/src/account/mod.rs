/// Account flows: registration, password reset and login
///
/// Each flow is a small struct built from its collaborators (user store,
/// [`AccountAdapter`], settings) and shares nothing with the others.
///
/// # Modules
///
/// - [`registration`]: sign-up and placeholder-account takeover
/// - [`password_reset`]: reset e-mails with a configurable link domain
/// - [`login`]: credential checks under the configured authentication method
/// - [`adapter`]: overridable cleaning rules and the post-sign-up hook
/// - [`settings`]: behaviour switches shared by the flows
pub mod adapter;
pub mod error;
pub mod login;
pub mod password_reset;
pub mod registration;
pub mod settings;

pub use adapter::{AccountAdapter, DefaultAccountAdapter};
pub use error::{AccountError, AccountResult};
pub use login::{Login, LoginRequest};
pub use password_reset::{EmailOptions, PasswordReset};
pub use registration::{Registered, Registration, SignupData};
pub use settings::{AccountSettings, AuthenticationMethod, EmailVerification};
