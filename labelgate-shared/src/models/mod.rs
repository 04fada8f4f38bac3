/// Database models for Labelgate
///
/// # Models
///
/// - `user`: User accounts
/// - `email_address`: Per-user e-mail identities and their verification state
pub mod email_address;
pub mod user;
