//! User persistence seam
//!
//! The account adapters never talk to the database directly; they go through
//! [`UserStore`]. Two implementations ship with the crate:
//!
//! - [`postgres::PgUserStore`]: PostgreSQL via the `models` layer
//! - [`memory::MemoryUserStore`]: in-process maps, for tests and local runs

use crate::models::{email_address::EmailAddress, user::User};
use async_trait::async_trait;
use uuid::Uuid;

pub mod memory;
pub mod postgres;

pub use memory::MemoryUserStore;
pub use postgres::PgUserStore;

/// Store error types
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A uniqueness rule was broken by the write
    #[error("Conflict: {0}")]
    Conflict(String),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence operations needed by registration, login and password reset
///
/// All e-mail and username comparisons are case-insensitive.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Whether any account already uses the e-mail address
    async fn email_exists(&self, email: &str) -> StoreResult<bool>;

    /// Returns the placeholder account waiting to be claimed with this e-mail
    ///
    /// A placeholder exists when exactly one distinct user owns the e-mail
    /// (through `users.email` or an address record), that user has no usable
    /// password and none of its records for the e-mail is verified.
    async fn dummy_user(&self, email: &str) -> StoreResult<Option<User>>;

    /// Every distinct user owning the e-mail address
    async fn filter_users_by_email(&self, email: &str) -> StoreResult<Vec<User>>;

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>>;

    /// Whether the username is taken by an account other than `exclude`
    async fn username_exists(&self, username: &str, exclude: Option<Uuid>) -> StoreResult<bool>;

    /// Inserts the user or overwrites the record with the same ID
    async fn save_user(&self, user: &User) -> StoreResult<User>;

    /// Records the user's sign-up e-mail as their primary, unverified address
    async fn setup_user_email(&self, user: &User) -> StoreResult<Option<EmailAddress>>;

    /// Whether the user has a verified address record for their e-mail
    async fn has_verified_email(&self, user: &User) -> StoreResult<bool>;

    async fn update_last_login(&self, user_id: Uuid) -> StoreResult<()>;

    /// Cheap connectivity probe for health checks
    async fn ping(&self) -> StoreResult<()>;
}
