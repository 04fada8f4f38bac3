//! PostgreSQL-backed user store

use super::{StoreError, StoreResult, UserStore};
use crate::db::pool;
use crate::models::{email_address::EmailAddress, user::User};
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

/// User store over a sqlx connection pool
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Maps unique-constraint violations to [`StoreError::Conflict`]
fn map_write_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if let Some(constraint) = db_err.constraint() {
            return StoreError::Conflict(format!("Constraint violation: {}", constraint));
        }
    }
    StoreError::Database(err)
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn email_exists(&self, email: &str) -> StoreResult<bool> {
        Ok(User::email_exists(&self.pool, email).await?)
    }

    async fn dummy_user(&self, email: &str) -> StoreResult<Option<User>> {
        let owners = User::filter_by_email(&self.pool, email).await?;
        let [owner] = owners.as_slice() else {
            return Ok(None);
        };
        if owner.has_usable_password() {
            return Ok(None);
        }

        if EmailAddress::is_verified_for(&self.pool, owner.id, email).await? {
            return Ok(None);
        }
        Ok(Some(owner.clone()))
    }

    async fn filter_users_by_email(&self, email: &str) -> StoreResult<Vec<User>> {
        Ok(User::filter_by_email(&self.pool, email).await?)
    }

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        Ok(User::find_by_username(&self.pool, username).await?)
    }

    async fn username_exists(&self, username: &str, exclude: Option<Uuid>) -> StoreResult<bool> {
        Ok(User::username_exists(&self.pool, username, exclude).await?)
    }

    async fn save_user(&self, user: &User) -> StoreResult<User> {
        debug!(user_id = %user.id, "Saving user");
        User::save(&self.pool, user).await.map_err(map_write_error)
    }

    async fn setup_user_email(&self, user: &User) -> StoreResult<Option<EmailAddress>> {
        if user.email.is_empty() {
            return Ok(None);
        }

        let address = EmailAddress::primary(user.id, &user.email);
        let stored = EmailAddress::create(&self.pool, &address)
            .await
            .map_err(map_write_error)?;
        Ok(Some(stored))
    }

    async fn has_verified_email(&self, user: &User) -> StoreResult<bool> {
        Ok(EmailAddress::is_verified_for(&self.pool, user.id, &user.email).await?)
    }

    async fn update_last_login(&self, user_id: Uuid) -> StoreResult<()> {
        User::update_last_login(&self.pool, user_id).await?;
        Ok(())
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(pool::health_check(&self.pool).await?)
    }
}
