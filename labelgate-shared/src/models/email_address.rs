//! E-mail address records
//!
//! Every registered account gets one primary `email_addresses` row for its
//! sign-up e-mail. The `verified` flag is what mandatory e-mail verification
//! checks at login, and an unverified row owned by an account without a usable
//! password is how bulk-imported placeholder accounts are recognised.
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE email_addresses (
//!     id UUID PRIMARY KEY,
//!     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
//!     email VARCHAR(254) NOT NULL,
//!     verified BOOLEAN NOT NULL DEFAULT FALSE,
//!     is_primary BOOLEAN NOT NULL DEFAULT FALSE,
//!     UNIQUE (user_id, email)
//! );
//! ```

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// E-mail address owned by a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct EmailAddress {
    pub id: Uuid,

    /// Owning user
    pub user_id: Uuid,

    pub email: String,

    /// Set once the owner confirmed the address
    pub verified: bool,

    /// The address used for account mail
    pub is_primary: bool,
}

impl EmailAddress {
    /// Builds an unverified primary address for a user
    pub fn primary(user_id: Uuid, email: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            email: email.to_string(),
            verified: false,
            is_primary: true,
        }
    }

    /// Stores the address, keeping an existing row for the same user and e-mail
    pub async fn create(pool: &PgPool, address: &EmailAddress) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, EmailAddress>(
            r#"
            INSERT INTO email_addresses (id, user_id, email, verified, is_primary)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id, email) DO UPDATE SET is_primary = EXCLUDED.is_primary
            RETURNING id, user_id, email, verified, is_primary
            "#,
        )
        .bind(address.id)
        .bind(address.user_id)
        .bind(&address.email)
        .bind(address.verified)
        .bind(address.is_primary)
        .fetch_one(pool)
        .await
    }

    /// Whether the user has confirmed the given e-mail address
    pub async fn is_verified_for(
        pool: &PgPool,
        user_id: Uuid,
        email: &str,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM email_addresses
                WHERE user_id = $1 AND LOWER(email) = LOWER($2) AND verified
            )
            "#,
        )
        .bind(user_id)
        .bind(email)
        .fetch_one(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_address_starts_unverified() {
        let user_id = Uuid::new_v4();
        let address = EmailAddress::primary(user_id, "a@b.com");

        assert_eq!(address.user_id, user_id);
        assert_eq!(address.email, "a@b.com");
        assert!(address.is_primary);
        assert!(!address.verified);
    }
}
