//! User model and database operations
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE users (
//!     id UUID PRIMARY KEY,
//!     username VARCHAR(150) NOT NULL,
//!     email VARCHAR(254) NOT NULL DEFAULT '',
//!     first_name VARCHAR(150) NOT NULL DEFAULT '',
//!     last_name VARCHAR(150) NOT NULL DEFAULT '',
//!     password_hash VARCHAR(255),
//!     is_active BOOLEAN NOT NULL DEFAULT TRUE,
//!     date_joined TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     last_login TIMESTAMPTZ
//! );
//! CREATE UNIQUE INDEX users_username_lower_idx ON users (LOWER(username));
//! ```
//!
//! A `NULL` password hash marks an *unusable* password. Accounts created by
//! bulk import start out that way until someone registers with their e-mail.
//!
//! # Example
//!
//! ```no_run
//! use labelgate_shared::models::user::User;
//! use labelgate_shared::db::pool::{create_pool, DatabaseConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = create_pool(DatabaseConfig::default()).await?;
//!
//! let mut user = User::blank();
//! user.username = "jdoe".to_string();
//! user.email = "jdoe@example.com".to_string();
//! let user = User::save(&pool, &user).await?;
//!
//! let found = User::filter_by_email(&pool, "JDoe@Example.com").await?;
//! assert_eq!(found[0].id, user.id);
//! # Ok(())
//! # }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

const USER_COLUMNS: &str = "id, username, email, first_name, last_name, password_hash, \
                            is_active, date_joined, last_login";

/// User account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID (UUID v4)
    pub id: Uuid,

    /// Login name, unique case-insensitively
    pub username: String,

    /// Primary e-mail address (may be empty)
    pub email: String,

    pub first_name: String,

    pub last_name: String,

    /// Argon2id password hash
    ///
    /// `None` means the password is unusable and nobody can log in with it.
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,

    /// Inactive accounts cannot log in
    pub is_active: bool,

    pub date_joined: DateTime<Utc>,

    /// When the user last logged in (None if never logged in)
    pub last_login: Option<DateTime<Utc>>,
}

impl User {
    /// Builds an unsaved user with a fresh ID and an unusable password
    pub fn blank() -> Self {
        Self {
            id: Uuid::new_v4(),
            username: String::new(),
            email: String::new(),
            first_name: String::new(),
            last_name: String::new(),
            password_hash: None,
            is_active: true,
            date_joined: Utc::now(),
            last_login: None,
        }
    }

    /// Whether the account has a password someone can log in with
    pub fn has_usable_password(&self) -> bool {
        self.password_hash.is_some()
    }

    pub fn set_password_hash(&mut self, hash: String) {
        self.password_hash = Some(hash);
    }

    pub fn set_unusable_password(&mut self) {
        self.password_hash = None;
    }

    /// Inserts the user, or overwrites every column of the row with the same ID
    ///
    /// # Errors
    ///
    /// Returns an error if the username is already taken by another row or
    /// the database connection fails.
    pub async fn save(pool: &PgPool, user: &User) -> Result<Self, sqlx::Error> {
        let query = format!(
            r#"
            INSERT INTO users (id, username, email, first_name, last_name, password_hash,
                               is_active, date_joined, last_login)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (id) DO UPDATE SET
                username = EXCLUDED.username,
                email = EXCLUDED.email,
                first_name = EXCLUDED.first_name,
                last_name = EXCLUDED.last_name,
                password_hash = EXCLUDED.password_hash,
                is_active = EXCLUDED.is_active,
                last_login = EXCLUDED.last_login
            RETURNING {USER_COLUMNS}
            "#
        );

        sqlx::query_as::<_, User>(&query)
            .bind(user.id)
            .bind(&user.username)
            .bind(&user.email)
            .bind(&user.first_name)
            .bind(&user.last_name)
            .bind(&user.password_hash)
            .bind(user.is_active)
            .bind(user.date_joined)
            .bind(user.last_login)
            .fetch_one(pool)
            .await
    }

    /// Finds a user by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");

        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Finds a user by username, ignoring case
    pub async fn find_by_username(
        pool: &PgPool,
        username: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE LOWER(username) = LOWER($1)");

        sqlx::query_as::<_, User>(&query)
            .bind(username)
            .fetch_optional(pool)
            .await
    }

    /// Returns every distinct user owning the e-mail address
    ///
    /// Matches both the user's own `email` column and any of their
    /// `email_addresses` rows, case-insensitively.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use labelgate_shared::models::user::User;
    /// # use sqlx::PgPool;
    /// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
    /// let owners = User::filter_by_email(&pool, "someone@example.com").await?;
    /// if owners.len() > 1 {
    ///     println!("e-mail is shared by {} accounts", owners.len());
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn filter_by_email(pool: &PgPool, email: &str) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            r#"
            SELECT {USER_COLUMNS} FROM users
            WHERE LOWER(email) = LOWER($1)
               OR id IN (SELECT user_id FROM email_addresses WHERE LOWER(email) = LOWER($1))
            ORDER BY date_joined
            "#
        );

        sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_all(pool)
            .await
    }

    /// Whether any account already uses the e-mail address
    pub async fn email_exists(pool: &PgPool, email: &str) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            SELECT EXISTS (SELECT 1 FROM email_addresses WHERE LOWER(email) = LOWER($1))
                OR EXISTS (SELECT 1 FROM users WHERE LOWER(email) = LOWER($1))
            "#,
        )
        .bind(email)
        .fetch_one(pool)
        .await
    }

    /// Whether the username is taken, optionally ignoring one account
    pub async fn username_exists(
        pool: &PgPool,
        username: &str,
        exclude: Option<Uuid>,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM users
                WHERE LOWER(username) = LOWER($1)
                  AND ($2::uuid IS NULL OR id <> $2)
            )
            "#,
        )
        .bind(username)
        .bind(exclude)
        .fetch_one(pool)
        .await
    }

    /// Updates the last login timestamp for a user
    ///
    /// Returns true if the user was found and updated.
    pub async fn update_last_login(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET last_login = NOW() WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
