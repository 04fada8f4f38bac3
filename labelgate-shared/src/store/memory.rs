//! In-memory user store
//!
//! Mirrors the PostgreSQL store's matching rules (case-insensitive e-mail and
//! username, unique usernames, one address row per user and e-mail) so the
//! account adapters behave the same against either.
//!
//! # Example
//!
//! ```
//! use labelgate_shared::models::user::User;
//! use labelgate_shared::store::{MemoryUserStore, UserStore};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let store = MemoryUserStore::new();
//!
//! let mut user = User::blank();
//! user.username = "alice".to_string();
//! user.email = "alice@example.com".to_string();
//! store.save_user(&user).await.unwrap();
//!
//! assert!(store.email_exists("ALICE@example.com").await.unwrap());
//! # }
//! ```

use super::{StoreError, StoreResult, UserStore};
use crate::models::{email_address::EmailAddress, user::User};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// User store kept in process memory
#[derive(Clone, Default)]
pub struct MemoryUserStore {
    users: Arc<RwLock<HashMap<Uuid, User>>>,
    addresses: Arc<RwLock<Vec<EmailAddress>>>,
}

fn same(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores an address record as-is (used to seed imported accounts)
    pub async fn insert_email_address(&self, address: EmailAddress) {
        self.addresses.write().await.push(address);
    }

    pub async fn get(&self, id: Uuid) -> Option<User> {
        self.users.read().await.get(&id).cloned()
    }

    pub async fn user_count(&self) -> usize {
        self.users.read().await.len()
    }

    /// Address records owned by the user
    pub async fn email_addresses_of(&self, user_id: Uuid) -> Vec<EmailAddress> {
        self.addresses
            .read()
            .await
            .iter()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect()
    }

    /// Marks the user's address record for `email` as confirmed
    pub async fn verify_email(&self, user_id: Uuid, email: &str) {
        for address in self.addresses.write().await.iter_mut() {
            if address.user_id == user_id && same(&address.email, email) {
                address.verified = true;
            }
        }
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn email_exists(&self, email: &str) -> StoreResult<bool> {
        if self.addresses.read().await.iter().any(|a| same(&a.email, email)) {
            return Ok(true);
        }
        Ok(self.users.read().await.values().any(|u| same(&u.email, email)))
    }

    async fn dummy_user(&self, email: &str) -> StoreResult<Option<User>> {
        let owners = self.filter_users_by_email(email).await?;
        let [owner] = owners.as_slice() else {
            return Ok(None);
        };
        if owner.has_usable_password() {
            return Ok(None);
        }

        let verified = self
            .addresses
            .read()
            .await
            .iter()
            .any(|a| a.user_id == owner.id && a.verified && same(&a.email, email));
        Ok((!verified).then(|| owner.clone()))
    }

    async fn filter_users_by_email(&self, email: &str) -> StoreResult<Vec<User>> {
        let owners: Vec<Uuid> = self
            .addresses
            .read()
            .await
            .iter()
            .filter(|a| same(&a.email, email))
            .map(|a| a.user_id)
            .collect();

        let users = self.users.read().await;
        let mut found: Vec<User> = users
            .values()
            .filter(|u| same(&u.email, email) || owners.contains(&u.id))
            .cloned()
            .collect();
        found.sort_by_key(|u| u.date_joined);
        Ok(found)
    }

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| same(&u.username, username)).cloned())
    }

    async fn username_exists(&self, username: &str, exclude: Option<Uuid>) -> StoreResult<bool> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .any(|u| Some(u.id) != exclude && same(&u.username, username)))
    }

    async fn save_user(&self, user: &User) -> StoreResult<User> {
        let mut users = self.users.write().await;
        let clash = users
            .values()
            .any(|u| u.id != user.id && same(&u.username, &user.username));
        if clash {
            return Err(StoreError::Conflict(
                "Constraint violation: users_username_lower_idx".to_string(),
            ));
        }

        users.insert(user.id, user.clone());
        Ok(user.clone())
    }

    async fn setup_user_email(&self, user: &User) -> StoreResult<Option<EmailAddress>> {
        if user.email.is_empty() {
            return Ok(None);
        }

        let mut addresses = self.addresses.write().await;
        if let Some(existing) = addresses
            .iter_mut()
            .find(|a| a.user_id == user.id && a.email == user.email)
        {
            existing.is_primary = true;
            return Ok(Some(existing.clone()));
        }

        let address = EmailAddress::primary(user.id, &user.email);
        addresses.push(address.clone());
        Ok(Some(address))
    }

    async fn has_verified_email(&self, user: &User) -> StoreResult<bool> {
        let addresses = self.addresses.read().await;
        Ok(addresses
            .iter()
            .any(|a| a.user_id == user.id && a.verified && same(&a.email, &user.email)))
    }

    async fn update_last_login(&self, user_id: Uuid) -> StoreResult<()> {
        if let Some(user) = self.users.write().await.get_mut(&user_id) {
            user.last_login = Some(Utc::now());
        }
        Ok(())
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(username: &str, email: &str) -> User {
        let mut user = User::blank();
        user.username = username.to_string();
        user.email = email.to_string();
        user
    }

    #[tokio::test]
    async fn test_username_clash_is_conflict() {
        let store = MemoryUserStore::new();
        store.save_user(&user("alice", "a@x.com")).await.unwrap();

        let result = store.save_user(&user("ALICE", "b@x.com")).await;
        assert!(matches!(result, Err(StoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_save_overwrites_same_id() {
        let store = MemoryUserStore::new();
        let mut alice = store.save_user(&user("alice", "a@x.com")).await.unwrap();

        alice.first_name = "Alice".to_string();
        store.save_user(&alice).await.unwrap();

        assert_eq!(store.user_count().await, 1);
        assert_eq!(store.get(alice.id).await.unwrap().first_name, "Alice");
    }

    #[tokio::test]
    async fn test_filter_users_by_email_uses_addresses() {
        let store = MemoryUserStore::new();
        let alice = store.save_user(&user("alice", "a@x.com")).await.unwrap();
        let bob = store.save_user(&user("bob", "bob@x.com")).await.unwrap();
        store
            .insert_email_address(EmailAddress::primary(bob.id, "A@X.com"))
            .await;

        let owners = store.filter_users_by_email("a@x.com").await.unwrap();
        let ids: Vec<Uuid> = owners.iter().map(|u| u.id).collect();
        assert_eq!(owners.len(), 2);
        assert!(ids.contains(&alice.id));
        assert!(ids.contains(&bob.id));
    }

    #[tokio::test]
    async fn test_dummy_user_requires_single_unverified_address() {
        let store = MemoryUserStore::new();
        let imported = store.save_user(&user("imported", "i@x.com")).await.unwrap();
        store
            .insert_email_address(EmailAddress::primary(imported.id, "i@x.com"))
            .await;

        let found = store.dummy_user("I@X.COM").await.unwrap();
        assert_eq!(found.map(|u| u.id), Some(imported.id));

        store.verify_email(imported.id, "i@x.com").await;
        assert!(store.dummy_user("i@x.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_account_with_password_is_not_dummy() {
        let store = MemoryUserStore::new();
        let mut owner = user("owner", "o@x.com");
        owner.set_password_hash("hash".to_string());
        let owner = store.save_user(&owner).await.unwrap();
        store.setup_user_email(&owner).await.unwrap();

        assert!(store.dummy_user("o@x.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_dummy_user_without_address_record() {
        let store = MemoryUserStore::new();
        let imported = store.save_user(&user("imported", "d@x.com")).await.unwrap();

        let found = store.dummy_user("D@x.com").await.unwrap();
        assert_eq!(found.map(|u| u.id), Some(imported.id));
    }

    #[tokio::test]
    async fn test_dummy_user_with_case_variant_addresses() {
        let store = MemoryUserStore::new();
        let imported = store.save_user(&user("imported", "c@x.com")).await.unwrap();
        store
            .insert_email_address(EmailAddress::primary(imported.id, "c@x.com"))
            .await;
        store
            .insert_email_address(EmailAddress::primary(imported.id, "C@X.com"))
            .await;

        let found = store.dummy_user("c@x.com").await.unwrap();
        assert_eq!(found.map(|u| u.id), Some(imported.id));
    }

    #[tokio::test]
    async fn test_no_dummy_when_real_account_shares_email() {
        let store = MemoryUserStore::new();
        let mut owner = user("owner", "e@x.com");
        owner.set_password_hash("hash".to_string());
        store.save_user(&owner).await.unwrap();

        let placeholder = store.save_user(&user("placeholder", "p@x.com")).await.unwrap();
        store
            .insert_email_address(EmailAddress::primary(placeholder.id, "e@x.com"))
            .await;

        assert_eq!(store.filter_users_by_email("e@x.com").await.unwrap().len(), 2);
        assert!(store.dummy_user("e@x.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_setup_user_email_is_idempotent() {
        let store = MemoryUserStore::new();
        let alice = store.save_user(&user("alice", "a@x.com")).await.unwrap();

        store.setup_user_email(&alice).await.unwrap();
        store.setup_user_email(&alice).await.unwrap();

        assert_eq!(store.email_addresses_of(alice.id).await.len(), 1);
    }

    #[tokio::test]
    async fn test_setup_user_email_skips_empty_email() {
        let store = MemoryUserStore::new();
        let nobody = store.save_user(&user("nobody", "")).await.unwrap();

        assert!(store.setup_user_email(&nobody).await.unwrap().is_none());
    }
}
