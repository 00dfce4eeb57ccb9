//! In-process user directory for tests and dry runs.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::password::{hash_password, validate_password};
use super::{User, UserDirectory, UserError};

#[derive(Debug, Default)]
pub struct MemoryUserDirectory {
    users: RwLock<HashMap<String, (User, Option<String>)>>,
}

impl MemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_users(users: impl IntoIterator<Item = User>) -> Self {
        let users = users
            .into_iter()
            .map(|u| (u.id.clone(), (u, None)))
            .collect();
        Self {
            users: RwLock::new(users),
        }
    }

    pub async fn insert(&self, user: User) {
        self.users.write().await.insert(user.id.clone(), (user, None));
    }

    /// Stored bcrypt hash, if a password was ever set.
    pub async fn password_hash(&self, user_id: &str) -> Option<String> {
        self.users
            .read()
            .await
            .get(user_id)
            .and_then(|(_, hash)| hash.clone())
    }
}

#[async_trait]
impl UserDirectory for MemoryUserDirectory {
    async fn find_by_id(&self, user_id: &str) -> Result<Option<User>, UserError> {
        Ok(self.users.read().await.get(user_id).map(|(u, _)| u.clone()))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserError> {
        let email = email.trim();
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|(u, _)| u.email.eq_ignore_ascii_case(email))
            .map(|(u, _)| u.clone()))
    }

    async fn mark_email_verified(&self, user_id: &str) -> Result<(), UserError> {
        let mut users = self.users.write().await;
        let (user, _) = users
            .get_mut(user_id)
            .ok_or_else(|| UserError::NotFound(user_id.to_string()))?;
        user.email_verified = true;
        Ok(())
    }

    async fn set_password(&self, user_id: &str, new_password: &str) -> Result<(), UserError> {
        validate_password(new_password)?;
        let hash = hash_password(new_password)?;
        let mut users = self.users.write().await;
        let (_, stored) = users
            .get_mut(user_id)
            .ok_or_else(|| UserError::NotFound(user_id.to_string()))?;
        *stored = Some(hash);
        Ok(())
    }
}
