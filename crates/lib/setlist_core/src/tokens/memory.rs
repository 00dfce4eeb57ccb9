//! In-process token store.

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{Token, TokenError, TokenPurpose, TokenStore};

/// Vec-backed store; one lock guards every operation, so
/// [`TokenStore::replace_active`] is atomic.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    tokens: Mutex<Vec<Token>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every row, including spent and superseded ones.
    pub async fn all(&self) -> Vec<Token> {
        self.tokens.lock().await.clone()
    }
}

fn is_live_for(token: &Token, user_id: &str, purpose: TokenPurpose) -> bool {
    token.user_id == user_id && token.purpose == purpose && token.active && !token.used
}

fn deactivate(tokens: &mut [Token], user_id: &str, purpose: TokenPurpose) -> u64 {
    let mut count = 0;
    for token in tokens.iter_mut().filter(|t| is_live_for(t, user_id, purpose)) {
        token.active = false;
        count += 1;
    }
    count
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn insert(&self, token: &Token) -> Result<(), TokenError> {
        self.tokens.lock().await.push(token.clone());
        Ok(())
    }

    async fn find_active(
        &self,
        user_id: &str,
        purpose: TokenPurpose,
    ) -> Result<Vec<Token>, TokenError> {
        Ok(self
            .tokens
            .lock()
            .await
            .iter()
            .filter(|t| is_live_for(t, user_id, purpose))
            .cloned()
            .collect())
    }

    async fn find_by_value(
        &self,
        value: Uuid,
        user_id: &str,
        purpose: TokenPurpose,
    ) -> Result<Vec<Token>, TokenError> {
        Ok(self
            .tokens
            .lock()
            .await
            .iter()
            .filter(|t| t.token == value && is_live_for(t, user_id, purpose))
            .cloned()
            .collect())
    }

    async fn deactivate_active(
        &self,
        user_id: &str,
        purpose: TokenPurpose,
    ) -> Result<u64, TokenError> {
        Ok(deactivate(&mut self.tokens.lock().await, user_id, purpose))
    }

    async fn mark_used(&self, id: Uuid) -> Result<bool, TokenError> {
        let mut tokens = self.tokens.lock().await;
        match tokens.iter_mut().find(|t| t.id == id && t.active && !t.used) {
            Some(token) => {
                token.used = true;
                token.active = false;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn replace_active(&self, token: &Token) -> Result<u64, TokenError> {
        let mut tokens = self.tokens.lock().await;
        let count = deactivate(&mut tokens, &token.user_id, token.purpose);
        tokens.push(token.clone());
        Ok(count)
    }
}
