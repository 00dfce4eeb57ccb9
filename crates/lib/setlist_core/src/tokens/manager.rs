//! Token lifecycle rules.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde_json::json;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{TOKEN_LIFETIME_SECS, Token, TokenError, TokenPurpose, TokenStore};
use crate::audit::{AuditAction, AuditEvent, AuditSink};
use crate::users::UserDirectory;
use crate::uuid::{token_value, uuidv7};

/// Issues, looks up, supersedes and redeems one-time tokens.
#[derive(Clone)]
pub struct TokenManager {
    store: Arc<dyn TokenStore>,
    users: Arc<dyn UserDirectory>,
    audit: Arc<dyn AuditSink>,
}

impl TokenManager {
    pub fn new(
        store: Arc<dyn TokenStore>,
        users: Arc<dyn UserDirectory>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            store,
            users,
            audit,
        }
    }

    /// Create a fresh active token for `user_id`.
    ///
    /// Existing tokens for the pair are left alone; use
    /// [`TokenManager::reissue`] to supersede them.
    pub async fn issue(&self, user_id: &str, purpose: TokenPurpose) -> Result<Token, TokenError> {
        self.require_user(user_id).await?;
        let token = new_token(user_id, purpose);
        self.store.insert(&token).await?;
        info!(user_id, %purpose, token_id = %token.id, "issued token");
        self.record_issued(&token).await;
        Ok(token)
    }

    /// The active token for the pair, if any.
    pub async fn find_active(
        &self,
        user_id: &str,
        purpose: TokenPurpose,
    ) -> Result<Option<Token>, TokenError> {
        let found = self.store.find_active(user_id, purpose).await?;
        Ok(pick_one(found, user_id, purpose))
    }

    /// The token carrying `value` if it can still be redeemed now.
    pub async fn find_redeemable(
        &self,
        value: Uuid,
        user_id: &str,
        purpose: TokenPurpose,
    ) -> Result<Option<Token>, TokenError> {
        self.find_redeemable_at(value, user_id, purpose, Utc::now())
            .await
    }

    /// As [`TokenManager::find_redeemable`], evaluated at `now`.
    pub async fn find_redeemable_at(
        &self,
        value: Uuid,
        user_id: &str,
        purpose: TokenPurpose,
        now: DateTime<Utc>,
    ) -> Result<Option<Token>, TokenError> {
        let found: Vec<Token> = self
            .store
            .find_by_value(value, user_id, purpose)
            .await?
            .into_iter()
            .filter(|t| {
                let live = t.is_redeemable_at(now);
                if !live {
                    debug!(token_id = %t.id, expires_at = %t.expires_at, "token expired");
                }
                live
            })
            .collect();
        Ok(pick_one(found, user_id, purpose))
    }

    /// Deactivate every active token for the pair; returns how many.
    pub async fn deactivate_active(
        &self,
        user_id: &str,
        purpose: TokenPurpose,
    ) -> Result<u64, TokenError> {
        let count = self.store.deactivate_active(user_id, purpose).await?;
        if count > 0 {
            info!(user_id, %purpose, count, "deactivated tokens");
            self.record_deactivated(user_id, purpose, count).await;
        }
        Ok(count)
    }

    /// Supersede any active token for the pair with a fresh one, atomically.
    pub async fn reissue(&self, user_id: &str, purpose: TokenPurpose) -> Result<Token, TokenError> {
        self.require_user(user_id).await?;
        let token = new_token(user_id, purpose);
        let count = self.store.replace_active(&token).await?;
        if count > 0 {
            self.record_deactivated(user_id, purpose, count).await;
        }
        info!(user_id, %purpose, token_id = %token.id, superseded = count, "reissued token");
        self.record_issued(&token).await;
        Ok(token)
    }

    /// Spend the token carrying `value`.
    pub async fn redeem(
        &self,
        value: Uuid,
        user_id: &str,
        purpose: TokenPurpose,
    ) -> Result<Token, TokenError> {
        let Some(mut token) = self.find_redeemable(value, user_id, purpose).await? else {
            debug!(user_id, %purpose, "no redeemable token");
            return Err(TokenError::TokenNotFound);
        };
        if !self.store.mark_used(token.id).await? {
            warn!(user_id, %purpose, token_id = %token.id, "token spent concurrently");
            return Err(TokenError::TokenNotFound);
        }
        token.used = true;
        token.active = false;

        info!(user_id, %purpose, token_id = %token.id, "redeemed token");
        self.audit
            .record(AuditEvent::new(
                user_id,
                AuditAction::TokenRedeemed,
                json!({ "purpose": purpose.as_str(), "token_id": token.id }),
            ))
            .await;
        Ok(token)
    }

    async fn require_user(&self, user_id: &str) -> Result<(), TokenError> {
        if user_id.trim().is_empty() {
            return Err(TokenError::InvalidInput("user_id cannot be empty".into()));
        }
        match self.users.find_by_id(user_id).await? {
            Some(_) => Ok(()),
            None => {
                warn!(user_id, "token requested for unknown user");
                Err(TokenError::UserNotFound(user_id.to_string()))
            }
        }
    }

    async fn record_issued(&self, token: &Token) {
        self.audit
            .record(AuditEvent::new(
                &token.user_id,
                AuditAction::TokenIssued,
                json!({ "purpose": token.purpose.as_str(), "token_id": token.id }),
            ))
            .await;
    }

    async fn record_deactivated(&self, user_id: &str, purpose: TokenPurpose, count: u64) {
        self.audit
            .record(AuditEvent::new(
                user_id,
                AuditAction::TokenDeactivated,
                json!({ "purpose": purpose.as_str(), "count": count }),
            ))
            .await;
    }
}

fn new_token(user_id: &str, purpose: TokenPurpose) -> Token {
    let created_at = Utc::now();
    Token {
        id: uuidv7(),
        token: token_value(),
        user_id: user_id.to_string(),
        purpose,
        created_at,
        expires_at: created_at + Duration::seconds(TOKEN_LIFETIME_SECS),
        used: false,
        active: true,
    }
}

/// First of `found`, logging when there is more than one.
fn pick_one(found: Vec<Token>, user_id: &str, purpose: TokenPurpose) -> Option<Token> {
    if found.len() > 1 {
        warn!(user_id, %purpose, count = found.len(), "multiple active tokens found");
    }
    found.into_iter().next()
}
