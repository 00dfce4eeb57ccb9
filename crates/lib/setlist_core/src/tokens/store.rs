//! Token persistence seam.

use async_trait::async_trait;
use uuid::Uuid;

use super::{Token, TokenError, TokenPurpose};

/// Storage operations behind the token lifecycle.
///
/// "Active" below always means `active && !used`. Expiry is not the
/// store's concern.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Persist a new token row.
    async fn insert(&self, token: &Token) -> Result<(), TokenError>;

    /// Active tokens for the pair, oldest first.
    async fn find_active(&self, user_id: &str, purpose: TokenPurpose)
    -> Result<Vec<Token>, TokenError>;

    /// Active tokens for the pair carrying `value`, oldest first.
    async fn find_by_value(
        &self,
        value: Uuid,
        user_id: &str,
        purpose: TokenPurpose,
    ) -> Result<Vec<Token>, TokenError>;

    /// Deactivate every active token for the pair; returns how many.
    async fn deactivate_active(&self, user_id: &str, purpose: TokenPurpose)
    -> Result<u64, TokenError>;

    /// Mark token `id` used and inactive if it is still active.
    ///
    /// Returns `false` when another caller got there first.
    async fn mark_used(&self, id: Uuid) -> Result<bool, TokenError>;

    /// Deactivate the pair's active tokens and insert `token` as one
    /// atomic step; returns how many were deactivated.
    async fn replace_active(&self, token: &Token) -> Result<u64, TokenError>;
}
