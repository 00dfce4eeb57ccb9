//! One-time token lifecycle.
//!
//! Tokens are single-use, scoped to one user and one [`TokenPurpose`], and
//! expire an hour after issue. The [`TokenManager`] owns the lifecycle
//! rules; a [`TokenStore`] owns persistence.

pub mod manager;
pub mod memory;
pub mod pg;
pub mod store;

use thiserror::Error;

use crate::error::ErrorKind;
use crate::users::UserError;

pub use crate::models::auth::{Token, TokenPurpose, TokenState};
pub use manager::TokenManager;
pub use memory::MemoryTokenStore;
pub use pg::PgTokenStore;
pub use store::TokenStore;

/// Seconds between issue and expiry.
pub const TOKEN_LIFETIME_SECS: i64 = 60 * 60;

/// Token lifecycle errors.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("No redeemable token found")]
    TokenNotFound,

    #[error("Database error: {0}")]
    DbError(#[from] sqlx::Error),

    #[error(transparent)]
    Users(UserError),
}

impl From<UserError> for TokenError {
    fn from(e: UserError) -> Self {
        match e {
            UserError::NotFound(id) => TokenError::UserNotFound(id),
            other => TokenError::Users(other),
        }
    }
}

impl TokenError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TokenError::InvalidInput(_) => ErrorKind::Input,
            TokenError::UserNotFound(_) | TokenError::TokenNotFound => ErrorKind::NotFound,
            TokenError::DbError(_) => ErrorKind::Storage,
            TokenError::Users(e) => e.kind(),
        }
    }
}
