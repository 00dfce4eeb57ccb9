//! User lookups needed by the token flows.
//!
//! Registration, login and sessions live outside this crate; the token
//! lifecycle only needs to find a user and flip a couple of columns.

pub mod memory;
pub mod password;
pub mod pg;

use async_trait::async_trait;
use thiserror::Error;

use crate::error::ErrorKind;
pub use crate::models::auth::User;

/// User directory errors.
#[derive(Debug, Error)]
pub enum UserError {
    #[error("User not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DbError(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl UserError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            UserError::NotFound(_) => ErrorKind::NotFound,
            UserError::ValidationError(_) => ErrorKind::Input,
            UserError::DbError(_) | UserError::Internal(_) => ErrorKind::Storage,
        }
    }
}

/// Read/write access to the user records the token flows touch.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_by_id(&self, user_id: &str) -> Result<Option<User>, UserError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserError>;

    /// Flag the user's email address as confirmed.
    async fn mark_email_verified(&self, user_id: &str) -> Result<(), UserError>;

    /// Replace the user's password.
    async fn set_password(&self, user_id: &str, new_password: &str) -> Result<(), UserError>;
}
