//! PostgreSQL-backed user directory.

use async_trait::async_trait;
use sqlx::PgPool;

use super::password::{hash_password, validate_password};
use super::{User, UserDirectory, UserError};

#[derive(Debug, Clone)]
pub struct PgUserDirectory {
    pool: PgPool,
}

impl PgUserDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

type UserRow = (String, String, String, bool);

fn to_user((id, email, username, email_verified): UserRow) -> User {
    User {
        id,
        email,
        username,
        email_verified,
    }
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn find_by_id(&self, user_id: &str) -> Result<Option<User>, UserError> {
        // Ids that are not UUIDs cannot exist.
        if uuid::Uuid::parse_str(user_id).is_err() {
            return Ok(None);
        }
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id::text, email, username, email_verified FROM users WHERE id = $1::uuid",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(to_user))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id::text, email, username, email_verified FROM users \
             WHERE lower(email) = lower($1)",
        )
        .bind(email.trim())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(to_user))
    }

    async fn mark_email_verified(&self, user_id: &str) -> Result<(), UserError> {
        let result = sqlx::query("UPDATE users SET email_verified = true WHERE id = $1::uuid")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(UserError::NotFound(user_id.to_string()));
        }
        Ok(())
    }

    async fn set_password(&self, user_id: &str, new_password: &str) -> Result<(), UserError> {
        validate_password(new_password)?;
        let hash = hash_password(new_password)?;
        let result = sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1::uuid")
            .bind(user_id)
            .bind(&hash)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(UserError::NotFound(user_id.to_string()));
        }
        Ok(())
    }
}
