//! PostgreSQL token store (`one_time_tokens`).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use tracing::warn;
use uuid::Uuid;

use super::{Token, TokenError, TokenPurpose, TokenStore};

type TokenRow = (
    Uuid,
    Uuid,
    String,
    String,
    DateTime<Utc>,
    DateTime<Utc>,
    bool,
    bool,
);

const SELECT_COLUMNS: &str = "SELECT id, token, user_id::text, purpose, created_at, expires_at, \
     is_used, is_active FROM one_time_tokens";

fn to_token(row: TokenRow) -> Option<Token> {
    let (id, token, user_id, purpose, created_at, expires_at, used, active) = row;
    let Some(purpose) = TokenPurpose::from_db(&purpose) else {
        warn!(%id, purpose, "skipping token row with unknown purpose");
        return None;
    };
    Some(Token {
        id,
        token,
        user_id,
        purpose,
        created_at,
        expires_at,
        used,
        active,
    })
}

#[derive(Debug, Clone)]
pub struct PgTokenStore {
    pool: PgPool,
}

impl PgTokenStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Ids that are not UUIDs own no tokens.
fn is_user_uuid(user_id: &str) -> bool {
    Uuid::parse_str(user_id).is_ok()
}

async fn insert_in(conn: &mut PgConnection, token: &Token) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO one_time_tokens \
         (id, token, user_id, purpose, created_at, expires_at, is_used, is_active) \
         VALUES ($1, $2, $3::uuid, $4, $5, $6, $7, $8)",
    )
    .bind(token.id)
    .bind(token.token)
    .bind(&token.user_id)
    .bind(token.purpose.as_str())
    .bind(token.created_at)
    .bind(token.expires_at)
    .bind(token.used)
    .bind(token.active)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn deactivate_in(
    conn: &mut PgConnection,
    user_id: &str,
    purpose: TokenPurpose,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE one_time_tokens SET is_active = false \
         WHERE user_id = $1::uuid AND purpose = $2 AND is_active AND NOT is_used",
    )
    .bind(user_id)
    .bind(purpose.as_str())
    .execute(&mut *conn)
    .await?;
    Ok(result.rows_affected())
}

#[async_trait]
impl TokenStore for PgTokenStore {
    async fn insert(&self, token: &Token) -> Result<(), TokenError> {
        let mut conn = self.pool.acquire().await?;
        insert_in(&mut conn, token).await?;
        Ok(())
    }

    async fn find_active(
        &self,
        user_id: &str,
        purpose: TokenPurpose,
    ) -> Result<Vec<Token>, TokenError> {
        if !is_user_uuid(user_id) {
            return Ok(Vec::new());
        }
        let rows = sqlx::query_as::<_, TokenRow>(&format!(
            "{SELECT_COLUMNS} WHERE user_id = $1::uuid AND purpose = $2 \
             AND is_active AND NOT is_used ORDER BY created_at, id"
        ))
        .bind(user_id)
        .bind(purpose.as_str())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().filter_map(to_token).collect())
    }

    async fn find_by_value(
        &self,
        value: Uuid,
        user_id: &str,
        purpose: TokenPurpose,
    ) -> Result<Vec<Token>, TokenError> {
        if !is_user_uuid(user_id) {
            return Ok(Vec::new());
        }
        let rows = sqlx::query_as::<_, TokenRow>(&format!(
            "{SELECT_COLUMNS} WHERE token = $1 AND user_id = $2::uuid AND purpose = $3 \
             AND is_active AND NOT is_used ORDER BY created_at, id"
        ))
        .bind(value)
        .bind(user_id)
        .bind(purpose.as_str())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().filter_map(to_token).collect())
    }

    async fn deactivate_active(
        &self,
        user_id: &str,
        purpose: TokenPurpose,
    ) -> Result<u64, TokenError> {
        if !is_user_uuid(user_id) {
            return Ok(0);
        }
        let mut conn = self.pool.acquire().await?;
        Ok(deactivate_in(&mut conn, user_id, purpose).await?)
    }

    async fn mark_used(&self, id: Uuid) -> Result<bool, TokenError> {
        let result = sqlx::query(
            "UPDATE one_time_tokens SET is_used = true, is_active = false \
             WHERE id = $1 AND is_active AND NOT is_used",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn replace_active(&self, token: &Token) -> Result<u64, TokenError> {
        let mut tx = self.pool.begin().await?;
        // Serializes concurrent reissues for the same user.
        sqlx::query("SELECT 1 FROM users WHERE id = $1::uuid FOR UPDATE")
            .bind(&token.user_id)
            .execute(&mut *tx)
            .await?;
        let count = deactivate_in(&mut tx, &token.user_id, token.purpose).await?;
        insert_in(&mut tx, token).await?;
        tx.commit().await?;
        Ok(count)
    }
}
