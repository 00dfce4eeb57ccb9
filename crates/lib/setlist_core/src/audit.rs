//! Audit trail for token and mail activity.
//!
//! Recording is fire-and-forget: a sink that cannot persist an event logs
//! a warning and the calling operation carries on.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::uuid::uuidv7;

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    TokenIssued,
    TokenDeactivated,
    TokenRedeemed,
    EmailSent,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::TokenIssued => "token_issued",
            AuditAction::TokenDeactivated => "token_deactivated",
            AuditAction::TokenRedeemed => "token_redeemed",
            AuditAction::EmailSent => "email_sent",
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single audit entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub user_id: String,
    pub action: AuditAction,
    pub detail: serde_json::Value,
    pub at: DateTime<Utc>,
}

impl AuditEvent {
    pub fn new(user_id: impl Into<String>, action: AuditAction, detail: serde_json::Value) -> Self {
        Self {
            user_id: user_id.into(),
            action,
            detail,
            at: Utc::now(),
        }
    }
}

/// Destination for audit events.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, event: AuditEvent);
}

/// Writes events to the `app_logs` table.
#[derive(Debug, Clone)]
pub struct PgAuditSink {
    pool: PgPool,
}

impl PgAuditSink {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditSink for PgAuditSink {
    async fn record(&self, event: AuditEvent) {
        let result = sqlx::query(
            r#"
            INSERT INTO app_logs (id, user_id, action, detail, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(uuidv7())
        .bind(&event.user_id)
        .bind(event.action.as_str())
        .bind(&event.detail)
        .bind(event.at)
        .execute(&self.pool)
        .await;

        if let Err(e) = result {
            warn!(
                action = %event.action,
                user_id = %event.user_id,
                "Failed to record audit log: {e}"
            );
        }
    }
}

/// Emits events as `info` log lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn record(&self, event: AuditEvent) {
        info!(
            target: "setlist::audit",
            action = %event.action,
            user_id = %event.user_id,
            detail = %event.detail,
            "audit"
        );
    }
}

/// Forwards events into a channel; tests read them back from the receiver.
#[derive(Debug, Clone)]
pub struct ChannelAuditSink {
    tx: mpsc::UnboundedSender<AuditEvent>,
}

impl ChannelAuditSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<AuditEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl AuditSink for ChannelAuditSink {
    async fn record(&self, event: AuditEvent) {
        if self.tx.send(event).is_err() {
            warn!("audit channel closed, dropping event");
        }
    }
}
