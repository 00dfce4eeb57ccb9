//! Outgoing mail seam.
//!
//! Transport is external; the bundled [`LogMailer`] writes messages to the
//! log instead of sending them.

use async_trait::async_trait;
use serde_json::json;
use thiserror::Error;
use tracing::{error, info};

use crate::audit::{AuditAction, AuditEvent, AuditSink};
use crate::error::ErrorKind;

/// Mail errors.
#[derive(Debug, Error)]
pub enum MailError {
    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    #[error("Mail transport failed: {0}")]
    Transport(String),
}

impl MailError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MailError::InvalidMessage(_) => ErrorKind::Input,
            MailError::Transport(_) => ErrorKind::Transport,
        }
    }
}

/// A rendered message ready to hand to a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError>;
}

/// Console transport: logs each message at `info`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
        if email.to.is_empty() {
            return Err(MailError::InvalidMessage("no recipients".into()));
        }
        info!(
            from = %email.from,
            to = ?email.to,
            subject = %email.subject,
            "\n{}",
            email.body
        );
        Ok(())
    }
}

/// Send `email` once per recipient, then record `log_text` for `user_id`.
///
/// The first transport failure aborts the remaining sends and no audit
/// event is written.
pub async fn send_and_log(
    mailer: &dyn Mailer,
    audit: &dyn AuditSink,
    user_id: &str,
    email: &OutgoingEmail,
    log_text: &str,
) -> Result<(), MailError> {
    if email.to.is_empty() {
        return Err(MailError::InvalidMessage("no recipients".into()));
    }
    for recipient in &email.to {
        let single = OutgoingEmail {
            to: vec![recipient.clone()],
            ..email.clone()
        };
        if let Err(e) = mailer.send(&single).await {
            error!(user_id, recipient = %recipient, error = %e, "failed to send email");
            return Err(e);
        }
    }

    audit
        .record(AuditEvent::new(
            user_id,
            AuditAction::EmailSent,
            json!({ "subject": email.subject, "recipients": email.to.len(), "log": log_text }),
        ))
        .await;
    Ok(())
}
