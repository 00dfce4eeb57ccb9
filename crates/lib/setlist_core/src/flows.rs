//! Token-by-email account flows.
//!
//! Each flow supersedes any outstanding token for its purpose, mails a
//! link embedding the new one, and later redeems it. Mail failure never
//! fails a flow; the outcome reports whether the message went out.

use std::sync::Arc;

use tracing::{debug, error, info};
use uuid::Uuid;

use crate::audit::AuditSink;
use crate::mail::{Mailer, OutgoingEmail, send_and_log};
use crate::tokens::{Token, TokenError, TokenManager, TokenPurpose};
use crate::users::password::validate_password;
use crate::users::{User, UserDirectory};

/// Result of a flow that sends a link.
#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    pub token: Token,
    pub link: String,
    pub delivered: bool,
}

pub struct AccountFlows {
    tokens: TokenManager,
    users: Arc<dyn UserDirectory>,
    mailer: Arc<dyn Mailer>,
    audit: Arc<dyn AuditSink>,
    base_url: String,
    email_from: String,
}

impl AccountFlows {
    pub fn new(
        tokens: TokenManager,
        users: Arc<dyn UserDirectory>,
        mailer: Arc<dyn Mailer>,
        audit: Arc<dyn AuditSink>,
        base_url: impl Into<String>,
        email_from: impl Into<String>,
    ) -> Self {
        Self {
            tokens,
            users,
            mailer,
            audit,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            email_from: email_from.into(),
        }
    }

    /// Mail a fresh email-verification link to `user_id`.
    pub async fn send_email_verification(
        &self,
        user_id: &str,
    ) -> Result<DispatchOutcome, TokenError> {
        let user = self.user(user_id).await?;
        let token = self
            .tokens
            .reissue(&user.id, TokenPurpose::AuthenticateEmail)
            .await?;
        let link = format!("{}/auth/verify/{}/{}", self.base_url, user.id, token.token);
        let body = format!(
            "Hi {},\n\nConfirm your email address by opening the link below:\n\n{link}\n\n\
             The link expires in one hour.\n",
            user.username
        );
        self.dispatch(
            &user,
            token,
            link,
            "Email verification",
            body,
            "Sending authentication email.",
        )
        .await
    }

    /// Redeem a verification token and mark the address confirmed.
    pub async fn verify_email(&self, user_id: &str, token: &str) -> Result<Token, TokenError> {
        let value = parse_token(token)?;
        let spent = self
            .tokens
            .redeem(value, user_id, TokenPurpose::AuthenticateEmail)
            .await?;
        self.users.mark_email_verified(user_id).await?;
        info!(user_id, "email verified");
        Ok(spent)
    }

    /// Mail a password-reset link to the owner of `email`.
    pub async fn request_password_reset(&self, email: &str) -> Result<DispatchOutcome, TokenError> {
        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or_else(|| TokenError::UserNotFound(email.trim().to_string()))?;
        let token = self
            .tokens
            .reissue(&user.id, TokenPurpose::ResetPassword)
            .await?;
        let link = format!(
            "{}/auth/reset-password/{}/{}",
            self.base_url, user.id, token.token
        );
        let body = format!(
            "Hi {},\n\nSomeone asked to reset your password. If it was you, open:\n\n{link}\n\n\
             The link expires in one hour. Otherwise ignore this email.\n",
            user.username
        );
        self.dispatch(&user, token, link, "Reset password", body, "Sending reset password email.")
            .await
    }

    /// Redeem a reset token and set `new_password`.
    ///
    /// The password is validated first so a rejected password does not
    /// spend the token.
    pub async fn reset_password(
        &self,
        user_id: &str,
        token: &str,
        new_password: &str,
    ) -> Result<Token, TokenError> {
        validate_password(new_password)?;
        let value = parse_token(token)?;
        let spent = self
            .tokens
            .redeem(value, user_id, TokenPurpose::ResetPassword)
            .await?;
        self.users.set_password(user_id, new_password).await?;
        info!(user_id, "password reset");
        Ok(spent)
    }

    /// Mail `invitee_id` a link to join the playlist `playlist_slug`.
    pub async fn invite_collaborator(
        &self,
        invitee_id: &str,
        playlist_slug: &str,
        inviter_name: &str,
    ) -> Result<DispatchOutcome, TokenError> {
        let slug = playlist_slug.trim();
        if slug.is_empty() {
            return Err(TokenError::InvalidInput("playlist_slug cannot be empty".into()));
        }
        let user = self.user(invitee_id).await?;
        let token = self
            .tokens
            .reissue(&user.id, TokenPurpose::CollabPlaylistInvite)
            .await?;
        let link = format!(
            "{}/playlists/{slug}/join/{}/{}",
            self.base_url, user.id, token.token
        );
        let body = format!(
            "Hi {},\n\n{inviter_name} invited you to collaborate on a playlist. Join here:\n\n\
             {link}\n\nThe link expires in one hour.\n",
            user.username
        );
        self.dispatch(
            &user,
            token,
            link,
            "Playlist invitation",
            body,
            "Sending collaboration invite email.",
        )
        .await
    }

    /// Redeem a collaboration invite.
    pub async fn accept_invitation(
        &self,
        invitee_id: &str,
        token: &str,
    ) -> Result<Token, TokenError> {
        let value = parse_token(token)?;
        self.tokens
            .redeem(value, invitee_id, TokenPurpose::CollabPlaylistInvite)
            .await
    }

    async fn user(&self, user_id: &str) -> Result<User, TokenError> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| TokenError::UserNotFound(user_id.to_string()))
    }

    async fn dispatch(
        &self,
        user: &User,
        token: Token,
        link: String,
        subject: &str,
        body: String,
        log_text: &str,
    ) -> Result<DispatchOutcome, TokenError> {
        let email = OutgoingEmail {
            from: self.email_from.clone(),
            to: vec![user.email.clone()],
            subject: subject.to_string(),
            body,
        };
        let delivered = match send_and_log(
            self.mailer.as_ref(),
            self.audit.as_ref(),
            &user.id,
            &email,
            log_text,
        )
        .await
        {
            Ok(()) => true,
            Err(e) => {
                error!(user_id = %user.id, subject, "Email failed: {e}");
                false
            }
        };
        Ok(DispatchOutcome {
            token,
            link,
            delivered,
        })
    }
}

/// Token values arrive as text from links; malformed ones match nothing.
fn parse_token(token: &str) -> Result<Uuid, TokenError> {
    Uuid::parse_str(token.trim()).map_err(|e| {
        debug!(error = %e, "malformed token value");
        TokenError::TokenNotFound
    })
}
