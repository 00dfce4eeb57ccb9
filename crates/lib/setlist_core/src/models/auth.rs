//! Authentication domain models.
//!
//! Users as seen by the token lifecycle, and the one-time tokens
//! themselves. Tokens are never deleted; a spent token stays in the table
//! as an audit trail.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Domain user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub username: String,
    pub email_verified: bool,
}

/// What a one-time token may be redeemed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenPurpose {
    /// Confirm ownership of the registration email address.
    #[serde(rename = "AUTH")]
    AuthenticateEmail,
    /// Set a new password without knowing the old one.
    #[serde(rename = "RESET_PASSWORD")]
    ResetPassword,
    /// Join another user's playlist as a collaborator.
    #[serde(rename = "COLLAB_PLAYLIST")]
    CollabPlaylistInvite,
}

impl TokenPurpose {
    /// Database text representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenPurpose::AuthenticateEmail => "AUTH",
            TokenPurpose::ResetPassword => "RESET_PASSWORD",
            TokenPurpose::CollabPlaylistInvite => "COLLAB_PLAYLIST",
        }
    }

    /// Parse the database text representation.
    pub fn from_db(value: &str) -> Option<Self> {
        match value {
            "AUTH" => Some(TokenPurpose::AuthenticateEmail),
            "RESET_PASSWORD" => Some(TokenPurpose::ResetPassword),
            "COLLAB_PLAYLIST" => Some(TokenPurpose::CollabPlaylistInvite),
            _ => None,
        }
    }
}

impl std::fmt::Display for TokenPurpose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TokenPurpose {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auth" | "authenticate-email" | "authenticate_email" => {
                Ok(TokenPurpose::AuthenticateEmail)
            }
            "reset_password" | "reset-password" => Ok(TokenPurpose::ResetPassword),
            "collab_playlist" | "collab-playlist" | "collab_playlist_invite" => {
                Ok(TokenPurpose::CollabPlaylistInvite)
            }
            other => Err(format!("unknown token purpose: {other}")),
        }
    }
}

/// Lifecycle state derived from the `used` / `active` flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenState {
    ActiveUnused,
    UsedInactive,
    InactiveUnused,
}

/// One-time token row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Row id (UUIDv7).
    pub id: Uuid,
    /// Opaque value embedded in links (random UUIDv4).
    pub token: Uuid,
    pub user_id: String,
    pub purpose: TokenPurpose,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub used: bool,
    pub active: bool,
}

impl Token {
    /// Current lifecycle state.
    ///
    /// A used token is always inactive, so `used && active` is folded
    /// into `UsedInactive`.
    pub fn state(&self) -> TokenState {
        match (self.used, self.active) {
            (false, true) => TokenState::ActiveUnused,
            (true, _) => TokenState::UsedInactive,
            (false, false) => TokenState::InactiveUnused,
        }
    }

    /// Whether the token can still be redeemed at `now`.
    pub fn is_redeemable_at(&self, now: DateTime<Utc>) -> bool {
        !self.used && self.active && now < self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn token(used: bool, active: bool, expires_in: Duration) -> Token {
        let now = Utc::now();
        Token {
            id: Uuid::now_v7(),
            token: Uuid::new_v4(),
            user_id: "u1".into(),
            purpose: TokenPurpose::ResetPassword,
            created_at: now,
            expires_at: now + expires_in,
            used,
            active,
        }
    }

    #[test]
    fn purpose_round_trips_through_db_text() {
        for purpose in [
            TokenPurpose::AuthenticateEmail,
            TokenPurpose::ResetPassword,
            TokenPurpose::CollabPlaylistInvite,
        ] {
            assert_eq!(TokenPurpose::from_db(purpose.as_str()), Some(purpose));
        }
        assert_eq!(TokenPurpose::from_db("nope"), None);
    }

    #[test]
    fn purpose_parses_cli_spellings() {
        assert_eq!(
            "reset-password".parse::<TokenPurpose>().unwrap(),
            TokenPurpose::ResetPassword
        );
        assert_eq!(
            "AUTH".parse::<TokenPurpose>().unwrap(),
            TokenPurpose::AuthenticateEmail
        );
        assert!("bogus".parse::<TokenPurpose>().is_err());
    }

    #[test]
    fn state_follows_flags() {
        assert_eq!(
            token(false, true, Duration::hours(1)).state(),
            TokenState::ActiveUnused
        );
        assert_eq!(
            token(true, false, Duration::hours(1)).state(),
            TokenState::UsedInactive
        );
        assert_eq!(
            token(false, false, Duration::hours(1)).state(),
            TokenState::InactiveUnused
        );
    }

    #[test]
    fn redeemable_requires_unused_active_and_unexpired() {
        let now = Utc::now();
        assert!(token(false, true, Duration::hours(1)).is_redeemable_at(now));
        assert!(!token(true, false, Duration::hours(1)).is_redeemable_at(now));
        assert!(!token(false, false, Duration::hours(1)).is_redeemable_at(now));
        assert!(!token(false, true, Duration::seconds(-1)).is_redeemable_at(now));
    }
}
