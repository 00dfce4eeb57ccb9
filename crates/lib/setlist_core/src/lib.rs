//! # setlist_core
//!
//! Core domain logic for Setlist: the one-time token lifecycle behind
//! email verification, password reset and playlist invites, and the
//! metadata pipeline that turns a YouTube or Bandcamp link into a track
//! record.

pub mod audit;
pub mod config;
pub mod db;
pub mod error;
pub mod flows;
pub mod mail;
pub mod metadata;
pub mod models;
pub mod tokens;
pub mod users;
pub mod uuid;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
