//! Domain models shared across the core modules.

pub mod auth;
pub mod metadata;
