//! Streaming-link metadata pipeline.
//!
//! A submitted URL is classified by [`platform::detect`], routed by the
//! [`orchestrator::MetadataOrchestrator`] to the matching provider
//! extractor, and normalized into a [`MetadataRecord`].
//!
//! # Providers
//!
//! - YouTube / YouTube Music: YouTube Data API v3 (`videos.list`)
//! - Bandcamp: JSON-LD from the plain page, or a DOM scrape of a
//!   browser-rendered page

pub mod bandcamp;
pub mod orchestrator;
pub mod platform;
pub mod youtube;

use thiserror::Error;

use crate::error::{BoxError, ErrorKind};

pub use crate::models::metadata::{MetadataRecord, StreamingPlatform, TrackType};

/// Errors raised by the metadata pipeline.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unsupported platform for streaming_url: {0}")]
    UnsupportedPlatform(String),

    #[error("YouTube metadata error: {message}")]
    YouTube {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error("Bandcamp metadata error: {message}")]
    Bandcamp {
        message: String,
        #[source]
        source: Option<BoxError>,
    },
}

impl MetadataError {
    pub fn youtube(message: impl Into<String>) -> Self {
        MetadataError::YouTube {
            message: message.into(),
            source: None,
        }
    }

    pub fn youtube_with<E>(message: impl Into<String>, cause: E) -> Self
    where
        E: Into<BoxError>,
    {
        MetadataError::YouTube {
            message: message.into(),
            source: Some(cause.into()),
        }
    }

    pub fn bandcamp(message: impl Into<String>) -> Self {
        MetadataError::Bandcamp {
            message: message.into(),
            source: None,
        }
    }

    pub fn bandcamp_with<E>(message: impl Into<String>, cause: E) -> Self
    where
        E: Into<BoxError>,
    {
        MetadataError::Bandcamp {
            message: message.into(),
            source: Some(cause.into()),
        }
    }

    /// Coarse category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            MetadataError::InvalidInput(_) | MetadataError::UnsupportedPlatform(_) => {
                ErrorKind::Input
            }
            MetadataError::YouTube { .. } => ErrorKind::YouTube,
            MetadataError::Bandcamp { .. } => ErrorKind::Bandcamp,
        }
    }
}

/// Reject empty (or whitespace-only) string inputs before any I/O.
pub(crate) fn require_non_empty<'a>(value: &'a str, name: &str) -> Result<&'a str, MetadataError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        tracing::error!(field = name, "input is empty");
        return Err(MetadataError::InvalidInput(format!(
            "{name} cannot be None or empty"
        )));
    }
    Ok(trimmed)
}
