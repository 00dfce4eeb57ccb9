//! Error classification shared by the token and metadata modules.
//!
//! Each module keeps its own `thiserror` enum; `ErrorKind` is the flat
//! tag callers switch on when deciding whether to fall back to manual
//! entry, report bad input, or surface a 404.

/// Boxed cause carried by provider errors.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Coarse error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed or missing input; raised before any I/O.
    Input,
    /// YouTube metadata could not be fetched.
    YouTube,
    /// Bandcamp metadata could not be fetched.
    Bandcamp,
    /// The referenced user or token does not exist.
    NotFound,
    /// The backing store failed.
    Storage,
    /// The mail transport failed.
    Transport,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Input => "input",
            ErrorKind::YouTube => "youtube",
            ErrorKind::Bandcamp => "bandcamp",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Storage => "storage",
            ErrorKind::Transport => "transport",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
