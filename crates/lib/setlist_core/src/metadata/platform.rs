//! Platform detection for submitted streaming links.

use url::Url;

/// Metadata provider a URL belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    YouTube,
    Bandcamp,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::YouTube => "youtube",
            Platform::Bandcamp => "bandcamp",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Allowed domain suffixes per platform, checked in order.
const PLATFORM_DOMAINS: &[(Platform, &[&str])] = &[
    (
        Platform::YouTube,
        &["youtube.com", "youtu.be", "music.youtube.com", "m.youtube.com"],
    ),
    (Platform::Bandcamp, &["bandcamp.com"]),
];

/// Lower-cased hostname of `url`, if it parses and has one.
pub(crate) fn hostname(url: &str) -> Option<String> {
    let parsed = Url::parse(url.trim()).ok()?;
    parsed.host_str().map(|h| h.to_ascii_lowercase())
}

/// Classify `url` by hostname.
///
/// Unparseable URLs and unknown hosts yield `None`.
pub fn detect(url: &str) -> Option<Platform> {
    let host = hostname(url)?;
    PLATFORM_DOMAINS
        .iter()
        .find(|(_, domains)| {
            domains
                .iter()
                .any(|domain| host == *domain || host.ends_with(&format!(".{domain}")))
        })
        .map(|(platform, _)| *platform)
}
