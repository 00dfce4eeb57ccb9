//! Track metadata models.
//!
//! `MetadataRecord` is the normalized shape every provider extractor
//! returns. It is transient: the caller keeps it in session state between
//! link submission and track creation.

use serde::{Deserialize, Serialize};

/// Kind of playlist entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackType {
    #[default]
    Track,
    Mix,
    Sample,
}

impl TrackType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackType::Track => "track",
            TrackType::Mix => "mix",
            TrackType::Sample => "sample",
        }
    }
}

impl std::fmt::Display for TrackType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TrackType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "track" => Ok(TrackType::Track),
            "mix" => Ok(TrackType::Mix),
            "sample" => Ok(TrackType::Sample),
            other => Err(format!("unknown track type: {other}")),
        }
    }
}

/// Platform tag stamped on a streaming link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamingPlatform {
    Youtube,
    YoutubeMusic,
    Bandcamp,
}

impl StreamingPlatform {
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamingPlatform::Youtube => "youtube",
            StreamingPlatform::YoutubeMusic => "youtube_music",
            StreamingPlatform::Bandcamp => "bandcamp",
        }
    }
}

impl std::fmt::Display for StreamingPlatform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized track metadata.
///
/// Optional fields are `None` when the provider did not supply them;
/// free-text fields the providers never fill are empty strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataRecord {
    pub track_type: TrackType,
    pub track_name: Option<String>,
    pub artist: Option<String>,
    pub album_name: Option<String>,
    pub purchase_link: String,
    pub mix_page: String,
    pub record_label: String,
    pub genre: String,
    pub streaming_platform: StreamingPlatform,
    pub streaming_link: String,
    /// Provider-side description (YouTube only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl MetadataRecord {
    /// Empty record for `platform`, with every free-text field blank.
    pub fn empty(platform: StreamingPlatform) -> Self {
        Self {
            track_type: TrackType::Track,
            track_name: None,
            artist: None,
            album_name: None,
            purchase_link: String::new(),
            mix_page: String::new(),
            record_label: String::new(),
            genre: String::new(),
            streaming_platform: platform,
            streaming_link: String::new(),
            description: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn track_type_parses_case_insensitively() {
        assert_eq!(" Mix ".parse::<TrackType>().unwrap(), TrackType::Mix);
        assert_eq!("TRACK".parse::<TrackType>().unwrap(), TrackType::Track);
        assert!("album".parse::<TrackType>().is_err());
    }

    #[test]
    fn record_serializes_with_snake_case_tags() {
        let mut record = MetadataRecord::empty(StreamingPlatform::YoutubeMusic);
        record.track_name = Some("Heroin".into());
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["streaming_platform"], "youtube_music");
        assert_eq!(json["track_type"], "track");
        assert_eq!(json["track_name"], "Heroin");
        assert_eq!(json["genre"], "");
        assert!(json.get("description").is_none());
    }
}
