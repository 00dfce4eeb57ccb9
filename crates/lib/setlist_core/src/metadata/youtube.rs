//! YouTube metadata extractor.
//!
//! Resolves a video id from the common URL shapes, looks the video up via
//! the YouTube Data API v3 (`videos.list`, `part=snippet`) and maps the
//! snippet into a [`MetadataRecord`].

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, error, info};
use url::Url;

use super::platform::hostname;
use super::{MetadataError, MetadataRecord, StreamingPlatform, TrackType};

/// Public Data API base URL.
pub const DEFAULT_API_BASE: &str = "https://www.googleapis.com/youtube/v3";

/// Hosts that carry the id in the `v` query parameter.
const WATCH_HOSTS: &[&str] = &["www.youtube.com", "youtube.com", "music.youtube.com"];

/// Separators tried, in order, when deriving an artist from a channel title.
const CHANNEL_TITLE_SEPARATORS: &[&str] = &[" - ", " | ", "•", "-"];

static VIDEO_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_-]{11}$").expect("video id pattern is a valid regex")
});

fn is_video_id(candidate: &str) -> bool {
    VIDEO_ID_RE.is_match(candidate)
}

/// Extract an 11-character video id from a YouTube URL.
///
/// Returns `None` for unsupported hosts and for ids that do not match the
/// expected shape.
pub fn extract_video_id(url: &str) -> Option<String> {
    let parsed = match Url::parse(url.trim()) {
        Ok(parsed) => parsed,
        Err(e) => {
            debug!(url, error = %e, "failed to parse URL");
            return None;
        }
    };
    let host = parsed.host_str().unwrap_or_default().to_ascii_lowercase();

    if WATCH_HOSTS.contains(&host.as_str()) {
        let v = parsed
            .query_pairs()
            .find(|(key, _)| key == "v")
            .map(|(_, value)| value.into_owned());
        return match v {
            Some(v) if is_video_id(&v) => Some(v),
            Some(_) => {
                debug!(url, "malformed 'v' param");
                None
            }
            None => {
                debug!(url, "watch URL without 'v' param");
                None
            }
        };
    }

    if host == "youtu.be" {
        let path = parsed.path().trim_start_matches('/');
        if is_video_id(path) {
            return Some(path.to_string());
        }
        debug!(url, "youtu.be URL did not contain a valid id");
        return None;
    }

    if let Some((_, rest)) = parsed.path().rsplit_once("/embed/") {
        let candidate = rest.split('/').next().unwrap_or_default();
        if is_video_id(candidate) {
            return Some(candidate.to_string());
        }
    }

    debug!(url, host, "no video id found");
    None
}

/// Sub-classify a YouTube URL as `youtube_music` or `youtube`.
pub fn platform_of(url: &str) -> StreamingPlatform {
    match hostname(url) {
        Some(host) if host.contains("music.youtube.com") => StreamingPlatform::YoutubeMusic,
        _ => StreamingPlatform::Youtube,
    }
}

/// Derive an artist name from a channel title such as `"Artist - Topic"`.
pub fn artist_from_channel_title(channel_title: &str) -> Option<String> {
    for sep in CHANNEL_TITLE_SEPARATORS {
        if let Some((left, _)) = channel_title.split_once(sep) {
            let artist = left.trim();
            if !artist.is_empty() {
                return Some(artist.to_string());
            }
        }
    }
    let whole = channel_title.trim();
    (!whole.is_empty()).then(|| whole.to_string())
}

#[derive(Debug, Deserialize)]
struct VideoListResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
struct VideoItem {
    snippet: VideoSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoSnippet {
    title: Option<String>,
    channel_title: Option<String>,
    description: Option<String>,
}

/// YouTube Data API client.
#[derive(Debug, Clone)]
pub struct YouTubeExtractor {
    client: Client,
    api_key: Option<String>,
    api_base: String,
}

impl YouTubeExtractor {
    /// Build an extractor with its own HTTP client.
    pub fn new(
        api_key: Option<String>,
        api_base: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, MetadataError> {
        let client = Client::builder().timeout(timeout).build().map_err(|e| {
            error!(error = %e, "failed to build YouTube client");
            MetadataError::youtube_with("Failed to initialize YouTube client", e)
        })?;
        Ok(Self::with_client(client, api_key, api_base))
    }

    /// Build an extractor around an existing HTTP client.
    pub fn with_client(
        client: Client,
        api_key: Option<String>,
        api_base: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            api_base: api_base.into().trim_end_matches('/').to_string(),
        }
    }

    /// Look up `video_id` and map its snippet.
    ///
    /// The returned record carries provider fields only; `track_type`,
    /// `streaming_platform` and `streaming_link` are stamped by
    /// [`YouTubeExtractor::extract`].
    pub async fn fetch_metadata(&self, video_id: &str) -> Result<MetadataRecord, MetadataError> {
        super::require_non_empty(video_id, "video_id")?;
        if !is_video_id(video_id) {
            return Err(MetadataError::youtube(format!(
                "video_id does not look valid: {video_id}"
            )));
        }
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            MetadataError::youtube(
                "Failed to initialize YouTube client: YOUTUBE_API_KEY is not set",
            )
        })?;

        let resp = self
            .client
            .get(format!("{}/videos", self.api_base))
            .query(&[("part", "snippet"), ("id", video_id), ("key", api_key)])
            .send()
            .await
            .map_err(|e| {
                // The request URL carries the API key.
                let e = e.without_url();
                error!(video_id, error = %e, "YouTube API request failed");
                MetadataError::youtube_with("Unexpected error calling YouTube API", e)
            })?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            error!(video_id, %status, "YouTube API returned an error");
            return Err(MetadataError::youtube(format!(
                "YouTube API error: HTTP {status}: {body}"
            )));
        }

        let data: VideoListResponse = resp.json().await.map_err(|e| {
            MetadataError::youtube_with("YouTube response parse error", e.without_url())
        })?;

        let Some(item) = data.items.into_iter().next() else {
            debug!(video_id, "YouTube returned no items");
            return Err(MetadataError::youtube(format!(
                "No video found for id={video_id}"
            )));
        };
        let snippet = item.snippet;

        let mut record = MetadataRecord::empty(StreamingPlatform::Youtube);
        record.track_name = snippet.title;
        record.artist = snippet
            .channel_title
            .as_deref()
            .and_then(artist_from_channel_title);
        record.description = snippet.description;
        record.album_name = Some(String::new());
        Ok(record)
    }

    /// Resolve `url` to a video, fetch it, and stamp the link details.
    pub async fn extract(
        &self,
        url: &str,
        track_type: TrackType,
    ) -> Result<MetadataRecord, MetadataError> {
        let url = super::require_non_empty(url, "youtube_url")?;
        let video_id = extract_video_id(url).ok_or_else(|| {
            MetadataError::InvalidInput(
                "Could not extract a valid YouTube video id from the URL".to_string(),
            )
        })?;

        let mut record = self.fetch_metadata(&video_id).await?;
        record.streaming_platform = platform_of(url);
        record.track_type = track_type;
        record.streaming_link = url.to_string();
        info!(video_id, platform = %record.streaming_platform, "fetched YouTube metadata");
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use mockito::Matcher;

    use super::*;
    use crate::error::ErrorKind;

    const SNIPPET_BODY: &str = r#"{
        "items": [
            {
                "snippet": {
                    "title": "If I Had A Gun…",
                    "channelTitle": "Noel Gallagher - Topic",
                    "description": "A sample description"
                }
            }
        ]
    }"#;

    fn extractor(base: &str) -> YouTubeExtractor {
        YouTubeExtractor::new(Some("test-key".into()), base, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn video_id_from_watch_url_ignores_extra_params() {
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?v=zYta6v1wZiI&list=LL&index=1")
                .as_deref(),
            Some("zYta6v1wZiI")
        );
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?list=LL&v=zYta6v1wZiI").as_deref(),
            Some("zYta6v1wZiI")
        );
        assert_eq!(
            extract_video_id("https://music.youtube.com/watch?v=xvmaOOKTiKE&si=RbOKDeoX1mB4n2p-")
                .as_deref(),
            Some("xvmaOOKTiKE")
        );
    }

    #[test]
    fn video_id_from_short_and_embed_urls() {
        assert_eq!(
            extract_video_id("https://youtu.be/zYta6v1wZiI").as_deref(),
            Some("zYta6v1wZiI")
        );
        assert_eq!(
            extract_video_id("https://www.youtube-nocookie.com/embed/zYta6v1wZiI?start=3")
                .as_deref(),
            Some("zYta6v1wZiI")
        );
    }

    #[test]
    fn watch_hosts_only_use_the_v_param() {
        assert_eq!(extract_video_id("https://www.youtube.com/embed/zYta6v1wZiI"), None);
        assert_eq!(extract_video_id("https://youtube.com/playlist?list=LL"), None);
        assert_eq!(extract_video_id("https://m.youtube.com/watch?v=zYta6v1wZiI"), None);
    }

    #[test]
    fn malformed_or_foreign_urls_have_no_id() {
        assert_eq!(extract_video_id("https://maps.google.com/"), None);
        assert_eq!(extract_video_id("https://www.youtube.com/watch?v=short"), None);
        assert_eq!(extract_video_id("https://youtu.be/zYta6v1wZiI/extra"), None);
        assert_eq!(extract_video_id("https://youtu.be/"), None);
        assert_eq!(extract_video_id("not a url"), None);
    }

    #[test]
    fn platform_of_distinguishes_music() {
        assert_eq!(
            platform_of("https://music.youtube.com/watch?v=X"),
            StreamingPlatform::YoutubeMusic
        );
        assert_eq!(
            platform_of("https://www.youtube.com/watch?v=X"),
            StreamingPlatform::Youtube
        );
        assert_eq!(platform_of("https://youtu.be/X"), StreamingPlatform::Youtube);
        assert_eq!(platform_of("garbage"), StreamingPlatform::Youtube);
    }

    #[test]
    fn artist_from_topic_channels() {
        assert_eq!(
            artist_from_channel_title("Noel Gallagher - Topic").as_deref(),
            Some("Noel Gallagher")
        );
        assert_eq!(
            artist_from_channel_title("The Velvet Underground - Topic").as_deref(),
            Some("The Velvet Underground")
        );
    }

    #[test]
    fn artist_separator_preference_and_fallbacks() {
        assert_eq!(
            artist_from_channel_title("Boiler Room | Live").as_deref(),
            Some("Boiler Room")
        );
        assert_eq!(
            artist_from_channel_title("Artist•Official").as_deref(),
            Some("Artist")
        );
        assert_eq!(artist_from_channel_title("Jay-Z").as_deref(), Some("Jay"));
        assert_eq!(
            artist_from_channel_title("  Radiohead  ").as_deref(),
            Some("Radiohead")
        );
        assert_eq!(artist_from_channel_title(" - Topic").as_deref(), Some("- Topic"));
        assert_eq!(artist_from_channel_title("   "), None);
    }

    #[tokio::test]
    async fn fetch_metadata_maps_snippet() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/videos")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("part".into(), "snippet".into()),
                Matcher::UrlEncoded("id".into(), "zYta6v1wZiI".into()),
                Matcher::UrlEncoded("key".into(), "test-key".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(SNIPPET_BODY)
            .expect(1)
            .create_async()
            .await;

        let record = extractor(&server.url())
            .fetch_metadata("zYta6v1wZiI")
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(record.track_name.as_deref(), Some("If I Had A Gun…"));
        assert_eq!(record.artist.as_deref(), Some("Noel Gallagher"));
        assert_eq!(record.description.as_deref(), Some("A sample description"));
        assert_eq!(record.album_name.as_deref(), Some(""));
        assert_eq!(record.purchase_link, "");
        assert_eq!(record.genre, "");
    }

    #[tokio::test]
    async fn empty_items_is_a_youtube_error() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/videos")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"items": []}"#)
            .create_async()
            .await;

        let err = extractor(&server.url())
            .fetch_metadata("zYta6v1wZiI")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::YouTube);
        assert!(err.to_string().contains("No video found"));
    }

    #[tokio::test]
    async fn http_failure_is_a_youtube_error() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/videos")
            .match_query(Matcher::Any)
            .with_status(403)
            .with_body(r#"{"error": {"message": "quotaExceeded"}}"#)
            .create_async()
            .await;

        let err = extractor(&server.url())
            .fetch_metadata("zYta6v1wZiI")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::YouTube);
        assert!(err.to_string().contains("403"));
    }

    #[tokio::test]
    async fn malformed_id_short_circuits_before_network() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/videos")
            .match_query(Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let err = extractor(&server.url())
            .fetch_metadata("not-an-id")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::YouTube);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn missing_api_key_is_a_youtube_error() {
        let yt = YouTubeExtractor::new(None, DEFAULT_API_BASE, Duration::from_secs(5)).unwrap();
        let err = yt.fetch_metadata("zYta6v1wZiI").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::YouTube);
        assert!(err.to_string().contains("YOUTUBE_API_KEY"));
    }

    #[tokio::test]
    async fn extract_stamps_platform_type_and_link() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/videos")
            .match_query(Matcher::UrlEncoded("id".into(), "xvmaOOKTiKE".into()))
            .with_status(200)
            .with_body(SNIPPET_BODY)
            .create_async()
            .await;

        let url = "https://music.youtube.com/watch?v=xvmaOOKTiKE&si=RbOKDeoX1mB4n2p-";
        let record = extractor(&server.url())
            .extract(url, TrackType::Mix)
            .await
            .unwrap();

        assert_eq!(record.streaming_platform, StreamingPlatform::YoutubeMusic);
        assert_eq!(record.track_type, TrackType::Mix);
        assert_eq!(record.streaming_link, url);
    }

    #[tokio::test]
    async fn extract_without_id_is_invalid_input() {
        let err = extractor("http://127.0.0.1:9")
            .extract("https://www.youtube.com/feed/library", TrackType::Track)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Input);
    }
}
