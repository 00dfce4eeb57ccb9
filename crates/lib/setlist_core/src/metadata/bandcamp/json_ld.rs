//! Structured-data Bandcamp source.
//!
//! Bandcamp embeds a `schema.org` `MusicRecording` in every track page.
//! A plain GET is enough when the page is not behind an anti-bot wall.

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use serde_json::Value;
use tracing::{debug, error};

use super::{BandcampPage, BandcampSource};
use crate::metadata::MetadataError;

/// Browser-like user agent sent with page requests.
pub const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36";

const UNKNOWN_TRACK: &str = "Unknown track";
const UNKNOWN_ARTIST: &str = "Unknown artist";

static LD_JSON: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"script[type="application/ld+json"]"#).expect("ld+json selector is valid")
});

/// Fetches a page over HTTP and reads its JSON-LD block.
#[derive(Debug, Clone)]
pub struct JsonLdSource {
    client: Client,
}

impl JsonLdSource {
    pub fn new(timeout: Duration) -> Result<Self, MetadataError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| MetadataError::bandcamp_with("Failed to initialize HTTP client", e))?;
        Ok(Self::with_client(client))
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    async fn get_html(&self, url: &str) -> Result<String, MetadataError> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| {
                error!(url, error = %e, "Bandcamp request failed");
                MetadataError::bandcamp_with(format!("Request to {url} failed"), e)
            })?;
        resp.text()
            .await
            .map_err(|e| MetadataError::bandcamp_with("Failed to read Bandcamp response body", e))
    }
}

#[async_trait]
impl BandcampSource for JsonLdSource {
    fn name(&self) -> &'static str {
        "json-ld"
    }

    async fn fetch_page(&self, url: &str) -> Result<BandcampPage, MetadataError> {
        let html = self.get_html(url).await?;
        let data = parse_json_ld(&html)?;
        debug!(url, "parsed JSON-LD");
        Ok(page_from_json_ld(&data))
    }
}

/// Locate and parse the first `application/ld+json` script in `html`.
pub fn parse_json_ld(html: &str) -> Result<Value, MetadataError> {
    let document = Html::parse_document(html);
    let script = document
        .select(&LD_JSON)
        .next()
        .ok_or_else(|| MetadataError::bandcamp("Could not find JSON-LD script tag on page"))?;
    let text: String = script.text().collect();
    let value: Value = serde_json::from_str(text.trim())
        .map_err(|e| MetadataError::bandcamp_with("Failed to parse JSON-LD", e))?;

    match value {
        Value::Array(items) => items
            .into_iter()
            .find(Value::is_object)
            .ok_or_else(|| MetadataError::bandcamp("JSON-LD array holds no objects")),
        Value::Object(_) => Ok(value),
        _ => Err(MetadataError::bandcamp("JSON-LD is not an object")),
    }
}

/// Map a `MusicRecording` object onto page fields.
pub fn page_from_json_ld(data: &Value) -> BandcampPage {
    let text = |v: Option<&Value>| {
        v.and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    BandcampPage {
        track_name: Some(
            text(data.get("name")).unwrap_or_else(|| UNKNOWN_TRACK.to_string()),
        ),
        artist: Some(
            text(data.pointer("/byArtist/name")).unwrap_or_else(|| UNKNOWN_ARTIST.to_string()),
        ),
        album_name: text(data.pointer("/inAlbum/name")),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn maps_recording_fields() {
        let page = page_from_json_ld(&json!({
            "@type": "MusicRecording",
            "name": "How Are We",
            "byArtist": {"name": "Horse Vision"},
            "inAlbum": {"name": "Another Life"}
        }));
        assert_eq!(page.track_name.as_deref(), Some("How Are We"));
        assert_eq!(page.artist.as_deref(), Some("Horse Vision"));
        assert_eq!(page.album_name.as_deref(), Some("Another Life"));
    }

    #[test]
    fn missing_fields_use_defaults() {
        let page = page_from_json_ld(&json!({"@type": "MusicRecording"}));
        assert_eq!(page.track_name.as_deref(), Some("Unknown track"));
        assert_eq!(page.artist.as_deref(), Some("Unknown artist"));
        assert_eq!(page.album_name, None);
    }

    #[test]
    fn array_payload_uses_first_object() {
        let html = concat!(
            r#"<script type="application/ld+json">"#,
            r#"[{"name": "First"}, {"name": "Second"}]</script>"#,
        );
        let value = parse_json_ld(html).unwrap();
        assert_eq!(value["name"], "First");
    }

    #[test]
    fn missing_script_is_bandcamp_error() {
        let err = parse_json_ld("<html><body>nothing here</body></html>").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Bandcamp);
    }

    #[test]
    fn invalid_json_keeps_cause() {
        use std::error::Error as _;

        let err = parse_json_ld(r#"<script type="application/ld+json">{not json</script>"#)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Bandcamp);
        assert!(err.source().is_some());
    }

    #[tokio::test]
    async fn non_success_status_is_bandcamp_error() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/track/gone")
            .with_status(404)
            .create_async()
            .await;

        let source = JsonLdSource::new(Duration::from_secs(5)).unwrap();
        let err = source
            .fetch_page(&format!("{}/track/gone", server.url()))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Bandcamp);
    }

    #[tokio::test]
    async fn sends_browser_user_agent() {
        let mut server = mockito::Server::new_async().await;
        let m = server
            .mock("GET", "/track/ua")
            .match_header("user-agent", USER_AGENT)
            .with_status(200)
            .with_body(r#"<script type="application/ld+json">{"name": "UA"}</script>"#)
            .expect(1)
            .create_async()
            .await;

        let source = JsonLdSource::new(Duration::from_secs(5)).unwrap();
        let page = source
            .fetch_page(&format!("{}/track/ua", server.url()))
            .await
            .unwrap();
        m.assert_async().await;
        assert_eq!(page.track_name.as_deref(), Some("UA"));
    }
}
