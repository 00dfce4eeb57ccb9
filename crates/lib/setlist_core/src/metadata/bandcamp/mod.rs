//! Bandcamp metadata extractor.
//!
//! Two page sources sit behind [`BandcampSource`]:
//!
//! - [`json_ld::JsonLdSource`]: plain HTTP GET, reads the
//!   `application/ld+json` block (fast, no browser).
//! - [`browser::BrowserSource`]: renders the page through a WebDriver
//!   endpoint and scrapes `#name-section` (survives anti-bot pages).
//!
//! [`BandcampExtractor`] picks one per [`BandcampMode`]; `Auto` tries
//! JSON-LD first and falls back to the browser.

pub mod browser;
pub mod dom;
pub mod json_ld;

use async_trait::async_trait;
use tracing::{error, info, warn};

use super::{MetadataError, MetadataRecord, StreamingPlatform, TrackType};

/// Which page source to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BandcampMode {
    /// Structured data only.
    JsonLd,
    /// Headless browser + DOM scrape only.
    Browser,
    /// JSON-LD, then browser on failure.
    #[default]
    Auto,
}

impl BandcampMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            BandcampMode::JsonLd => "json-ld",
            BandcampMode::Browser => "browser",
            BandcampMode::Auto => "auto",
        }
    }
}

impl std::fmt::Display for BandcampMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BandcampMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json-ld" | "jsonld" | "json_ld" => Ok(BandcampMode::JsonLd),
            "browser" | "dom" => Ok(BandcampMode::Browser),
            "auto" => Ok(BandcampMode::Auto),
            other => Err(format!("unknown bandcamp mode: {other}")),
        }
    }
}

/// Fields a page source recovers from a Bandcamp page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BandcampPage {
    pub track_name: Option<String>,
    pub artist: Option<String>,
    pub album_name: Option<String>,
}

impl BandcampPage {
    /// Normalize into a record; every Bandcamp link is also its purchase link.
    pub fn into_record(self, url: &str) -> MetadataRecord {
        let mut record = MetadataRecord::empty(StreamingPlatform::Bandcamp);
        record.track_type = TrackType::Track;
        record.track_name = self.track_name;
        record.artist = self.artist;
        record.album_name = self.album_name;
        record.purchase_link = url.to_string();
        record.streaming_link = url.to_string();
        record
    }
}

/// A way of turning a Bandcamp URL into page fields.
#[async_trait]
pub trait BandcampSource: Send + Sync {
    /// Name of the source (for logging).
    fn name(&self) -> &'static str;

    async fn fetch_page(&self, url: &str) -> Result<BandcampPage, MetadataError>;
}

/// Bandcamp extractor with configurable source selection.
pub struct BandcampExtractor {
    json_ld: Box<dyn BandcampSource>,
    browser: Option<Box<dyn BandcampSource>>,
    mode: BandcampMode,
}

impl BandcampExtractor {
    /// `json_ld` is the structured-data source, `browser` the optional
    /// rendering source.
    pub fn new(
        json_ld: Box<dyn BandcampSource>,
        browser: Option<Box<dyn BandcampSource>>,
        mode: BandcampMode,
    ) -> Self {
        Self {
            json_ld,
            browser,
            mode,
        }
    }

    pub fn mode(&self) -> BandcampMode {
        self.mode
    }

    /// Fetch `url` and build the normalized record.
    pub async fn extract(&self, url: &str) -> Result<MetadataRecord, MetadataError> {
        let url = super::require_non_empty(url, "bandcamp_url")?;

        let page = self.fetch_page(url).await.map_err(|e| match e {
            MetadataError::Bandcamp { .. } => e,
            other => {
                error!(url, error = %other, "unexpected error extracting Bandcamp metadata");
                MetadataError::bandcamp_with(
                    format!("Failed to extract Bandcamp metadata: {other}"),
                    other,
                )
            }
        })?;

        info!(url, mode = %self.mode, "fetched Bandcamp metadata");
        Ok(page.into_record(url))
    }

    async fn fetch_page(&self, url: &str) -> Result<BandcampPage, MetadataError> {
        match self.mode {
            BandcampMode::JsonLd => self.json_ld.fetch_page(url).await,
            BandcampMode::Browser => self.browser()?.fetch_page(url).await,
            BandcampMode::Auto => match self.json_ld.fetch_page(url).await {
                Ok(page) => Ok(page),
                Err(e @ MetadataError::Bandcamp { .. }) => match &self.browser {
                    Some(browser) => {
                        warn!(
                            url,
                            error = %e,
                            source = browser.name(),
                            "JSON-LD failed, falling back"
                        );
                        browser.fetch_page(url).await
                    }
                    None => Err(e),
                },
                Err(e) => Err(e),
            },
        }
    }

    fn browser(&self) -> Result<&dyn BandcampSource, MetadataError> {
        self.browser.as_deref().ok_or_else(|| {
            MetadataError::bandcamp("Browser mode requested but no WebDriver URL is configured")
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::error::ErrorKind;
    use browser::{BrowserSource, StealthTiming, WebDriverClient};
    use json_ld::JsonLdSource;

    const JSON_LD_PAGE: &str = r#"<html><head>
        <script type="application/ld+json">
        {"@type": "MusicRecording", "name": "How Are We",
         "byArtist": {"@type": "MusicGroup", "name": "Horse Vision"},
         "inAlbum": {"@type": "MusicAlbum", "name": "Another Life"}}
        </script></head><body></body></html>"#;

    const DOM_PAGE: &str = r#"<html><body><div id="name-section">
        <h2 class="trackTitle">How Are We</h2>
        <h3>from <a href="/album/another-life">Another Life</a>
            by <a href="/">Horse Vision</a></h3>
        </div></body></html>"#;

    fn json_ld_source() -> Box<dyn BandcampSource> {
        Box::new(JsonLdSource::new(Duration::from_secs(5)).unwrap())
    }

    /// Source that fails with a non-Bandcamp error.
    struct MisbehavingSource;

    #[async_trait]
    impl BandcampSource for MisbehavingSource {
        fn name(&self) -> &'static str {
            "misbehaving"
        }

        async fn fetch_page(&self, _url: &str) -> Result<BandcampPage, MetadataError> {
            Err(MetadataError::InvalidInput("boom".into()))
        }
    }

    /// Mocks a WebDriver endpoint serving `source`; the last mock is the
    /// session teardown.
    async fn mock_webdriver(server: &mut mockito::ServerGuard, source: &str) -> Vec<mockito::Mock> {
        let mut mocks = vec![
            server
                .mock("POST", "/session")
                .with_status(200)
                .with_body(r#"{"value": {"sessionId": "s1", "capabilities": {}}}"#)
                .create_async()
                .await,
        ];
        for path in ["/session/s1/timeouts", "/session/s1/url", "/session/s1/execute/sync"] {
            mocks.push(
                server
                    .mock("POST", path)
                    .with_status(200)
                    .with_body(r#"{"value": null}"#)
                    .create_async()
                    .await,
            );
        }
        mocks.push(
            server
                .mock("POST", "/session/s1/element")
                .with_status(200)
                .with_body(r#"{"value": {"element-6066-11e4-a52e-4f735466cecf": "e1"}}"#)
                .create_async()
                .await,
        );
        mocks.push(
            server
                .mock("GET", "/session/s1/source")
                .with_status(200)
                .with_body(serde_json::json!({ "value": source }).to_string())
                .create_async()
                .await,
        );
        mocks.push(
            server
                .mock("DELETE", "/session/s1")
                .with_status(200)
                .with_body(r#"{"value": null}"#)
                .expect(1)
                .create_async()
                .await,
        );
        mocks
    }

    fn browser_source(base: &str) -> Box<dyn BandcampSource> {
        let driver = WebDriverClient::new(base, Duration::from_secs(5))
            .unwrap()
            .with_timing(StealthTiming::none());
        Box::new(BrowserSource::new(driver))
    }

    #[tokio::test]
    async fn json_ld_mode_builds_record() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/track/how-are-we")
            .with_status(200)
            .with_body(JSON_LD_PAGE)
            .create_async()
            .await;
        let url = format!("{}/track/how-are-we", server.url());

        let extractor = BandcampExtractor::new(json_ld_source(), None, BandcampMode::JsonLd);
        let record = extractor.extract(&url).await.unwrap();

        assert_eq!(record.track_name.as_deref(), Some("How Are We"));
        assert_eq!(record.artist.as_deref(), Some("Horse Vision"));
        assert_eq!(record.album_name.as_deref(), Some("Another Life"));
        assert_eq!(record.streaming_link, url);
        assert_eq!(record.purchase_link, url);
        assert_eq!(record.track_type, TrackType::Track);
        assert_eq!(record.streaming_platform, StreamingPlatform::Bandcamp);
        assert_eq!(record.mix_page, "");
        assert_eq!(record.record_label, "");
        assert_eq!(record.genre, "");
    }

    #[tokio::test]
    async fn empty_url_is_invalid_input() {
        let extractor = BandcampExtractor::new(json_ld_source(), None, BandcampMode::JsonLd);
        let err = extractor.extract("").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Input);
    }

    #[tokio::test]
    async fn browser_mode_without_webdriver_is_bandcamp_error() {
        let extractor = BandcampExtractor::new(json_ld_source(), None, BandcampMode::Browser);
        let err = extractor
            .extract("https://horsevision.bandcamp.com/track/how-are-we")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Bandcamp);
    }

    #[tokio::test]
    async fn auto_mode_falls_back_to_browser() {
        let mut page_server = mockito::Server::new_async().await;
        let _m = page_server
            .mock("GET", "/track/how-are-we")
            .with_status(403)
            .with_body("blocked")
            .create_async()
            .await;
        let url = format!("{}/track/how-are-we", page_server.url());

        let mut driver_server = mockito::Server::new_async().await;
        let driver_mocks = mock_webdriver(&mut driver_server, DOM_PAGE).await;

        let extractor = BandcampExtractor::new(
            json_ld_source(),
            Some(browser_source(&driver_server.url())),
            BandcampMode::Auto,
        );
        let record = extractor.extract(&url).await.unwrap();

        if let Some(teardown) = driver_mocks.last() {
            teardown.assert_async().await;
        }
        assert_eq!(record.track_name.as_deref(), Some("How Are We"));
        assert_eq!(record.artist.as_deref(), Some("Horse Vision"));
        assert_eq!(record.album_name.as_deref(), Some("Another Life"));
        assert_eq!(record.purchase_link, url);
    }

    #[tokio::test]
    async fn auto_mode_without_browser_surfaces_json_ld_error() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/track/x")
            .with_status(500)
            .create_async()
            .await;
        let url = format!("{}/track/x", server.url());

        let extractor = BandcampExtractor::new(json_ld_source(), None, BandcampMode::Auto);
        let err = extractor.extract(&url).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Bandcamp);
    }

    #[tokio::test]
    async fn unexpected_source_errors_are_wrapped() {
        let extractor =
            BandcampExtractor::new(Box::new(MisbehavingSource), None, BandcampMode::JsonLd);
        let err = extractor
            .extract("https://horsevision.bandcamp.com/track/how-are-we")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Bandcamp);
        assert!(err.to_string().contains("Failed to extract Bandcamp metadata"));
    }

    #[test]
    fn mode_parses_config_spellings() {
        assert_eq!("json-ld".parse::<BandcampMode>().unwrap(), BandcampMode::JsonLd);
        assert_eq!("BROWSER".parse::<BandcampMode>().unwrap(), BandcampMode::Browser);
        assert_eq!("auto".parse::<BandcampMode>().unwrap(), BandcampMode::Auto);
        assert!("selenium".parse::<BandcampMode>().is_err());
    }
}
