//! Routes a submitted streaming URL to the matching provider extractor.

use tracing::{error, info};

use super::bandcamp::browser::{BrowserSource, WebDriverClient};
use super::bandcamp::json_ld::JsonLdSource;
use super::bandcamp::{BandcampExtractor, BandcampSource};
use super::platform::{self, Platform};
use super::youtube::YouTubeExtractor;
use super::{MetadataError, MetadataRecord, TrackType, require_non_empty};
use crate::config::SetlistConfig;

/// Single entry point for metadata lookups.
pub struct MetadataOrchestrator {
    youtube: YouTubeExtractor,
    bandcamp: BandcampExtractor,
}

impl MetadataOrchestrator {
    pub fn new(youtube: YouTubeExtractor, bandcamp: BandcampExtractor) -> Self {
        Self { youtube, bandcamp }
    }

    /// Build both extractors from resolved configuration.
    pub fn from_config(config: &SetlistConfig) -> Result<Self, MetadataError> {
        let youtube = YouTubeExtractor::new(
            config.youtube_api_key.clone(),
            config.youtube_api_base.clone(),
            config.http_timeout,
        )?;

        let json_ld: Box<dyn BandcampSource> = Box::new(JsonLdSource::new(config.http_timeout)?);
        let browser = match &config.webdriver_url {
            Some(url) => {
                let driver = WebDriverClient::new(url.clone(), config.http_timeout)?;
                Some(Box::new(BrowserSource::new(driver)) as Box<dyn BandcampSource>)
            }
            None => None,
        };
        let bandcamp = BandcampExtractor::new(json_ld, browser, config.bandcamp_mode);

        Ok(Self::new(youtube, bandcamp))
    }

    /// Fetch normalized metadata for `url`.
    ///
    /// `track_type` only applies to YouTube links; Bandcamp links are
    /// always tracks. Unsupported hosts fail before any network call.
    pub async fn fetch(
        &self,
        url: &str,
        track_type: &str,
    ) -> Result<MetadataRecord, MetadataError> {
        let url = require_non_empty(url, "streaming_url")?;
        let track_type: TrackType = require_non_empty(track_type, "track_type")?
            .parse()
            .map_err(MetadataError::InvalidInput)?;

        let Some(platform) = platform::detect(url) else {
            error!(url, "unsupported platform");
            return Err(MetadataError::UnsupportedPlatform(url.to_string()));
        };

        let result = match platform {
            Platform::YouTube => self.youtube.extract(url, track_type).await,
            Platform::Bandcamp => self.bandcamp.extract(url).await,
        };

        match &result {
            Ok(_) => info!(url, %platform, "metadata fetched"),
            Err(e) => error!(url, %platform, error = %e, "metadata fetch failed"),
        }
        result
    }
}
