//! Headless-browser Bandcamp source.
//!
//! Drives a Chrome instance through a W3C WebDriver endpoint (chromedriver
//! or a Selenium hub) with a stealth profile, then hands the rendered page
//! source to [`super::dom::scrape_name_section`].

use std::ops::RangeInclusive;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use reqwest::{Client, Method};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use super::json_ld::USER_AGENT;
use super::{BandcampPage, BandcampSource, dom};
use crate::metadata::MetadataError;

/// Navigation budget handed to the browser.
pub const PAGE_LOAD_TIMEOUT: Duration = Duration::from_secs(10);

/// How long to wait for `<body>` after navigation.
pub const BODY_WAIT_TIMEOUT: Duration = Duration::from_secs(10);

const BODY_POLL_INTERVAL: Duration = Duration::from_millis(250);

const MASK_WEBDRIVER_JS: &str =
    "Object.defineProperty(navigator, 'webdriver', {get: () => undefined})";
const SCROLL_JS: &str = "window.scrollTo(0, document.body.scrollHeight/2);";

/// Errors talking to the WebDriver endpoint.
#[derive(Debug, Error)]
pub enum WebDriverError {
    #[error("WebDriver request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("WebDriver command {command} failed: {error}: {message}")]
    Command {
        command: String,
        error: String,
        message: String,
    },

    #[error("Unexpected WebDriver response: {0}")]
    Protocol(String),
}

#[derive(Deserialize)]
struct Envelope<T> {
    value: T,
}

#[derive(Deserialize)]
struct CommandFailure {
    error: String,
    #[serde(default)]
    message: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewSession {
    session_id: String,
}

/// Randomized pauses (milliseconds) that pace a page visit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StealthTiming {
    pub before_load: RangeInclusive<u64>,
    pub after_body: RangeInclusive<u64>,
    pub after_scroll: RangeInclusive<u64>,
}

impl StealthTiming {
    /// Human-like pacing.
    pub fn human() -> Self {
        Self {
            before_load: 1000..=2000,
            after_body: 2000..=3000,
            after_scroll: 500..=1000,
        }
    }

    /// No pauses at all.
    pub fn none() -> Self {
        Self {
            before_load: 0..=0,
            after_body: 0..=0,
            after_scroll: 0..=0,
        }
    }
}

impl Default for StealthTiming {
    fn default() -> Self {
        Self::human()
    }
}

async fn pause(range: &RangeInclusive<u64>) {
    if *range.end() == 0 {
        return;
    }
    let ms = rand::rng().random_range(range.clone());
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

/// Capabilities requesting a headless Chrome that hides automation flags.
fn stealth_capabilities() -> Value {
    json!({
        "capabilities": {
            "alwaysMatch": {
                "browserName": "chrome",
                "goog:chromeOptions": {
                    "args": [
                        "--headless=new",
                        "--no-sandbox",
                        "--disable-dev-shm-usage",
                        "--disable-blink-features=AutomationControlled",
                        "--window-size=1920,1080",
                        format!("user-agent={USER_AGENT}"),
                        "--disable-gpu",
                        "--lang=en-GB",
                    ],
                    "excludeSwitches": ["enable-automation"],
                    "useAutomationExtension": false,
                }
            }
        }
    })
}

/// Minimal W3C WebDriver client.
#[derive(Debug, Clone)]
pub struct WebDriverClient {
    client: Client,
    base: String,
    timing: StealthTiming,
    body_wait: Duration,
}

impl WebDriverClient {
    /// `timeout` bounds each WebDriver command; navigation also gets
    /// [`PAGE_LOAD_TIMEOUT`] on top.
    pub fn new(base: impl Into<String>, timeout: Duration) -> Result<Self, MetadataError> {
        let client = Client::builder()
            .timeout(timeout + PAGE_LOAD_TIMEOUT)
            .build()
            .map_err(|e| MetadataError::bandcamp_with("Failed to initialize WebDriver client", e))?;
        Ok(Self {
            client,
            base: base.into().trim_end_matches('/').to_string(),
            timing: StealthTiming::default(),
            body_wait: BODY_WAIT_TIMEOUT,
        })
    }

    pub fn with_timing(mut self, timing: StealthTiming) -> Self {
        self.timing = timing;
        self
    }

    pub fn with_body_wait(mut self, wait: Duration) -> Self {
        self.body_wait = wait;
        self
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// Load `url` in a fresh session and return the rendered page source.
    ///
    /// The session is deleted on every path out.
    pub async fn render(&self, url: &str) -> Result<String, WebDriverError> {
        let session = self.new_session().await?;
        debug!(session, "opened WebDriver session");

        let result = self.visit(&session, url).await;

        if let Err(e) = self.delete_session(&session).await {
            warn!(session, error = %e, "failed to close WebDriver session");
        }
        result
    }

    async fn visit(&self, session: &str, url: &str) -> Result<String, WebDriverError> {
        let timeouts = json!({ "pageLoad": PAGE_LOAD_TIMEOUT.as_millis() as u64 });
        self.command::<Value>(Method::POST, &format!("/session/{session}/timeouts"), Some(timeouts))
            .await?;
        self.execute(session, MASK_WEBDRIVER_JS).await?;

        pause(&self.timing.before_load).await;
        self.command::<Value>(
            Method::POST,
            &format!("/session/{session}/url"),
            Some(json!({ "url": url })),
        )
        .await?;

        if self.wait_for_body(session).await? {
            pause(&self.timing.after_body).await;
        } else {
            warn!(url, "timeout waiting for page load");
        }

        self.execute(session, SCROLL_JS).await?;
        pause(&self.timing.after_scroll).await;

        let source: String = self
            .command(Method::GET, &format!("/session/{session}/source"), None)
            .await?;
        info!(url, "fetched Bandcamp page");
        Ok(source)
    }

    async fn new_session(&self) -> Result<String, WebDriverError> {
        let created: NewSession = self
            .command(Method::POST, "/session", Some(stealth_capabilities()))
            .await?;
        Ok(created.session_id)
    }

    async fn delete_session(&self, session: &str) -> Result<(), WebDriverError> {
        self.command::<Value>(Method::DELETE, &format!("/session/{session}"), None)
            .await
            .map(|_| ())
    }

    async fn execute(&self, session: &str, script: &str) -> Result<(), WebDriverError> {
        self.command::<Value>(
            Method::POST,
            &format!("/session/{session}/execute/sync"),
            Some(json!({ "script": script, "args": [] })),
        )
        .await
        .map(|_| ())
    }

    /// Poll for `<body>`; `false` when the wait runs out.
    async fn wait_for_body(&self, session: &str) -> Result<bool, WebDriverError> {
        let deadline = Instant::now() + self.body_wait;
        let query = json!({ "using": "css selector", "value": "body" });
        loop {
            match self
                .command::<Value>(
                    Method::POST,
                    &format!("/session/{session}/element"),
                    Some(query.clone()),
                )
                .await
            {
                Ok(_) => return Ok(true),
                Err(WebDriverError::Command { ref error, .. }) if error == "no such element" => {}
                Err(e) => return Err(e),
            }
            if Instant::now() >= deadline {
                return Ok(false);
            }
            tokio::time::sleep(BODY_POLL_INTERVAL).await;
        }
    }

    async fn command<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<T, WebDriverError> {
        let mut req = self.client.request(method.clone(), format!("{}{path}", self.base));
        if let Some(body) = body {
            req = req.json(&body);
        }
        let resp = req.send().await?;
        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            return Err(match serde_json::from_str::<Envelope<CommandFailure>>(&text) {
                Ok(failure) => WebDriverError::Command {
                    command: format!("{method} {path}"),
                    error: failure.value.error,
                    message: failure.value.message,
                },
                Err(_) => {
                    WebDriverError::Protocol(format!("{method} {path}: HTTP {status}: {text}"))
                }
            });
        }

        serde_json::from_str::<Envelope<T>>(&text)
            .map(|envelope| envelope.value)
            .map_err(|e| WebDriverError::Protocol(format!("{method} {path}: {e}")))
    }
}

/// Renders the page in a browser and scrapes `#name-section`.
#[derive(Debug, Clone)]
pub struct BrowserSource {
    driver: WebDriverClient,
}

impl BrowserSource {
    pub fn new(driver: WebDriverClient) -> Self {
        Self { driver }
    }
}

#[async_trait]
impl BandcampSource for BrowserSource {
    fn name(&self) -> &'static str {
        "browser"
    }

    async fn fetch_page(&self, url: &str) -> Result<BandcampPage, MetadataError> {
        let html = self.driver.render(url).await.map_err(|e| {
            error!(url, error = %e, "WebDriver error fetching Bandcamp URL");
            MetadataError::bandcamp_with(format!("Failed to render {url}"), e)
        })?;
        dom::scrape_name_section(&html)
    }
}
