use reqwest::{Client, RequestBuilder, StatusCode};
use std::time::Duration;
use tracing::{debug, warn};

use super::PageFetcher;
use crate::config::SourceConfig;
use crate::outcome::{FailureKind, Outcome};

const DEFAULT_USER_AGENT: &str = concat!(
    "rollcall/",
    env!("CARGO_PKG_VERSION"),
    " (+https://github.com/monokrome/rollcall)"
);

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),
}

pub type ClientResult<T> = Result<T, ClientError>;

/// Shared HTTP client for all upstream sources.
///
/// Transport failures and non-success statuses become `Rejected`, a 404 becomes
/// `NotFound`.
#[derive(Clone)]
pub struct HttpClient {
    inner: Client,
}

impl HttpClient {
    pub fn new(config: &SourceConfig) -> ClientResult<Self> {
        let user_agent = config
            .user_agent
            .clone()
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());

        let inner = Client::builder()
            .connect_timeout(Duration::from_secs(u64::from(config.connect_timeout_seconds)))
            .timeout(Duration::from_secs(u64::from(config.request_timeout_seconds)))
            .user_agent(user_agent)
            .build()?;

        Ok(Self { inner })
    }

    pub fn get(&self, url: &str) -> RequestBuilder {
        self.inner.get(url)
    }

    pub async fn send_json(&self, request: RequestBuilder) -> Outcome<serde_json::Value> {
        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                warn!("Request failed: {}", e);
                return Outcome::Failure(FailureKind::Rejected);
            }
        };

        if let Some(kind) = classify_status(response.status()) {
            debug!("{} returned {}", response.url(), response.status());
            return Outcome::Failure(kind);
        }

        match response.json::<serde_json::Value>().await {
            Ok(body) => Outcome::Success(body),
            Err(e) => {
                warn!("Undecodable response body: {}", e);
                Outcome::Failure(FailureKind::Rejected)
            }
        }
    }

    pub async fn send_text(&self, request: RequestBuilder) -> Outcome<String> {
        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                warn!("Request failed: {}", e);
                return Outcome::Failure(FailureKind::Rejected);
            }
        };

        if let Some(kind) = classify_status(response.status()) {
            debug!("{} returned {}", response.url(), response.status());
            return Outcome::Failure(kind);
        }

        match response.text().await {
            Ok(body) => Outcome::Success(body),
            Err(e) => {
                warn!("Failed to read response body: {}", e);
                Outcome::Failure(FailureKind::Rejected)
            }
        }
    }
}

#[async_trait::async_trait]
impl PageFetcher for HttpClient {
    async fn fetch_page(&self, url: &str) -> Outcome<String> {
        if let Err(e) = url::Url::parse(url) {
            warn!("Refusing to fetch invalid URL {}: {}", url, e);
            return Outcome::Failure(FailureKind::Rejected);
        }
        self.send_text(self.get(url)).await
    }
}

/// Map an HTTP status to a failure kind, `None` for success.
pub fn classify_status(status: StatusCode) -> Option<FailureKind> {
    if status.is_success() {
        None
    } else if status == StatusCode::NOT_FOUND {
        Some(FailureKind::NotFound)
    } else {
        Some(FailureKind::Rejected)
    }
}
