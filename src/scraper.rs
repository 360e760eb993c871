use async_trait::async_trait;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{redirect, Client};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::config::ScraperConfig;
use crate::utils::error::AppError;

/// Maximum number of redirects followed before a fetch is treated as failed.
const MAX_REDIRECTS: usize = 10;

/// Result of a single page retrieval. A failed fetch never surfaces as an `Err`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FetchOutcome {
    pub ok: bool,
    pub markup: Option<String>,
    pub error: Option<String>,
    pub status_code: Option<u16>,
    pub elapsed_ms: u64,
}

impl FetchOutcome {
    pub fn success(markup: impl Into<String>) -> Self {
        Self {
            ok: true,
            markup: Some(markup.into()),
            error: None,
            status_code: None,
            elapsed_ms: 0,
        }
    }

    pub fn failure(reason: impl Into<String>) -> Self {
        Self {
            ok: false,
            markup: None,
            error: Some(reason.into()),
            status_code: None,
            elapsed_ms: 0,
        }
    }

    fn with_status(mut self, status_code: u16) -> Self {
        self.status_code = Some(status_code);
        self
    }

    fn elapsed_since(mut self, start: Instant) -> Self {
        self.elapsed_ms = start.elapsed().as_millis() as u64;
        self
    }
}

/// One bounded, non-retrying retrieval of a page's markup.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> FetchOutcome;
}

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &ScraperConfig) -> Result<Self, AppError> {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, header_value(&config.accept)?);
        headers.insert(header::ACCEPT_LANGUAGE, header_value(&config.accept_language)?);
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));

        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .redirect(redirect::Policy::limited(MAX_REDIRECTS))
            .build()?;

        Ok(Self { client })
    }
}

fn header_value(value: &str) -> Result<HeaderValue, AppError> {
    HeaderValue::from_str(value)
        .map_err(|e| AppError::Validation(format!("Invalid header value '{}': {}", value, e)))
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> FetchOutcome {
        let start_time = Instant::now();

        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                let reason = if e.is_timeout() {
                    format!("Request timed out: {}", e)
                } else {
                    format!("Request failed: {}", e)
                };
                return FetchOutcome::failure(reason).elapsed_since(start_time);
            }
        };

        let status = response.status();
        if !(status.is_success() || status.is_redirection()) {
            return FetchOutcome::failure(format!("Unexpected HTTP status {}", status))
                .with_status(status.as_u16())
                .elapsed_since(start_time);
        }

        match response.text().await {
            Ok(markup) => FetchOutcome::success(markup)
                .with_status(status.as_u16())
                .elapsed_since(start_time),
            Err(e) => FetchOutcome::failure(format!("Failed to read response body: {}", e))
                .with_status(status.as_u16())
                .elapsed_since(start_time),
        }
    }
}
