//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the HTTP client with browser-like default headers
//! - Rotating the user agent per request
//! - Bounded retries with a jittered delay between attempts

use crate::config::{CrawlerConfig, DelayRange};
use rand::Rng;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONNECTION, USER_AGENT};
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Browser user agents; one is picked at random for every request
pub const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/14.1.1 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:89.0) Gecko/20100101 Firefox/89.0",
];

const ACCEPT_VALUE: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";
const ACCEPT_LANGUAGE_VALUE: &str = "en-US,en;q=0.5";

/// A URL that could not be fetched within the attempt budget
#[derive(Debug, Clone, Error)]
#[error("failed to fetch {url} after {attempts} attempt(s): {last_error}")]
pub struct FetchFailure {
    pub url: String,
    pub attempts: u32,
    pub last_error: String,
    pub cancelled: bool,
}

/// Builds an HTTP client with proper configuration
///
/// The user agent is not set here; [`Fetcher`] sets one per request.
pub fn build_http_client(config: &CrawlerConfig) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_VALUE));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(ACCEPT_LANGUAGE_VALUE));
    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));

    let timeout = Duration::from_secs(config.request_timeout_secs);

    Client::builder()
        .default_headers(headers)
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Picks one entry of [`USER_AGENTS`] uniformly at random
pub fn random_user_agent() -> &'static str {
    USER_AGENTS[rand::rng().random_range(0..USER_AGENTS.len())]
}

/// Fetches page bodies with bounded retries
///
/// Any transport error or non-2xx status counts as a failed attempt.
/// Between attempts the fetcher sleeps for a duration drawn from
/// `retry_delay`; there is no sleep after the final attempt.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    attempts: u32,
    retry_delay: DelayRange,
}

impl Fetcher {
    pub fn new(config: &CrawlerConfig) -> Result<Self, reqwest::Error> {
        let client = build_http_client(config)?;
        Ok(Self::with_client(client, config.fetch_retries, config.retry_delay))
    }

    pub fn with_client(client: Client, attempts: u32, retry_delay: DelayRange) -> Self {
        Self {
            client,
            attempts: attempts.max(1),
            retry_delay,
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Fetches `url` and returns the decoded body
    ///
    /// Cancellation interrupts both an in-flight request and the sleep
    /// between attempts.
    pub async fn fetch(&self, url: &str, cancel: &CancellationToken) -> Result<String, FetchFailure> {
        let mut last_error = String::new();

        for attempt in 1..=self.attempts {
            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(self.cancelled(url, attempt, last_error)),
                result = self.attempt(url) => result,
            };

            match result {
                Ok(body) => {
                    tracing::debug!("Fetched {} on attempt {}", url, attempt);
                    return Ok(body);
                }
                Err(e) => {
                    tracing::warn!(
                        "Attempt {}/{} for {} failed: {}",
                        attempt,
                        self.attempts,
                        url,
                        e
                    );
                    last_error = e;
                }
            }

            if attempt < self.attempts {
                let delay = self.retry_delay.sample();
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(self.cancelled(url, attempt, last_error)),
                    _ = tokio::time::sleep(delay) => {}
                }
            }
        }

        tracing::error!(
            "Giving up on {} after {} attempts: {}",
            url,
            self.attempts,
            last_error
        );
        Err(FetchFailure {
            url: url.to_string(),
            attempts: self.attempts,
            last_error,
            cancelled: false,
        })
    }

    async fn attempt(&self, url: &str) -> Result<String, String> {
        let response = self
            .client
            .get(url)
            .header(USER_AGENT, random_user_agent())
            .send()
            .await
            .map_err(|e| classify_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("HTTP {}", status.as_u16()));
        }

        response.text().await.map_err(|e| classify_error(&e))
    }

    fn cancelled(&self, url: &str, attempts: u32, last_error: String) -> FetchFailure {
        FetchFailure {
            url: url.to_string(),
            attempts,
            last_error: if last_error.is_empty() {
                "cancelled".to_string()
            } else {
                last_error
            },
            cancelled: true,
        }
    }
}

fn classify_error(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        "Request timeout".to_string()
    } else if e.is_connect() {
        format!("Connection failed: {}", e)
    } else {
        e.to_string()
    }
}
