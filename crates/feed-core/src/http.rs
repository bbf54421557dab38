//! HTTP client with bounded retries for feed downloads.

use std::time::Duration;

use reqwest::Client as ReqwestClient;
use tracing::debug;
use url::Url;

use crate::error::{FeedError, Result};

/// HTTP client with built-in retry and timeout support.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: ReqwestClient,
    max_attempts: usize,
    base_backoff: Duration,
}

impl HttpClient {
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Client with the default timeout, attempt count and backoff.
    ///
    /// # Errors
    /// Returns `FeedError::Fetch` when the TLS backend cannot be initialized.
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    /// GET `url` and return its body as text.
    ///
    /// Server errors, timeouts and connection failures are retried with exponential
    /// backoff; any other non-success status fails immediately.
    ///
    /// # Errors
    /// Returns `FeedError::Fetch` when every attempt failed or the status was not 2xx.
    pub async fn get_text(&self, url: &Url) -> Result<String> {
        let attempts = self.max_attempts.max(1);
        let fetch_error = |message: String| FeedError::Fetch {
            location: url.to_string(),
            message,
        };

        for attempt in 0..attempts {
            debug!(attempt = attempt + 1, %url, "fetching feed");
            let last = attempt + 1 >= attempts;

            match self.client.get(url.clone()).send().await {
                Ok(response) => {
                    let status = response.status();
                    debug!(attempt = attempt + 1, %url, %status, "received feed response");

                    if status.is_server_error() && !last {
                        self.sleep_with_backoff(attempt + 1).await;
                        continue;
                    }
                    if !status.is_success() {
                        return Err(fetch_error(format!("HTTP {}", status)));
                    }
                    return response
                        .text()
                        .await
                        .map_err(|err| fetch_error(err.to_string()));
                }
                Err(err) => {
                    debug!(attempt = attempt + 1, %url, error = %err, "feed request failed");

                    if !last && should_retry_error(&err) {
                        self.sleep_with_backoff(attempt + 1).await;
                        continue;
                    }
                    return Err(fetch_error(err.to_string()));
                }
            }
        }

        Err(fetch_error("exhausted retries without a response".to_string()))
    }

    fn backoff_delay(&self, retry_number: usize) -> Duration {
        let shift = retry_number.saturating_sub(1).min(8) as u32;
        self.base_backoff.saturating_mul(1u32 << shift)
    }

    async fn sleep_with_backoff(&self, retry_number: usize) {
        let delay = self.backoff_delay(retry_number);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

/// Builder for [`HttpClient`].
#[derive(Debug)]
pub struct HttpClientBuilder {
    timeout: Duration,
    max_attempts: usize,
    base_backoff: Duration,
    user_agent: String,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_attempts: 3,
            base_backoff: Duration::from_millis(200),
            user_agent: concat!("weekgrid/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl HttpClientBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Configure the total number of attempts (initial try + retries).
    pub fn max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn base_backoff(mut self, backoff: Duration) -> Self {
        self.base_backoff = backoff;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = agent.into();
        self
    }

    /// # Errors
    /// Returns `FeedError::Fetch` when the underlying client cannot be built.
    pub fn build(self) -> Result<HttpClient> {
        let client = ReqwestClient::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent)
            .build()
            .map_err(|err| FeedError::Fetch {
                location: "http client".to_string(),
                message: err.to_string(),
            })?;

        Ok(HttpClient {
            client,
            max_attempts: self.max_attempts,
            base_backoff: self.base_backoff,
        })
    }
}

fn should_retry_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request()
}
