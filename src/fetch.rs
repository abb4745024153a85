//! Page fetching with bounded retry and linear backoff.
//!
//! # Architecture
//!
//! The module uses a trait-based design so the pipeline never depends on
//! the HTTP stack directly:
//! - [`PageFetcher`]: core trait, "give me the markup behind this URL"
//! - [`HttpFetcher`]: `reqwest` implementation
//! - [`RetryFetch`]: decorator that adds retry logic to any `PageFetcher`
//!
//! # Retry Strategy
//!
//! - 3 attempts in total
//! - After failed attempt `k` (0-based) wait `500ms + k * 750ms`
//! - The last error propagates once attempts are exhausted

use crate::scrapers::TURBO_STREAM_ACCEPT;
use reqwest::header::ACCEPT;
use std::error::Error;
use std::fmt;
use std::time::{Duration as StdDuration, Instant};
use tokio::time::sleep;
use tracing::{debug, error, instrument, warn};

/// Trait for retrieving raw page markup.
///
/// Implementors return the body text for `url`. When `turbo_stream` is set
/// the request must ask the site for its lighter turbo-stream partial.
pub trait PageFetcher {
    async fn fetch(&self, url: &str, turbo_stream: bool) -> Result<String, Box<dyn Error>>;
}

/// Plain HTTP fetcher backed by a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Build a client with a 30 second timeout and the crate user agent.
    pub fn new() -> Result<Self, Box<dyn Error>> {
        let client = reqwest::Client::builder()
            .timeout(StdDuration::from_secs(30))
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

impl PageFetcher for HttpFetcher {
    #[instrument(level = "debug", skip(self))]
    async fn fetch(&self, url: &str, turbo_stream: bool) -> Result<String, Box<dyn Error>> {
        let t0 = Instant::now();
        let mut request = self.client.get(url);
        if turbo_stream {
            request = request.header(ACCEPT, TURBO_STREAM_ACCEPT);
        }
        let body = request.send().await?.error_for_status()?.text().await?;
        debug!(
            bytes = body.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Fetched page"
        );
        Ok(body)
    }
}

/// Wrapper that adds linear backoff retry logic to any [`PageFetcher`].
///
/// The delay after failed attempt `k` (0-based) is
/// ```text
/// delay = base_delay + k * step
/// ```
pub struct RetryFetch<T> {
    /// The underlying fetcher to wrap.
    inner: T,
    /// Total number of attempts before giving up.
    attempts: usize,
    /// Delay after the first failure.
    base_delay: StdDuration,
    /// Extra delay added per subsequent failure.
    step: StdDuration,
}

impl<T> RetryFetch<T>
where
    T: PageFetcher,
{
    /// Create a new retry wrapper around an existing [`PageFetcher`].
    ///
    /// # Example
    ///
    /// ```ignore
    /// let fetcher = RetryFetch::new(HttpFetcher::new()?, 3);
    /// ```
    pub fn new(inner: T, attempts: usize) -> Self {
        Self {
            inner,
            attempts: attempts.max(1),
            base_delay: StdDuration::from_millis(500),
            step: StdDuration::from_millis(750),
        }
    }

    /// Override the backoff timings.
    #[cfg(test)]
    pub fn with_backoff(mut self, base_delay: StdDuration, step: StdDuration) -> Self {
        self.base_delay = base_delay;
        self.step = step;
        self
    }

    fn delay_after(&self, attempt: usize) -> StdDuration {
        self.base_delay + self.step.saturating_mul(attempt as u32)
    }
}

impl<T> fmt::Debug for RetryFetch<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryFetch")
            .field("attempts", &self.attempts)
            .field("base_delay", &self.base_delay)
            .field("step", &self.step)
            .finish()
    }
}

impl<T> PageFetcher for RetryFetch<T>
where
    T: PageFetcher,
{
    #[instrument(level = "debug", skip(self))]
    async fn fetch(&self, url: &str, turbo_stream: bool) -> Result<String, Box<dyn Error>> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            match self.inner.fetch(url, turbo_stream).await {
                Ok(body) => return Ok(body),
                Err(e) => {
                    attempt += 1;
                    if attempt >= self.attempts {
                        error!(
                            attempt,
                            max = self.attempts,
                            elapsed_ms_total = total_t0.elapsed().as_millis() as u64,
                            %url,
                            error = %e,
                            "fetch exhausted retries"
                        );
                        return Err(format!("failed to fetch {url}: {e}").into());
                    }

                    let delay = self.delay_after(attempt - 1);
                    warn!(
                        attempt,
                        max = self.attempts,
                        ?delay,
                        %url,
                        error = %e,
                        "fetch attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}
