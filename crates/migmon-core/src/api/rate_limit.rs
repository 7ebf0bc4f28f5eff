//! Transport-level rate-limit handling.
//!
//! GitHub rejects over-limit requests with 429, or 403 once the remaining
//! primary quota reaches zero. [`RateLimitWaiter`] absorbs both: it sleeps
//! for the server-suggested delay and retries the request, so callers never
//! observe rate-limit responses directly.

use std::time::Duration;

use chrono::Utc;
use log::warn;
use reqwest::header::HeaderMap;
use reqwest::{RequestBuilder, Response, StatusCode};

use crate::errors::MonitorError;

const DEFAULT_DELAY: Duration = Duration::from_secs(60);
const MAX_DELAY: Duration = Duration::from_secs(15 * 60);
const MAX_ATTEMPTS: u32 = 5;

/// Wraps a `reqwest::Client` so every outbound request transparently waits
/// out rate-limit rejections.
#[derive(Debug, Clone)]
pub struct RateLimitWaiter {
    client: reqwest::Client,
    max_attempts: u32,
}

impl RateLimitWaiter {
    pub fn new(client: reqwest::Client) -> Self {
        RateLimitWaiter {
            client,
            max_attempts: MAX_ATTEMPTS,
        }
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// Sends the request, retrying after a delay whenever the server answers
    /// with a rate-limit rejection. Gives up after a bounded number of
    /// retries and returns the last response as-is.
    pub async fn send(&self, request: RequestBuilder) -> Result<Response, MonitorError> {
        let mut attempt = 0;
        loop {
            let cloned = request.try_clone().ok_or_else(|| {
                MonitorError::InternalError("request body is not cloneable for retry".to_string())
            })?;
            let response = cloned.send().await?;

            match rate_limit_delay(response.status(), response.headers()) {
                Some(delay) if attempt < self.max_attempts => {
                    attempt += 1;
                    warn!(
                        "rate limited by GitHub (attempt {attempt}/{}), waiting {}s before retry",
                        self.max_attempts,
                        delay.as_secs()
                    );
                    tokio::time::sleep(delay).await;
                }
                _ => return Ok(response),
            }
        }
    }
}

/// Returns how long to wait before retrying, or `None` when the response is
/// not a rate-limit rejection.
pub fn rate_limit_delay(status: StatusCode, headers: &HeaderMap) -> Option<Duration> {
    let limited = status == StatusCode::TOO_MANY_REQUESTS
        || (status == StatusCode::FORBIDDEN && remaining_quota(headers) == Some(0));
    if !limited {
        return None;
    }

    if let Some(secs) = header_u64(headers, "retry-after") {
        return Some(clamp_delay(Duration::from_secs(secs)));
    }

    if let Some(reset) = header_u64(headers, "x-ratelimit-reset") {
        let now = Utc::now().timestamp().max(0) as u64;
        let secs = reset.saturating_sub(now);
        return Some(clamp_delay(Duration::from_secs(secs.max(1))));
    }

    Some(DEFAULT_DELAY)
}

fn remaining_quota(headers: &HeaderMap) -> Option<u64> {
    header_u64(headers, "x-ratelimit-remaining")
}

fn header_u64(headers: &HeaderMap, name: &str) -> Option<u64> {
    headers.get(name)?.to_str().ok()?.trim().parse().ok()
}

fn clamp_delay(delay: Duration) -> Duration {
    delay.min(MAX_DELAY)
}
