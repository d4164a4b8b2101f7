// src/github/fetch.rs
// =============================================================================
// This module makes GET requests that survive a flaky network and GitHub's
// rate limiter.
//
// Strategy:
// - 200 OK: hand the response back straight away
// - 403 + "rate limit" in the body: sleep until the quota resets, then try
//   again WITHOUT using up a retry (rate limits are waited out, not counted)
// - 5xx or a network fault: exponential backoff with jitter, bounded retries
// - Anything else (404, 401, ...): give up immediately, retrying won't help
//
// Rust concepts:
// - loop + continue: A retry loop with explicit control flow
// - Duration: Typed time spans instead of raw seconds
// - thiserror: Typed errors (FetchError) that callers can match on
// =============================================================================

use crate::error::FetchError;
use chrono::Utc;
use reqwest::{header::HeaderMap, Client, Response, StatusCode};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Header GitHub uses to say when the rate-limit window resets (unix seconds)
const RATE_LIMIT_RESET_HEADER: &str = "x-ratelimit-reset";

// Settings for the retry loop
//
// Defaults:
//   max_retries:       5 extra attempts after the first one
//   base_delay:        1s, doubled on every retry
//   jitter:            up to 1s of random noise added to each backoff
//   rate_limit_floor:  never wait less than 60s for a rate-limit reset
//   rate_limit_margin: wait 5s past the advertised reset time
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub jitter: Duration,
    pub rate_limit_floor: Duration,
    pub rate_limit_margin: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            base_delay: Duration::from_secs(1),
            jitter: Duration::from_secs(1),
            rate_limit_floor: Duration::from_secs(60),
            rate_limit_margin: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// Backoff before retry number `retry` (1-based), without jitter.
    ///
    /// `base_delay * 2^retry`. Never decreases as `retry` grows.
    pub fn base_backoff(&self, retry: u32) -> Duration {
        // 2^31 seconds is already absurd; clamp so the shift can't overflow
        let factor = 1u32 << retry.min(31);
        self.base_delay.saturating_mul(factor)
    }

    /// Backoff before retry number `retry`, with uniform random jitter.
    pub fn backoff_delay(&self, retry: u32) -> Duration {
        self.base_backoff(retry) + self.jitter.mul_f64(rand::random::<f64>())
    }

    // How long to wait when GitHub says we are rate limited
    //
    // Parameters:
    //   reset: value of X-RateLimit-Reset (unix seconds, 0 when missing)
    //   now:   current unix time in seconds
    //
    // Returns: max(reset - now + margin, floor)
    pub fn rate_limit_wait(&self, reset: i64, now: i64) -> Duration {
        let margin = self.rate_limit_margin.as_secs() as i64;
        let until_reset = reset.saturating_sub(now).saturating_add(margin);
        let floor = self.rate_limit_floor.as_secs() as i64;
        Duration::from_secs(until_reset.max(floor).max(0) as u64)
    }
}

// A GET client with retry/backoff and rate-limit handling baked in
//
// The underlying reqwest::Client already carries the auth headers, so every
// request made through here (API calls and raw downloads alike) is
// authenticated.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    policy: RetryPolicy,
}

impl Fetcher {
    // Builds a fetcher
    //
    // Parameters:
    //   headers: default headers sent with every request (auth, accept, ...)
    //   timeout: per-request timeout
    //   policy:  retry settings
    pub fn new(
        headers: HeaderMap,
        timeout: Duration,
        policy: RetryPolicy,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(concat!("repo-harvester/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(Self { client, policy })
    }

    // Issues a GET and retries according to the policy
    //
    // Parameters:
    //   url:   absolute URL to fetch
    //   query: query-string pairs (may be empty)
    //
    // Returns: the 200 response, or a FetchError describing why we gave up
    pub async fn get(&self, url: &str, query: &[(&str, String)]) -> Result<Response, FetchError> {
        let mut retries: u32 = 0;

        loop {
            let mut request = self.client.get(url);
            if !query.is_empty() {
                request = request.query(query);
            }

            // Each arm either returns, continues (rate limit), or produces the
            // reason this attempt counts against the retry budget
            let reason = match request.send().await {
                Ok(response) => {
                    let status = response.status();
                    if status == StatusCode::OK {
                        return Ok(response);
                    }

                    let reset = rate_limit_reset(response.headers());
                    let body = response.text().await.unwrap_or_default();

                    if status == StatusCode::FORBIDDEN && is_rate_limited(&body) {
                        let wait = self.policy.rate_limit_wait(reset, Utc::now().timestamp());
                        warn!(
                            url,
                            wait_secs = wait.as_secs(),
                            "Rate limit hit, waiting for the quota to reset"
                        );
                        tokio::time::sleep(wait).await;
                        continue;
                    }

                    warn!(url, status = status.as_u16(), body = %body, "Request failed");

                    if !status.is_server_error() {
                        return Err(FetchError::Status {
                            url: url.to_string(),
                            status: status.as_u16(),
                            body,
                        });
                    }

                    format!("HTTP {}", status.as_u16())
                }
                Err(e) => describe_network_error(&e),
            };

            retries += 1;
            if retries > self.policy.max_retries {
                error!(url, attempts = retries, last_error = %reason, "Max retries reached");
                return Err(FetchError::RetriesExhausted {
                    url: url.to_string(),
                    attempts: retries,
                    last_error: reason,
                });
            }

            let delay = self.policy.backoff_delay(retries);
            info!(
                url,
                reason = %reason,
                "Retrying in {:.2} seconds... (Attempt {}/{})",
                delay.as_secs_f64(),
                retries,
                self.policy.max_retries
            );
            tokio::time::sleep(delay).await;
        }
    }
}

// GitHub puts "API rate limit exceeded" (or the secondary-limit wording) in
// the body of a 403; other 403s (e.g. a token without access) are final
fn is_rate_limited(body: &str) -> bool {
    body.to_lowercase().contains("rate limit")
}

// Reads X-RateLimit-Reset, falling back to 0 when it's absent or garbage
fn rate_limit_reset(headers: &HeaderMap) -> i64 {
    headers
        .get(RATE_LIMIT_RESET_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(0)
}

// Turns a reqwest transport error into a short human-readable reason
//
// reqwest errors can happen for many reasons:
// - Network timeout
// - Too many redirects
// - Connection refused / DNS failure
// - etc.
fn describe_network_error(error: &reqwest::Error) -> String {
    let reason = if error.is_timeout() {
        "Request timed out".to_string()
    } else if error.is_redirect() {
        "Too many redirects".to_string()
    } else if error.is_connect() {
        format!("Connection failed: {error}")
    } else {
        error.to_string()
    };
    debug!(error = %error, "network fault");
    reason
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why does the rate-limit branch `continue` without touching `retries`?
//    - A rate limit isn't a failure of the server, it's a queue
//    - Waiting for the reset always works eventually, so it never burns a retry
//
// 2. What is saturating_mul / saturating_sub?
//    - Arithmetic that clamps at the type's limits instead of overflowing
//    - Duration::saturating_mul stops at Duration::MAX
//
// 3. Why read the headers before `response.text()`?
//    - text() consumes the response (takes ownership)
//    - After that we can't look at the headers anymore
// -----------------------------------------------------------------------------
