//! Request pacing for reasoning calls.
//!
//! A [`RateLimiter`] is shared by every worker in a run. Admissions are
//! serialized behind one lock and spaced at least `1 / (rps * workers)`
//! apart. [`RateLimitedProvider`] wraps any provider with that pacing plus a
//! bounded retry on transient failures.

use async_trait::async_trait;
use officeclaw_core::error::ProviderError;
use officeclaw_core::provider::*;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Minimum-interval admission gate.
pub struct RateLimiter {
    min_interval: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// `rps <= 0` or `workers == 0` disables pacing.
    pub fn new(rps: f64, workers: usize) -> Self {
        let rate = rps * workers as f64;
        let min_interval = if rate > 0.0 && rate.is_finite() {
            Duration::from_secs_f64(1.0 / rate)
        } else {
            Duration::ZERO
        };
        Self {
            min_interval,
            last_call: Mutex::new(None),
        }
    }

    pub fn disabled() -> Self {
        Self::new(0.0, 0)
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    pub fn is_enabled(&self) -> bool {
        !self.min_interval.is_zero()
    }

    /// Wait until the next call is admitted.
    pub async fn acquire(&self) {
        if !self.is_enabled() {
            return;
        }
        let mut last = self.last_call.lock().await;
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.min_interval {
                let wait = self.min_interval - elapsed;
                debug!(wait_ms = wait.as_millis() as u64, "Rate limiter: waiting");
                tokio::time::sleep(wait).await;
            }
        }
        *last = Some(Instant::now());
    }
}

/// A provider decorator that paces calls and retries transient failures.
pub struct RateLimitedProvider {
    inner: Arc<dyn Provider>,
    limiter: Arc<RateLimiter>,
    retries: u32,
}

impl RateLimitedProvider {
    pub fn new(inner: Arc<dyn Provider>, limiter: Arc<RateLimiter>) -> Self {
        Self {
            inner,
            limiter,
            retries: 0,
        }
    }

    /// Extra attempts after a rate-limit, timeout or network failure.
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    fn backoff(error: &ProviderError, attempt: u32) -> Option<Duration> {
        match error {
            ProviderError::RateLimited { retry_after_secs } => {
                Some(Duration::from_secs((*retry_after_secs).max(1)))
            }
            ProviderError::Timeout(_) | ProviderError::Network(_) => {
                Some(Duration::from_secs(u64::from(attempt)))
            }
            _ => None,
        }
    }
}

#[async_trait]
impl Provider for RateLimitedProvider {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ProviderResponse, ProviderError> {
        let mut attempt = 0;
        loop {
            self.limiter.acquire().await;
            match self.inner.complete(request.clone()).await {
                Ok(response) => return Ok(response),
                Err(e) => {
                    attempt += 1;
                    let Some(wait) = Self::backoff(&e, attempt).filter(|_| attempt <= self.retries)
                    else {
                        return Err(e);
                    };
                    warn!(
                        provider = %self.inner.name(),
                        attempt,
                        wait_secs = wait.as_secs(),
                        error = %e,
                        "Provider call failed, backing off"
                    );
                    tokio::time::sleep(wait).await;
                }
            }
        }
    }

    async fn list_models(&self) -> std::result::Result<Vec<String>, ProviderError> {
        self.inner.list_models().await
    }

    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        self.inner.health_check().await
    }
}
