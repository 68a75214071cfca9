// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Exponential backoff with jitter, and the startup reachability probe.

use std::time::Duration;

use rand::Rng;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Exponential backoff schedule: base 1 s, factor 2, capped at 5 min,
/// with ±10% jitter on every delay. `reset` returns to base after a
/// success.
pub struct Backoff {
    base: Duration,
    max: Duration,
    next: Duration,
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new()
    }
}

impl Backoff {
    pub fn new() -> Self {
        Self::with_schedule(Duration::from_secs(1), Duration::from_secs(300))
    }

    /// Custom schedule, used by tests and short-lived probes.
    pub fn with_schedule(base: Duration, max: Duration) -> Self {
        Self { base, max, next: base }
    }

    /// The next delay to sleep, advancing the schedule.
    pub fn next_delay(&mut self) -> Duration {
        let current = self.next;
        self.next = (self.next * 2).min(self.max);
        jitter(current)
    }

    pub fn reset(&mut self) {
        self.next = self.base;
    }
}

/// Apply ±10% jitter.
fn jitter(d: Duration) -> Duration {
    let factor: f64 = rand::thread_rng().gen_range(0.9..=1.1);
    d.mul_f64(factor)
}

#[derive(Debug, Error)]
pub enum ProbeError {
    /// The request could not even be constructed; retrying cannot help.
    #[error("cannot prepare reachability request for {url}: {reason}")]
    Fatal { url: String, reason: String },

    /// Every allowed attempt failed with a transient error.
    #[error("{url} unreachable after {attempts} attempts: {last}")]
    Exhausted { url: String, attempts: u64, last: String },

    #[error("cancelled while waiting for network")]
    Cancelled,
}

/// Block until the collector endpoint answers anything at all.
///
/// Any HTTP status counts as reachability; only transport-level failures
/// are retried, on the supplied backoff schedule. `max_retries < 0` retries
/// forever. An empty URL is immediately reachable.
pub async fn wait_for_network(
    client: &reqwest::Client,
    url: &str,
    timeout: Duration,
    max_retries: i64,
    backoff: &mut Backoff,
    cancel: &CancellationToken,
) -> Result<(), ProbeError> {
    if url.is_empty() {
        return Ok(());
    }

    let mut remaining = max_retries;
    let mut attempts: u64 = 0;
    loop {
        attempts += 1;
        match client.head(url).timeout(timeout).send().await {
            Ok(response) => {
                debug!(status = %response.status(), "collector endpoint reachable");
                return Ok(());
            }
            Err(e) if e.is_builder() => {
                return Err(ProbeError::Fatal { url: url.to_string(), reason: e.to_string() });
            }
            Err(e) => {
                warn!("collector endpoint not reachable yet: {e}");
                if max_retries >= 0 {
                    remaining -= 1;
                    if remaining < 0 {
                        return Err(ProbeError::Exhausted {
                            url: url.to_string(),
                            attempts,
                            last: e.to_string(),
                        });
                    }
                }
                let delay = backoff.next_delay();
                tokio::select! {
                    _ = cancel.cancelled() => return Err(ProbeError::Cancelled),
                    _ = tokio::time::sleep(delay) => {}
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod tests;
