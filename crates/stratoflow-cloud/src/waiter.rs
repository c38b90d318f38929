//! Poll loops that wait for a remote resource to reach a target status
//!
//! Polling uses exponential backoff between `min_interval` and
//! `max_interval` and gives up once the timeout has passed.

use crate::error::{CloudError, Result};
use std::future::Future;
use std::time::Duration;
use tokio::time::{Instant, sleep};
use tracing::{debug, warn};

/// Wait configuration for a status transition
#[derive(Debug, Clone)]
pub struct StateChangeConf {
    /// Statuses that mean "still working on it"
    ///
    /// When empty, every status that is not a target keeps the loop going.
    pub pending: Vec<String>,

    /// Statuses that end the wait successfully
    pub target: Vec<String>,

    pub timeout: Duration,

    pub min_interval: Duration,

    pub max_interval: Duration,

    /// Consecutive "not found" results tolerated before giving up
    pub not_found_checks: u32,
}

impl StateChangeConf {
    pub fn new(pending: &[&str], target: &[&str], timeout: Duration) -> Self {
        Self {
            pending: pending.iter().map(|s| s.to_string()).collect(),
            target: target.iter().map(|s| s.to_string()).collect(),
            timeout,
            min_interval: Duration::from_secs(2),
            max_interval: Duration::from_secs(10),
            not_found_checks: 20,
        }
    }

    pub fn with_min_interval(mut self, interval: Duration) -> Self {
        self.min_interval = interval;
        self
    }

    pub fn with_max_interval(mut self, interval: Duration) -> Self {
        self.max_interval = interval;
        self
    }

    pub fn with_not_found_checks(mut self, checks: u32) -> Self {
        self.not_found_checks = checks;
        self
    }

    /// Interval before the given refresh attempt (0-based)
    pub fn interval_for_attempt(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.min(16));
        self.min_interval
            .saturating_mul(factor)
            .min(self.max_interval)
    }

    /// Poll `refresh` until the reported status is one of `target`
    ///
    /// `refresh` returns `Some((value, status))` while the object exists and
    /// `None` when the API does not know it (yet).
    pub async fn wait_for_state<T, F, Fut>(&self, mut refresh: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Option<(T, String)>>>,
    {
        let deadline = deadline_after(self.timeout);
        let mut attempt = 0u32;
        let mut not_found = 0u32;
        let mut last_status = String::from("unknown");

        loop {
            match refresh().await? {
                Some((value, status)) => {
                    not_found = 0;
                    debug!("Refresh attempt {}: status '{}'", attempt + 1, status);

                    if self.target.contains(&status) {
                        return Ok(value);
                    }
                    if !self.pending.is_empty() && !self.pending.contains(&status) {
                        return Err(CloudError::UnexpectedState {
                            status,
                            expected: self.target.clone(),
                        });
                    }
                    last_status = status;
                }
                None => {
                    not_found += 1;
                    debug!("Refresh attempt {}: not found ({})", attempt + 1, not_found);
                    if not_found > self.not_found_checks {
                        return Err(CloudError::ResourceNotFound(format!(
                            "still missing after {} checks while waiting for {}",
                            not_found,
                            self.target.join(", ")
                        )));
                    }
                    last_status = String::from("not found");
                }
            }

            let Some(interval) = next_sleep(deadline, self.interval_for_attempt(attempt)) else {
                return Err(CloudError::Timeout(format!(
                    "waited {:?} for status {}, last status was '{}'",
                    self.timeout,
                    self.target.join(", "),
                    last_status
                )));
            };
            sleep(interval).await;
            attempt += 1;
        }
    }

    /// Poll `refresh` until it reports that the object is gone
    ///
    /// `refresh` returns the current status while the object still exists.
    pub async fn wait_until_gone<F, Fut>(&self, mut refresh: F) -> Result<()>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Option<String>>>,
    {
        let deadline = deadline_after(self.timeout);
        let mut attempt = 0u32;

        loop {
            let status = match refresh().await? {
                None => return Ok(()),
                Some(status) => status,
            };
            debug!("Waiting for deletion, attempt {}: status '{}'", attempt + 1, status);

            let Some(interval) = next_sleep(deadline, self.interval_for_attempt(attempt)) else {
                return Err(CloudError::Timeout(format!(
                    "waited {:?} for deletion, last status was '{}'",
                    self.timeout, status
                )));
            };
            sleep(interval).await;
            attempt += 1;
        }
    }
}

/// `None` when the timeout reaches past what `Instant` can represent
fn deadline_after(timeout: Duration) -> Option<Instant> {
    Instant::now().checked_add(timeout)
}

/// Sleep before the next attempt, or `None` once the deadline has passed
fn next_sleep(deadline: Option<Instant>, interval: Duration) -> Option<Duration> {
    let Some(deadline) = deadline else {
        return Some(interval);
    };
    let now = Instant::now();
    (now < deadline).then(|| interval.min(deadline - now))
}

/// Poll until the object is gone with default intervals
pub async fn wait_until_gone<F, Fut>(timeout: Duration, refresh: F) -> Result<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<String>>>,
{
    StateChangeConf::new(&[], &[], timeout)
        .wait_until_gone(refresh)
        .await
}

/// Error classification for [`retry`]
#[derive(Debug)]
pub enum RetryError {
    /// Try again after a backoff (e.g. resource still in use)
    Retryable(CloudError),
    /// Give up immediately
    NonRetryable(CloudError),
}

/// Re-run an operation while it fails with a retryable error
pub async fn retry<T, F, Fut>(timeout: Duration, mut operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<T, RetryError>>,
{
    let conf = StateChangeConf::new(&[], &[], timeout);
    let deadline = deadline_after(timeout);
    let mut attempt = 0u32;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(RetryError::NonRetryable(e)) => return Err(e),
            Err(RetryError::Retryable(e)) => {
                let Some(interval) = next_sleep(deadline, conf.interval_for_attempt(attempt))
                else {
                    return Err(CloudError::Timeout(format!(
                        "gave up retrying after {:?}: {}",
                        timeout, e
                    )));
                };
                warn!("Retrying after error (attempt {}): {}", attempt + 1, e);
                sleep(interval).await;
                attempt += 1;
            }
        }
    }
}
