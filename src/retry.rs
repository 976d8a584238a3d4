use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Evenly spaced retry policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Attempts per call, including the first. Zero is treated as one.
    pub max_attempts: u32,
    /// Wait before every attempt after the first
    pub delay: Duration,
}

impl RetryConfig {
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    /// Preset: translation dictionary fetches (3 attempts, 1s apart)
    pub fn translation_fetch() -> Self {
        Self::fixed(3, Duration::from_secs(1))
    }

    fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::translation_fetch()
    }
}

/// Run `operation` until it succeeds or the attempts run out, returning the
/// last error in that case. Attempts never overlap.
pub async fn with_retry<T, E, F, Fut>(
    config: &RetryConfig,
    operation_name: &str,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let attempts = config.attempts();
    let mut attempt = 1;

    loop {
        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    debug!("{}: Succeeded on attempt {}/{}", operation_name, attempt, attempts);
                }
                return Ok(result);
            }
            Err(e) if attempt >= attempts => {
                warn!(
                    "{}: All {} attempts failed. Last error: {}",
                    operation_name, attempts, e
                );
                return Err(e);
            }
            Err(e) => {
                warn!(
                    "{}: Attempt {}/{} failed ({}), retrying in {:?}",
                    operation_name, attempt, attempts, e, config.delay
                );
            }
        }

        if !config.delay.is_zero() {
            sleep(config.delay).await;
        }
        attempt += 1;
    }
}
