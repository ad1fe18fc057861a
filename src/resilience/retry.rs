use tokio::time::{sleep, Duration};
use tracing::{error, warn};

use crate::config::settings::RetryConfig;
use crate::errors::RefreshError;
use crate::utils::constants::{
    DEFAULT_RETRY_ATTEMPTS, DEFAULT_RETRY_BASE_DELAY_MS, DEFAULT_RETRY_MAX_DELAY_MS,
};

#[derive(Debug, Clone)]
pub struct RetrySettings {
    pub attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self::from(None)
    }
}

impl From<Option<&RetryConfig>> for RetrySettings {
    fn from(retry: Option<&RetryConfig>) -> Self {
        Self {
            attempts: retry.and_then(|r| r.attempts).unwrap_or(DEFAULT_RETRY_ATTEMPTS).max(1),
            base_delay_ms: retry.and_then(|r| r.base_delay_ms).unwrap_or(DEFAULT_RETRY_BASE_DELAY_MS),
            max_delay_ms: retry.and_then(|r| r.max_delay_ms).unwrap_or(DEFAULT_RETRY_MAX_DELAY_MS),
        }
    }
}

impl RetrySettings {
    /// Doubles `delay`, capped at `max_delay_ms`
    fn next_delay(&self, delay: u64) -> u64 {
        delay.saturating_mul(2).min(self.max_delay_ms)
    }

    /// Retries transient failures only; a provider rejection is final.
    pub async fn run_with_retry<F, Fut, T>(&self, mut operation: F) -> Result<T, RefreshError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, RefreshError>>,
    {
        let mut delay = self.base_delay_ms;
        let mut attempt = 1;

        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < self.attempts => {
                    warn!("Attempt {attempt}/{} failed: {e}", self.attempts);
                    sleep(Duration::from_millis(delay)).await;
                    delay = self.next_delay(delay);
                    attempt += 1;
                }
                Err(e) => {
                    error!("token exchange failed after {attempt} attempt(s): {e}");
                    return Err(e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn backoff_doubles_up_to_max_without_overflow() {
        let retry = RetrySettings { attempts: 5, base_delay_ms: 200, max_delay_ms: 1000 };
        assert_eq!(retry.next_delay(200), 400);
        assert_eq!(retry.next_delay(800), 1000);

        let unbounded = RetrySettings { attempts: 5, base_delay_ms: u64::MAX, max_delay_ms: u64::MAX };
        assert_eq!(unbounded.next_delay(u64::MAX / 2 + 1), u64::MAX);
    }

    #[tokio::test]
    async fn provider_rejection_is_not_retried() {
        let retry = RetrySettings { attempts: 3, base_delay_ms: 1, max_delay_ms: 2 };
        let calls = AtomicU32::new(0);
        let result: Result<(), RefreshError> = retry
            .run_with_retry(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async {
                    Err(RefreshError::Provider { code: 40001, message: "invalid secret".into() })
                }
            })
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn zero_attempts_falls_back_to_one() {
        let cfg = RetryConfig { attempts: Some(0), base_delay_ms: None, max_delay_ms: None };
        assert_eq!(RetrySettings::from(Some(&cfg)).attempts, 1);
    }
}
