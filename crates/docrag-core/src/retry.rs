//! Fixed-count retry with a constant delay

use std::future::Future;

use tracing::warn;

use crate::{Result, RetryConfig};

/// Run `op` until it succeeds or `config.max_attempts` attempts have failed.
///
/// Sleeps `config.delay` between attempts, never after the last one.
/// Returns the error of the final attempt.
pub async fn retry<T, F, Fut>(config: &RetryConfig, label: &str, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let attempts = config.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < attempts => {
                warn!("{} failed (attempt {}/{}): {}", label, attempt, attempts, e);
                tokio::time::sleep(config.delay).await;
                attempt += 1;
            }
            Err(e) => {
                warn!("{} failed after {} attempt(s): {}", label, attempts, e);
                return Err(e);
            }
        }
    }
}
