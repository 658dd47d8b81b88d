use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;

/// Retry `operation` with exponential backoff, doubling the delay each
/// attempt up to `max_delay`.
pub async fn retry_with_backoff<F, Fut, T, E>(
    mut operation: F,
    max_retries: usize,
    initial_delay: Duration,
    max_delay: Duration,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut delay = initial_delay;
    let mut attempt = 0;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < max_retries => {
                attempt += 1;
                tracing::warn!(
                    "Attempt {} failed: {}. Retrying in {:?}...",
                    attempt,
                    err,
                    delay
                );
                sleep(delay).await;
                delay = (delay * 2).min(max_delay);
            }
            Err(err) => return Err(err),
        }
    }
}
