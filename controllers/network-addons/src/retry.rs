//! Bounded retry for flaky API operations.
//!
//! Status writes race with other actors updating the same object; a
//! short fixed-delay retry absorbs the resulting conflicts without
//! hiding persistent failures.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

/// Runs `op` up to `max_attempts` times, sleeping `delay` between failed
/// attempts. Returns the first success or the last error. `max_attempts`
/// of zero still runs the operation once.
pub async fn retry_fixed<T, E, F, Fut>(
    max_attempts: u32,
    delay: Duration,
    mut op: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < max_attempts => {
                warn!(attempt, error = %err, "operation failed, retrying");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn returns_first_success_without_retrying() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, String> = retry_fixed(3, Duration::ZERO, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok(7) }
        })
        .await;

        assert_eq!(result, Ok(7));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_until_success_within_bound() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, String> = retry_fixed(3, Duration::ZERO, || {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if n < 3 {
                    Err("conflict".to_owned())
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        assert_eq!(result, Ok(3));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let result: Result<(), String> = retry_fixed(3, Duration::ZERO, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err("conflict".to_owned()) }
        })
        .await;

        assert_eq!(result, Err("conflict".to_owned()));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
