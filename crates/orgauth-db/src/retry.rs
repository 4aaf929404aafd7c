//! Re-running single-statement writes that lose a transaction race.
//!
//! The record store uses optimistic transactions: when two statements
//! touch the same record at once, one of them is aborted with a conflict
//! instead of waiting. Every guarded write here is a single statement
//! whose `WHERE` clause is re-evaluated on each attempt, so re-running it
//! lets the guard decide the outcome rather than the storage engine.

use std::time::Duration;

use rand::Rng;
use tracing::{debug, warn};

use crate::error::DbError;

/// Attempts before a conflict is reported to the caller.
const MAX_ATTEMPTS: u32 = 32;
const BASE_DELAY: Duration = Duration::from_millis(2);
const MAX_DELAY: Duration = Duration::from_millis(100);

/// Run `op`, re-running it after a jittered backoff while it fails with
/// [`DbError::Conflict`]. Any other outcome is returned as is.
pub(crate) async fn on_conflict<T, F, Fut>(
    statement: &'static str,
    mut op: F,
) -> Result<T, DbError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DbError>>,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Err(e) if e.is_conflict() && attempt < MAX_ATTEMPTS => {
                let delay = backoff(attempt);
                debug!(statement, attempt, ?delay, "Transaction conflict, retrying");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) if e.is_conflict() => {
                warn!(statement, attempts = attempt, "Transaction conflict persisted");
                return Err(e);
            }
            other => return other,
        }
    }
}

/// Full-jitter exponential backoff: uniform in `[0, min(base * 2^n, cap)]`.
fn backoff(attempt: u32) -> Duration {
    let pow = 1u32 << attempt.saturating_sub(1).min(10);
    let ceiling = BASE_DELAY.saturating_mul(pow).min(MAX_DELAY);
    let ms = ceiling.as_millis() as u64;
    Duration::from_millis(rand::rng().random_range(0..=ms))
}
