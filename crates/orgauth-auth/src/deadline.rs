//! Deadlines for external store calls.

use std::time::Duration;

use orgauth_core::error::{CoreError, CoreResult};

/// Run a store call, failing with [`CoreError::Timeout`] once `limit`
/// elapses. Whatever the store committed before the deadline stays
/// committed.
pub async fn bounded<T, F>(limit: Duration, call: F) -> CoreResult<T>
where
    F: Future<Output = CoreResult<T>>,
{
    tokio::time::timeout(limit, call)
        .await
        .unwrap_or(Err(CoreError::Timeout))
}
