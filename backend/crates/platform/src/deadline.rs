//! Operation deadlines
//!
//! Every call to the identity store, the session store or the identity
//! provider is bounded. Dropping the wrapped future aborts the in-flight I/O.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("operation deadline of {0:?} elapsed")]
pub struct DeadlineElapsed(pub Duration);

/// Run `fut` to completion or give up after `limit`.
pub async fn with_deadline<F, T>(limit: Duration, fut: F) -> Result<T, DeadlineElapsed>
where
    F: Future<Output = T>,
{
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| DeadlineElapsed(limit))
}
