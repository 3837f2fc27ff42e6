//! Per-call deadlines.

use crate::error::{VaultError, VaultResult};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// Carries the deadline a vault operation must finish by.
///
/// Cancellation is by drop: a caller that stops polling the operation's
/// future abandons it. The deadline covers the cases where nobody would.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpContext {
    deadline: Option<Instant>,
}

impl OpContext {
    /// No deadline.
    pub fn background() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Awaits `fut`, giving up with [`VaultError::DeadlineExceeded`] once the
    /// deadline passes. A context that has already expired fails before
    /// `fut` is polled, even if it would complete immediately.
    pub(crate) async fn bound<F: Future>(&self, op: &'static str, fut: F) -> VaultResult<F::Output> {
        if self.is_expired() {
            return Err(VaultError::DeadlineExceeded(op));
        }
        match self.deadline {
            None => Ok(fut.await),
            Some(deadline) => tokio::time::timeout_at(deadline, fut)
                .await
                .map_err(|_| VaultError::DeadlineExceeded(op)),
        }
    }
}
