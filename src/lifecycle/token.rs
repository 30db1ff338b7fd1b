//! Deadline-bearing cancellation token handed to every shutdown participant.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Why a [`ShutdownToken`] is done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    /// The token was cancelled explicitly.
    #[error("shutdown cancelled")]
    Cancelled,
    /// The grace period elapsed.
    #[error("shutdown deadline exceeded")]
    DeadlineExceeded,
}

/// A cancellation flag paired with an expiry instant.
///
/// Clones share the same flag, so cancelling one cancels all of them. The
/// token is "done" once it is cancelled or its deadline has passed. Holders
/// are expected to bound their own blocking work with [`ShutdownToken::done`]
/// or [`ShutdownToken::run`]; nothing interrupts a task that ignores it.
#[derive(Debug, Clone)]
pub struct ShutdownToken {
    cancel: CancellationToken,
    deadline: Instant,
}

impl ShutdownToken {
    /// Token expiring `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    /// Token expiring at `deadline`.
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            cancel: CancellationToken::new(),
            deadline,
        }
    }

    /// Token that is also cancelled when `parent` is cancelled.
    pub fn child_of(parent: &CancellationToken, timeout: Duration) -> Self {
        Self {
            cancel: parent.child_token(),
            deadline: Instant::now() + timeout,
        }
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Time left before the deadline, zero once it has passed.
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_done(&self) -> bool {
        self.err().is_some()
    }

    /// `None` while live, otherwise the reason the token is done.
    ///
    /// Explicit cancellation wins over an expired deadline.
    pub fn err(&self) -> Option<TokenError> {
        if self.cancel.is_cancelled() {
            Some(TokenError::Cancelled)
        } else if Instant::now() >= self.deadline {
            Some(TokenError::DeadlineExceeded)
        } else {
            None
        }
    }

    /// Resolves once the token is cancelled or the deadline passes.
    pub async fn done(&self) -> TokenError {
        tokio::select! {
            _ = self.cancel.cancelled() => TokenError::Cancelled,
            _ = tokio::time::sleep_until(self.deadline) => TokenError::DeadlineExceeded,
        }
    }

    /// Run `fut` until it completes or the token is done.
    pub async fn run<F: Future>(&self, fut: F) -> Result<F::Output, TokenError> {
        tokio::select! {
            biased;
            out = fut => Ok(out),
            reason = self.done() => Err(reason),
        }
    }
}
