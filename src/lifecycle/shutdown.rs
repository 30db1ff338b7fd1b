//! Cleanup handlers and their concurrent fan-out.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::JoinSet;

use crate::lifecycle::token::ShutdownToken;

/// Error returned by a cleanup handler.
pub type CleanupError = Box<dyn std::error::Error + Send + Sync>;

/// A component that releases its own resources during shutdown.
///
/// Handlers run concurrently with every other registered handler and must
/// not depend on each other. Each receives the same [`ShutdownToken`] and is
/// expected to give up once it is done.
#[async_trait]
pub trait CleanupHandler: Send + Sync {
    /// Name used in log events.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    async fn shutdown(&self, token: &ShutdownToken) -> Result<(), CleanupError>;
}

/// A [`CleanupHandler`] backed by an async closure.
pub struct FnHandler<F> {
    name: String,
    f: F,
}

#[async_trait]
impl<F, Fut> CleanupHandler for FnHandler<F>
where
    F: Fn(ShutdownToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), CleanupError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn shutdown(&self, token: &ShutdownToken) -> Result<(), CleanupError> {
        (self.f)(token.clone()).await
    }
}

/// Build a shareable cleanup handler from an async closure.
pub fn cleanup_fn<F, Fut>(name: impl Into<String>, f: F) -> Arc<dyn CleanupHandler>
where
    F: Fn(ShutdownToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), CleanupError>> + Send + 'static,
{
    Arc::new(FnHandler {
        name: name.into(),
        f,
    })
}

/// Outcome counts of one cleanup fan-out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupSummary {
    pub succeeded: usize,
    pub failed: usize,
    pub panicked: usize,
}

impl CleanupSummary {
    pub fn total(&self) -> usize {
        self.succeeded + self.failed + self.panicked
    }
}

/// Run every handler concurrently and wait for all of them.
///
/// Failures and panics are logged and counted; they never stop the other
/// handlers. Dropping the returned future aborts the handlers still running.
pub async fn run_cleanup_handlers(
    handlers: &[Arc<dyn CleanupHandler>],
    token: &ShutdownToken,
) -> CleanupSummary {
    let mut tasks = JoinSet::new();
    for handler in handlers {
        let handler = Arc::clone(handler);
        let token = token.clone();
        tasks.spawn(async move {
            let result = handler.shutdown(&token).await;
            (handler.name().to_string(), result)
        });
    }

    let mut summary = CleanupSummary::default();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((name, Ok(()))) => {
                tracing::debug!(component = "http-server", handler = %name, "Cleanup handler finished");
                summary.succeeded += 1;
            }
            Ok((name, Err(e))) => {
                tracing::error!(
                    component = "http-server",
                    handler = %name,
                    error = %e,
                    "Cleanup handler failed"
                );
                summary.failed += 1;
            }
            Err(e) => {
                tracing::error!(component = "http-server", error = %e, "Cleanup handler panicked");
                summary.panicked += 1;
            }
        }
    }
    summary
}
