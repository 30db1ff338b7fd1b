//! OS signal handling.
//!
//! # Responsibilities
//! - Register handlers for SIGINT, SIGTERM, SIGHUP and SIGQUIT
//! - Turn the first of them into a cancelled [`CancellationToken`]
//! - Optionally arm a force-exit watchdog once cancellation happens
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe, no polling)
//! - Signals are forwarded into a channel; [`relay`] owns the one-shot
//!   transition and is driven the same way by real and synthetic signals
//! - Repeat signals after the first are logged and ignored
//! - Once registered, the default action of these signals is replaced for the
//!   lifetime of the process

use std::fmt;
use std::io;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::lifecycle::exit::fatal_exit;
use crate::lifecycle::watchdog::Watchdog;

/// Termination signals that start a shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationSignal {
    Interrupt,
    Terminate,
    Hangup,
    Quit,
}

impl fmt::Display for TerminationSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TerminationSignal::Interrupt => "SIGINT",
            TerminationSignal::Terminate => "SIGTERM",
            TerminationSignal::Hangup => "SIGHUP",
            TerminationSignal::Quit => "SIGQUIT",
        };
        f.write_str(name)
    }
}

/// What the relay observed before its signal source closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RelayReport {
    /// The signal that caused cancellation, `None` if the parent scope did.
    pub first: Option<TerminationSignal>,
    /// Signals received after cancellation.
    pub ignored: usize,
}

/// Cancel `token` on the first signal from `signals`, or observe its
/// cancellation by a parent scope.
///
/// Logs the shutdown notice once, then drains and ignores the remaining
/// signals until the sender side closes. A signal queued behind an
/// already-cancelled token counts as ignored.
pub async fn relay(
    mut signals: mpsc::Receiver<TerminationSignal>,
    token: CancellationToken,
) -> RelayReport {
    let first = tokio::select! {
        biased;
        _ = token.cancelled() => None,
        Some(signal) = signals.recv() => Some(signal),
    };

    match first {
        Some(signal) => {
            tracing::info!(component = "signals", signal = %signal, "Shutting down server...");
            token.cancel();
        }
        None => tracing::info!(
            component = "signals",
            "Parent scope cancelled, shutting down server..."
        ),
    }

    let mut ignored = 0;
    while let Some(signal) = signals.recv().await {
        tracing::debug!(
            component = "signals",
            signal = %signal,
            "Shutdown already in progress, ignoring signal"
        );
        ignored += 1;
    }

    RelayReport { first, ignored }
}

/// Builder for a signal-driven lifecycle token.
#[derive(Debug, Default)]
pub struct SignalBridge {
    parent: Option<CancellationToken>,
    force_exit_after: Option<Duration>,
}

impl SignalBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also cancel when `parent` is cancelled.
    pub fn with_parent(mut self, parent: CancellationToken) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Exit the process if it is still running `timeout` after cancellation.
    pub fn force_exit_after(mut self, timeout: Duration) -> Self {
        self.force_exit_after = Some(timeout);
        self
    }

    /// Register the signal handlers and return the lifecycle token.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn install(self) -> io::Result<CancellationToken> {
        let token = match &self.parent {
            Some(parent) => parent.child_token(),
            None => CancellationToken::new(),
        };

        let (tx, rx) = mpsc::channel(4);
        spawn_signal_listener(tx)?;
        tokio::spawn(relay(rx, token.clone()));

        if let Some(timeout) = self.force_exit_after {
            let token = token.clone();
            tokio::spawn(async move {
                token.cancelled().await;
                let watchdog = Watchdog::arm("signal", timeout, || {
                    fatal_exit("graceful shutdown timed out, forcing exit");
                });
                if let Err(e) = &watchdog {
                    tracing::warn!(component = "signals", error = %e, "Failed to arm signal watchdog");
                }
                // Held until the runtime shuts down.
                std::future::pending::<()>().await;
                drop(watchdog);
            });
        }

        Ok(token)
    }
}

/// Lifecycle token cancelled by the first termination signal.
pub fn signal_token() -> io::Result<CancellationToken> {
    SignalBridge::new().install()
}

#[cfg(unix)]
fn spawn_signal_listener(tx: mpsc::Sender<TerminationSignal>) -> io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;
    let mut hangup = signal(SignalKind::hangup())?;
    let mut quit = signal(SignalKind::quit())?;

    tokio::spawn(async move {
        loop {
            let received = tokio::select! {
                Some(()) = interrupt.recv() => TerminationSignal::Interrupt,
                Some(()) = terminate.recv() => TerminationSignal::Terminate,
                Some(()) = hangup.recv() => TerminationSignal::Hangup,
                Some(()) = quit.recv() => TerminationSignal::Quit,
                else => break,
            };
            if tx.send(received).await.is_err() {
                break;
            }
        }
    });
    Ok(())
}

#[cfg(not(unix))]
fn spawn_signal_listener(tx: mpsc::Sender<TerminationSignal>) -> io::Result<()> {
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if tx.send(TerminationSignal::Interrupt).await.is_err() {
                break;
            }
        }
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn first_signal_cancels_and_repeats_are_ignored() {
        let token = CancellationToken::new();
        let (tx, rx) = mpsc::channel(4);
        let relay_task = tokio::spawn(relay(rx, token.clone()));

        tx.send(TerminationSignal::Terminate).await.unwrap();
        token.cancelled().await;

        tx.send(TerminationSignal::Interrupt).await.unwrap();
        tx.send(TerminationSignal::Terminate).await.unwrap();
        drop(tx);

        let report = relay_task.await.unwrap();
        assert_eq!(report.first, Some(TerminationSignal::Terminate));
        assert_eq!(report.ignored, 2);
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn parent_cancellation_without_signal() {
        let parent = CancellationToken::new();
        let token = parent.child_token();
        let (tx, rx) = mpsc::channel(4);
        let relay_task = tokio::spawn(relay(rx, token.clone()));

        parent.cancel();
        token.cancelled().await;
        drop(tx);

        let report = relay_task.await.unwrap();
        assert_eq!(report, RelayReport { first: None, ignored: 0 });
    }

    #[tokio::test]
    async fn signal_after_parent_cancellation_is_not_the_trigger() {
        let token = CancellationToken::new();
        let (tx, rx) = mpsc::channel(4);
        token.cancel();
        tx.send(TerminationSignal::Interrupt).await.unwrap();
        drop(tx);

        let report = relay(rx, token).await;
        assert_eq!(
            report,
            RelayReport {
                first: None,
                ignored: 1
            }
        );
    }

    #[tokio::test]
    async fn closed_source_waits_for_parent() {
        let token = CancellationToken::new();
        let (tx, rx) = mpsc::channel(1);
        drop(tx);
        let relay_task = tokio::spawn(relay(rx, token.clone()));

        tokio::task::yield_now().await;
        assert!(!relay_task.is_finished());

        token.cancel();
        let report = relay_task.await.unwrap();
        assert_eq!(report.first, None);
    }

    #[test]
    fn signal_names() {
        assert_eq!(TerminationSignal::Hangup.to_string(), "SIGHUP");
        assert_eq!(TerminationSignal::Quit.to_string(), "SIGQUIT");
    }
}
