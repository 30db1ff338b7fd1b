//! HTTP server with graceful shutdown orchestration.
//!
//! # Responsibilities
//! - Wrap the caller's Axum Router (plus request tracing)
//! - Load TLS credentials and bind the listener
//! - Wait for the lifecycle token, then run the shutdown sequence:
//!   cleanup handlers in parallel → join → drain listener
//! - Bound the whole sequence by the grace period (watchdog)
//! - Publish state transitions on a watch channel
//!
//! # States
//! ```text
//! Idle → Running → ShuttingDown → Stopped
//!                               ↘ ForcedExit
//! ```

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use thiserror::Error;
use tokio::sync::watch;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::lifecycle::exit::{fatal_exit, EXIT_OK};
use crate::lifecycle::shutdown::{run_cleanup_handlers, CleanupHandler, CleanupSummary};
use crate::lifecycle::signals::SignalBridge;
use crate::lifecycle::state::{ForcedExitReason, ServerState};
use crate::lifecycle::token::{ShutdownToken, TokenError};
use crate::lifecycle::watchdog::Watchdog;
use crate::net::listener::{Listener, ListenerError};
use crate::net::tls::{load_tls_config, TlsError};

/// Extra time the process-level watchdog allows on top of the grace period.
///
/// The in-runtime deadline is the primary bound; the OS-thread watchdog only
/// matters when the runtime itself stops making progress.
pub const WATCHDOG_MARGIN: Duration = Duration::from_millis(100);

/// Fatal startup and serving errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// TLS is enabled but a path is missing from the configuration.
    #[error("TLS is enabled but {0} is not configured")]
    TlsConfig(&'static str),

    #[error(transparent)]
    Tls(#[from] TlsError),

    #[error(transparent)]
    Listener(#[from] ListenerError),
}

/// What happened during one shutdown sequence.
#[derive(Debug, Clone)]
pub struct ShutdownReport {
    /// Terminal state reached.
    pub state: ServerState,
    /// Handler outcomes; zero counts for handlers abandoned at the deadline.
    pub cleanup: CleanupSummary,
    /// When the lifecycle token was observed cancelled.
    pub started_at: Instant,
    /// When every cleanup handler had returned, if they all did in time.
    pub handlers_joined_at: Option<Instant>,
    /// When the listener finished closing, if it was closed gracefully.
    pub listener_closed_at: Option<Instant>,
    /// When the terminal state was reached.
    pub finished_at: Instant,
}

impl ShutdownReport {
    pub fn elapsed(&self) -> Duration {
        self.finished_at.duration_since(self.started_at)
    }
}

/// Handle to a server started without orchestration (see [`HttpServer::start`]).
pub struct ServerHandle {
    listener: Listener,
}

impl ServerHandle {
    pub fn local_addr(&self) -> std::net::SocketAddr {
        self.listener.local_addr()
    }

    /// Stop accepting and drain; `None` waits for every connection.
    pub async fn shutdown(self, grace: Option<Duration>) -> Result<(), ServerError> {
        self.listener.close_with_grace(grace).await?;
        tracing::info!(component = "http-server", "Server stopped (test mode)");
        Ok(())
    }
}

/// HTTP server wrapping a router and its listener configuration.
pub struct HttpServer {
    router: Router,
    config: ServerConfig,
    signal_force_exit: Option<Duration>,
    state: watch::Sender<ServerState>,
}

impl HttpServer {
    /// Create a new server for `router` with the given configuration.
    pub fn new(router: Router, config: ServerConfig) -> Self {
        let router = router.layer(TraceLayer::new_for_http());
        let (state, _) = watch::channel(ServerState::Idle);
        Self {
            router,
            config,
            signal_force_exit: None,
            state,
        }
    }

    /// Exit the process if it is still running `timeout` after the first
    /// termination signal. Only used by [`start_with_graceful_shutdown`].
    ///
    /// [`start_with_graceful_shutdown`]: HttpServer::start_with_graceful_shutdown
    pub fn with_signal_force_exit(mut self, timeout: Duration) -> Self {
        self.signal_force_exit = Some(timeout);
        self
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Subscribe to state transitions.
    pub fn state(&self) -> watch::Receiver<ServerState> {
        self.state.subscribe()
    }

    /// Serve until a termination signal (or `parent` cancellation), then shut
    /// down gracefully within `grace`.
    ///
    /// Returns only after a clean stop. Every fatal path (TLS or bind
    /// failure, listener failure, watchdog timeout, listener shutdown
    /// failure) logs and terminates the process with a non-zero status.
    pub async fn start_with_graceful_shutdown(
        self,
        parent: CancellationToken,
        grace: Duration,
        handlers: Vec<Arc<dyn CleanupHandler>>,
    ) {
        let mut bridge = SignalBridge::new().with_parent(parent);
        if let Some(timeout) = self.signal_force_exit {
            bridge = bridge.force_exit_after(timeout);
        }
        let lifecycle = match bridge.install() {
            Ok(token) => token,
            Err(e) => fatal_exit(&format!("failed to install signal handlers: {e}")),
        };

        match self.orchestrate(lifecycle, grace, &handlers, true).await {
            Ok(report) => match report.state.exit_code() {
                Some(EXIT_OK) => {}
                _ => fatal_exit(&report.state.to_string()),
            },
            Err(e) => fatal_exit(&e.to_string()),
        }
    }

    /// Embeddable form of the orchestrator.
    ///
    /// Serves until `lifecycle` is cancelled, then runs the shutdown
    /// sequence. Fatal conditions are returned instead of exiting: startup
    /// and serving failures as `Err`, forced exits as
    /// [`ServerState::ForcedExit`] in the report. No signal handlers are
    /// installed.
    pub async fn run(
        self,
        lifecycle: CancellationToken,
        grace: Duration,
        handlers: Vec<Arc<dyn CleanupHandler>>,
    ) -> Result<ShutdownReport, ServerError> {
        self.orchestrate(lifecycle, grace, &handlers, false).await
    }

    /// Bind and serve without signal handling or a shutdown sequence.
    pub async fn start(self) -> Result<ServerHandle, ServerError> {
        let listener = self.bind().await?;
        tracing::info!(
            component = "http-server",
            addr = %listener.local_addr(),
            "Server started (test mode)"
        );
        Ok(ServerHandle { listener })
    }

    async fn orchestrate(
        self,
        lifecycle: CancellationToken,
        grace: Duration,
        handlers: &[Arc<dyn CleanupHandler>],
        process_watchdog: bool,
    ) -> Result<ShutdownReport, ServerError> {
        let mut listener = self.bind().await?;
        self.state.send_replace(ServerState::Running);
        tracing::info!(
            component = "http-server",
            addr = %listener.local_addr(),
            tls = self.config.tls_enabled,
            handlers = handlers.len(),
            "Starting server"
        );

        tokio::select! {
            _ = lifecycle.cancelled() => {}
            err = listener.failed() => {
                tracing::error!(component = "http-server", error = %err, "Server failed");
                return Err(err.into());
            }
        }

        tracing::info!(
            component = "http-server",
            grace_ms = grace.as_millis() as u64,
            open_connections = listener.connection_count(),
            "Shutdown signal received"
        );
        Ok(self.shut_down(listener, grace, handlers, process_watchdog).await)
    }

    async fn bind(&self) -> Result<Listener, ServerError> {
        let tls = if self.config.tls_enabled {
            let cert = self
                .config
                .tls_cert_path
                .as_deref()
                .ok_or(ServerError::TlsConfig("tls_cert_path"))?;
            let key = self
                .config
                .tls_key_path
                .as_deref()
                .ok_or(ServerError::TlsConfig("tls_key_path"))?;

            match load_tls_config(cert, key).await {
                Ok(tls) => Some(tls),
                Err(e) => {
                    tracing::error!(component = "http-server", error = %e, "Failed to load TLS certificate");
                    return Err(e.into());
                }
            }
        } else {
            None
        };

        Listener::serve(self.config.bind_addr(), tls, self.router.clone())
            .await
            .map_err(|e| {
                tracing::error!(component = "http-server", error = %e, "Server failed");
                e.into()
            })
    }

    async fn shut_down(
        &self,
        listener: Listener,
        grace: Duration,
        handlers: &[Arc<dyn CleanupHandler>],
        process_watchdog: bool,
    ) -> ShutdownReport {
        self.state.send_replace(ServerState::ShuttingDown);
        let started_at = Instant::now();
        let token = ShutdownToken::with_timeout(grace);

        let watchdog = if process_watchdog {
            arm_process_watchdog(grace + WATCHDOG_MARGIN)
        } else {
            None
        };

        let mut report = ShutdownReport {
            state: ServerState::ShuttingDown,
            cleanup: CleanupSummary::default(),
            started_at,
            handlers_joined_at: None,
            listener_closed_at: None,
            finished_at: started_at,
        };

        let joined = tokio::time::timeout_at(token.deadline(), run_cleanup_handlers(handlers, &token)).await;
        let state = match joined {
            Err(_) => {
                listener.shutdown_now();
                ServerState::ForcedExit(ForcedExitReason::WatchdogExpired)
            }
            Ok(summary) => {
                report.cleanup = summary;
                report.handlers_joined_at = Some(Instant::now());

                match listener.close(&token).await {
                    Ok(()) => {
                        report.listener_closed_at = Some(Instant::now());
                        ServerState::Stopped
                    }
                    Err(ListenerError::Drain(TokenError::DeadlineExceeded)) => {
                        ServerState::ForcedExit(ForcedExitReason::WatchdogExpired)
                    }
                    Err(e) => {
                        tracing::error!(component = "http-server", error = %e, "HTTP server shutdown failed");
                        ServerState::ForcedExit(ForcedExitReason::ListenerShutdown(e.to_string()))
                    }
                }
            }
        };

        report.finished_at = Instant::now();
        match &state {
            ServerState::Stopped => tracing::info!(
                component = "http-server",
                elapsed_ms = report.elapsed().as_millis() as u64,
                handlers_ok = report.cleanup.succeeded,
                handlers_failed = report.cleanup.failed + report.cleanup.panicked,
                "Shutdown complete"
            ),
            ServerState::ForcedExit(ForcedExitReason::WatchdogExpired) => tracing::error!(
                component = "http-server",
                elapsed_ms = report.elapsed().as_millis() as u64,
                "Graceful shutdown timed out, forcing exit"
            ),
            _ => {}
        }

        if let Some(watchdog) = watchdog {
            watchdog.disarm();
        }
        self.state.send_replace(state.clone());
        report.state = state;
        report
    }
}

fn arm_process_watchdog(timeout: Duration) -> Option<Watchdog> {
    let armed = Watchdog::arm("shutdown", timeout, || {
        fatal_exit("graceful shutdown timed out, forcing exit");
    });
    match armed {
        Ok(watchdog) => Some(watchdog),
        Err(e) => {
            tracing::warn!(component = "http-server", error = %e, "Failed to arm shutdown watchdog");
            None
        }
    }
}
