//! Listener ownership: bind, serve in the background, close once.
//!
//! # Responsibilities
//! - Bind the configured address (plain TCP or rustls)
//! - Serve the router on a background task
//! - Report listener failures that were not caused by our own close
//! - Drain in-flight connections within the shutdown deadline
//!
//! # Design Decisions
//! - `close` and `shutdown_now` consume the listener, so it can only be
//!   closed once
//! - Draining is delegated to the axum-server `Handle`

use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use axum_server::tls_rustls::RustlsConfig;
use axum_server::Handle;
use thiserror::Error;
use tokio::task::JoinHandle;

use crate::lifecycle::token::{ShutdownToken, TokenError};

/// Error type for listener operations.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// Failed to bind to address.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
    /// The serve loop ended with an error.
    #[error("listener failed: {0}")]
    Serve(#[source] std::io::Error),
    /// The serve loop stopped although nobody closed the listener.
    #[error("listener stopped unexpectedly")]
    Stopped,
    /// The serve task panicked or was cancelled.
    #[error("listener task failed: {0}")]
    Task(String),
    /// Connections did not drain before the shutdown token was done.
    #[error("listener did not drain: {0}")]
    Drain(#[source] TokenError),
}

/// A bound listener serving a router in the background.
pub struct Listener {
    local_addr: SocketAddr,
    handle: Handle,
    task: JoinHandle<std::io::Result<()>>,
}

impl Listener {
    /// Bind `addr` and start serving `app`, over TLS when `tls` is set.
    pub async fn serve(
        addr: SocketAddr,
        tls: Option<RustlsConfig>,
        app: Router,
    ) -> Result<Self, ListenerError> {
        let bind_err = |source| ListenerError::Bind { addr, source };

        let listener = tokio::net::TcpListener::bind(addr).await.map_err(bind_err)?;
        let local_addr = listener.local_addr().map_err(bind_err)?;
        let std_listener = listener.into_std().map_err(bind_err)?;

        let handle = Handle::new();
        let service = app.into_make_service();
        let task = match tls {
            Some(tls) => {
                let server = axum_server::tls_rustls::from_tcp_rustls(std_listener, tls)
                    .handle(handle.clone());
                tokio::spawn(async move { server.serve(service).await })
            }
            None => {
                let server = axum_server::from_tcp(std_listener).handle(handle.clone());
                tokio::spawn(async move { server.serve(service).await })
            }
        };

        Ok(Self {
            local_addr,
            handle,
            task,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Connections currently open on this listener.
    pub fn connection_count(&self) -> usize {
        self.handle.connection_count()
    }

    /// Resolves only if the serve loop ends without being closed.
    ///
    /// After this returns the listener is gone; do not call `close`.
    pub async fn failed(&mut self) -> ListenerError {
        match (&mut self.task).await {
            Ok(Ok(())) => ListenerError::Stopped,
            Ok(Err(e)) => ListenerError::Serve(e),
            Err(e) => ListenerError::Task(e.to_string()),
        }
    }

    /// Stop accepting and drain in-flight connections within `token`.
    pub async fn close(self, token: &ShutdownToken) -> Result<(), ListenerError> {
        let Listener { handle, task, .. } = self;

        handle.graceful_shutdown(Some(token.remaining()));
        match token.run(task).await {
            Ok(Ok(Ok(()))) => Ok(()),
            Ok(Ok(Err(e))) => Err(ListenerError::Serve(e)),
            Ok(Err(e)) => Err(ListenerError::Task(e.to_string())),
            Err(reason) => {
                handle.shutdown();
                Err(ListenerError::Drain(reason))
            }
        }
    }

    /// Close immediately, dropping open connections.
    pub fn shutdown_now(self) {
        self.handle.shutdown();
    }

    /// Graceful close without a shutdown token; `None` waits indefinitely.
    pub async fn close_with_grace(self, grace: Option<Duration>) -> Result<(), ListenerError> {
        self.handle.graceful_shutdown(grace);
        match self.task.await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(ListenerError::Serve(e)),
            Err(e) => Err(ListenerError::Task(e.to_string())),
        }
    }
}
