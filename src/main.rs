//! graceful-server demo service.
//!
//! Serves a small router and shuts down within the configured grace period
//! on SIGINT/SIGTERM/SIGHUP/SIGQUIT, stopping a background worker and
//! flushing an in-memory counter on the way out.
//!
//! Configuration: optional TOML file (`--config`), then environment
//! overrides (`PORT`, `TLS_ENABLED`, `SHUTDOWN_TIMEOUT_SECS`, ...).

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{extract::Query, routing::{get, post}, Json, Router};
use clap::Parser;
use serde::Deserialize;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use graceful_server::config::load_config;
use graceful_server::lifecycle::{cleanup_fn, CleanupError, CleanupHandler};
use graceful_server::observability::init_logging;
use graceful_server::{HttpServer, ShutdownToken};

#[derive(Parser, Debug)]
#[command(name = "graceful-server", version)]
#[command(about = "HTTP service with bounded graceful shutdown", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override shutdown.grace_period_secs.
    #[arg(long)]
    grace_period_secs: Option<u64>,

    /// Prefix for environment overrides (e.g. `APP_` reads `APP_PORT`).
    #[arg(long, default_value = "")]
    env_prefix: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref(), &cli.env_prefix)?;
    if let Some(secs) = cli.grace_period_secs {
        config.shutdown.grace_period_secs = secs;
    }

    init_logging(&config.observability.log_level)?;
    tracing::info!("graceful-server v{} starting", env!("CARGO_PKG_VERSION"));


    let requests = Arc::new(AtomicU64::new(0));
    let worker = Arc::new(Heartbeat::spawn(Duration::from_secs(5)));

    let counter = requests.clone();
    let flush = cleanup_fn("request-counter", move |_token| {
        let counter = counter.clone();
        async move {
            tracing::info!(total = counter.load(Ordering::Relaxed), "Flushed request counter");
            Ok(())
        }
    });

    let mut server = HttpServer::new(router(requests), config.server.clone());
    if let Some(timeout) = config.shutdown.signal_force_exit() {
        server = server.with_signal_force_exit(timeout);
    }
    server
        .start_with_graceful_shutdown(
            CancellationToken::new(),
            config.shutdown.grace_period(),
            vec![worker as Arc<dyn CleanupHandler>, flush],
        )
        .await;

    Ok(())
}

fn router(requests: Arc<AtomicU64>) -> Router {
    let echo_counter = requests.clone();
    Router::new()
        .route("/healthz", get(|| async { Json(serde_json::json!({ "status": "ok" })) }))
        .route(
            "/echo",
            post(move |body: String| {
                echo_counter.fetch_add(1, Ordering::Relaxed);
                async move { body }
            }),
        )
        .route(
            "/slow",
            get(move |Query(params): Query<SlowParams>| {
                requests.fetch_add(1, Ordering::Relaxed);
                async move {
                    tokio::time::sleep(Duration::from_millis(params.ms)).await;
                    format!("slept {}ms", params.ms)
                }
            }),
        )
}

#[derive(Debug, Deserialize)]
struct SlowParams {
    #[serde(default)]
    ms: u64,
}

/// Background task logging a heartbeat until shut down.
struct Heartbeat {
    stop: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Heartbeat {
    fn spawn(interval: Duration) -> Self {
        let stop = CancellationToken::new();
        let child = stop.clone();
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    _ = ticker.tick() => tracing::debug!("heartbeat"),
                    _ = child.cancelled() => break,
                }
            }
        });
        Self {
            stop,
            task: Mutex::new(Some(task)),
        }
    }
}

#[async_trait]
impl CleanupHandler for Heartbeat {
    fn name(&self) -> &str {
        "heartbeat-worker"
    }

    async fn shutdown(&self, token: &ShutdownToken) -> Result<(), CleanupError> {
        self.stop.cancel();
        let Some(task) = self.task.lock().await.take() else {
            return Ok(());
        };
        token.run(task).await??;
        Ok(())
    }
}
