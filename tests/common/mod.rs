//! Shared utilities for integration tests.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use axum::{extract::Query, routing::get, Router};
use graceful_server::http::{ServerError, ShutdownReport};
use graceful_server::lifecycle::{cleanup_fn, CleanupHandler, ServerState};
use graceful_server::{HttpServer, ServerConfig};
use serde::Deserialize;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Ask the OS for a port that is free right now.
pub fn free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

/// Loopback-only server configuration.
#[allow(dead_code)]
pub fn local_config(port: u16) -> ServerConfig {
    ServerConfig {
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        ..ServerConfig::new(port)
    }
}

#[derive(Deserialize)]
struct SlowParams {
    ms: u64,
}

/// Router with `/healthz` and `/slow?ms=N`.
#[allow(dead_code)]
pub fn test_router() -> Router {
    Router::new()
        .route("/healthz", get(|| async { "ok" }))
        .route(
            "/slow",
            get(|Query(params): Query<SlowParams>| async move {
                tokio::time::sleep(Duration::from_millis(params.ms)).await;
                "done"
            }),
        )
}

/// Handler that sleeps for `ms` and succeeds.
#[allow(dead_code)]
pub fn sleeper(name: &str, ms: u64) -> Arc<dyn CleanupHandler> {
    cleanup_fn(name, move |_token| async move {
        tokio::time::sleep(Duration::from_millis(ms)).await;
        Ok(())
    })
}

/// A server running under `HttpServer::run` in a background task.
#[allow(dead_code)]
pub struct RunningServer {
    pub addr: SocketAddr,
    pub lifecycle: CancellationToken,
    pub task: JoinHandle<Result<ShutdownReport, ServerError>>,
}

#[allow(dead_code)]
impl RunningServer {
    /// Cancel the lifecycle token and wait for the shutdown report.
    pub async fn stop(self) -> ShutdownReport {
        self.lifecycle.cancel();
        self.task.await.unwrap().unwrap()
    }
}

/// Start a server with `handlers` and wait until it is accepting.
#[allow(dead_code)]
pub async fn spawn_server(grace: Duration, handlers: Vec<Arc<dyn CleanupHandler>>) -> RunningServer {
    let port = free_port();
    let server = HttpServer::new(test_router(), local_config(port));
    let mut state = server.state();
    let lifecycle = CancellationToken::new();

    let task = tokio::spawn(server.run(lifecycle.clone(), grace, handlers));
    tokio::time::timeout(
        Duration::from_secs(5),
        state.wait_for(|s| *s == ServerState::Running),
    )
    .await
    .expect("server did not start")
    .expect("state channel closed");

    RunningServer {
        addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), port),
        lifecycle,
        task,
    }
}

/// Wait until connecting to `addr` is refused.
#[allow(dead_code)]
pub async fn wait_until_refused(addr: SocketAddr) {
    for _ in 0..50 {
        if tokio::net::TcpStream::connect(addr).await.is_err() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("{addr} still accepting connections");
}

#[allow(dead_code)]
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
