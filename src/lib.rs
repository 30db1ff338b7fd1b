//! Graceful shutdown for HTTP services.
//!
//! - [`env`]: typed environment-variable accessors with defaults
//! - [`lifecycle`]: signal-driven cancellation, cleanup handlers, watchdog
//! - [`http`]: server wrapper orchestrating the shutdown sequence
//!
//! ```no_run
//! use std::time::Duration;
//! use axum::{routing::get, Router};
//! use graceful_server::{cleanup_fn, HttpServer, ServerConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn demo() {
//! let app = Router::new().route("/", get(|| async { "ok" }));
//! let db = cleanup_fn("db-pool", |_token| async { Ok(()) });
//!
//! HttpServer::new(app, ServerConfig::new(8080))
//!     .start_with_graceful_shutdown(CancellationToken::new(), Duration::from_secs(10), vec![db])
//!     .await;
//! # }
//! ```

pub mod config;
pub mod env;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;

pub use config::{AppConfig, ServerConfig};
pub use http::HttpServer;
pub use lifecycle::{cleanup_fn, CleanupHandler, ShutdownToken};
