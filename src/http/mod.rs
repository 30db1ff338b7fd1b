//! HTTP serving subsystem.
//!
//! # Data Flow
//! ```text
//! caller's Router + ServerConfig
//!     → server.rs (trace layer, TLS, bind via crate::net)
//!     → Running: requests handled by the caller's router
//!     → lifecycle token cancelled
//!     → server.rs shutdown sequence (crate::lifecycle cleanup fan-out)
//!     → listener drained and closed
//! ```

pub mod server;

pub use server::{HttpServer, ServerError, ServerHandle, ShutdownReport};
