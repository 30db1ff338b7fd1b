//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! ServerConfig
//!     → tls.rs (optional: load certificate/key pair, fatal on failure)
//!     → listener.rs (bind, serve router in background)
//!     → ... running ...
//!     → listener.rs close (stop accepting, drain, bounded by deadline)
//! ```
//!
//! # Design Decisions
//! - TLS is optional and handled by the acceptor, transparent to handlers
//! - The listener is owned by exactly one party and closed exactly once

pub mod listener;
pub mod tls;

pub use listener::{Listener, ListenerError};
pub use tls::{load_tls_config, TlsError};
