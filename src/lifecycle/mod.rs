//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGINT/SIGTERM/SIGHUP/SIGQUIT → cancel lifecycle token (once)
//!
//! Shutdown (shutdown.rs, token.rs):
//!     token cancelled → ShutdownToken(grace) → cleanup handlers in parallel → join
//!
//! Watchdog (watchdog.rs, exit.rs):
//!     grace elapsed before Stopped → fatal exit
//! ```
//!
//! # Design Decisions
//! - Handlers are independent: no ordering between them, failures isolated
//! - Listener shutdown strictly after the handler join
//! - Shutdown has timeout: forced exit after deadline

pub mod exit;
pub mod shutdown;
pub mod signals;
pub mod state;
pub mod token;
pub mod watchdog;

pub use shutdown::{cleanup_fn, CleanupError, CleanupHandler, CleanupSummary};
pub use signals::{signal_token, SignalBridge, TerminationSignal};
pub use state::{ForcedExitReason, ServerState};
pub use token::{ShutdownToken, TokenError};
