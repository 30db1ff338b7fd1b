//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events with structured fields (component, handler, error, ...)
//!     → logging.rs subscriber (env filter + fmt layer to stdout)
//! ```
//!
//! Shutdown-relevant events are emitted with `component = "http-server"`:
//! startup, signal received, cleanup handler failure, watchdog timeout,
//! shutdown complete.

pub mod logging;

pub use logging::init_logging;
