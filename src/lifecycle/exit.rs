//! Abrupt process termination.
//!
//! [`fatal_exit`] is the only place the crate ends the process. It does not
//! unwind, run destructors, or flush anything beyond what it logs: callers
//! use it when a bounded shutdown can no longer be guaranteed any other way.

/// Exit status for a clean stop.
pub const EXIT_OK: i32 = 0;

/// Exit status for every fatal path.
pub const EXIT_FATAL: i32 = 1;

/// Log `reason` at error level and terminate the process with [`EXIT_FATAL`].
pub fn fatal_exit(reason: &str) -> ! {
    tracing::error!(component = "http-server", reason, "Fatal, exiting process");
    std::process::exit(EXIT_FATAL)
}
