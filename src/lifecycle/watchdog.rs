//! Wall-clock watchdog running on a dedicated OS thread.
//!
//! The watchdog does not depend on the async runtime making progress: a
//! wedged executor (a handler blocking a worker thread, a hung close call)
//! cannot stop it from firing.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

/// An armed timer that runs its action unless dropped before it expires.
#[derive(Debug)]
pub struct Watchdog {
    name: String,
    // Dropping the sender disarms the thread.
    _disarm: mpsc::Sender<()>,
}

impl Watchdog {
    /// Arm a watchdog that calls `on_expire` after `timeout`.
    pub fn arm<F>(name: &str, timeout: Duration, on_expire: F) -> std::io::Result<Self>
    where
        F: FnOnce() + Send + 'static,
    {
        let (tx, rx) = mpsc::channel::<()>();
        let thread_name = format!("watchdog-{name}");

        thread::Builder::new().name(thread_name).spawn(move || {
            match rx.recv_timeout(timeout) {
                Err(RecvTimeoutError::Timeout) => on_expire(),
                Ok(()) | Err(RecvTimeoutError::Disconnected) => {}
            }
        })?;

        tracing::debug!(watchdog = name, timeout_ms = timeout.as_millis() as u64, "Watchdog armed");

        Ok(Self {
            name: name.to_string(),
            _disarm: tx,
        })
    }

    /// Disarm explicitly. Equivalent to dropping the watchdog.
    pub fn disarm(self) {
        tracing::debug!(watchdog = %self.name, "Watchdog disarmed");
    }
}
