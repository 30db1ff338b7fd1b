//! Server lifecycle states.

use std::fmt;

use crate::lifecycle::exit::{EXIT_FATAL, EXIT_OK};

/// Why shutdown ended in [`ServerState::ForcedExit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForcedExitReason {
    /// The grace period elapsed before shutdown completed.
    WatchdogExpired,
    /// The listener failed while draining.
    ListenerShutdown(String),
}

impl fmt::Display for ForcedExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ForcedExitReason::WatchdogExpired => write!(f, "graceful shutdown timed out"),
            ForcedExitReason::ListenerShutdown(e) => write!(f, "listener shutdown failed: {}", e),
        }
    }
}

/// Orchestrator state.
///
/// ```text
/// Idle → Running → ShuttingDown → Stopped
///                               ↘ ForcedExit
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerState {
    Idle,
    Running,
    ShuttingDown,
    Stopped,
    ForcedExit(ForcedExitReason),
}

impl ServerState {
    /// Process exit status for a terminal state.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            ServerState::Stopped => Some(EXIT_OK),
            ServerState::ForcedExit(_) => Some(EXIT_FATAL),
            _ => None,
        }
    }
}

impl fmt::Display for ServerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerState::Idle => write!(f, "idle"),
            ServerState::Running => write!(f, "running"),
            ServerState::ShuttingDown => write!(f, "shutting-down"),
            ServerState::Stopped => write!(f, "stopped"),
            ServerState::ForcedExit(reason) => write!(f, "forced-exit ({})", reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states_carry_exit_codes() {
        assert_eq!(ServerState::Running.exit_code(), None);
        assert_eq!(ServerState::ShuttingDown.exit_code(), None);
        assert_eq!(ServerState::Stopped.exit_code(), Some(0));

        let forced = ServerState::ForcedExit(ForcedExitReason::WatchdogExpired);
        assert_eq!(forced.exit_code(), Some(1));
        assert_eq!(forced.to_string(), "forced-exit (graceful shutdown timed out)");
    }
}
