//! Lifecycle of a bolt child process.
//!
//! ```text
//! Spawned -> Running -> Exited
//!                    \-> TimedOut -> Terminating -> Exited
//!                                               \-> Killed
//! ```

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    Spawned,
    Running,
    TimedOut,
    /// SIGTERM sent, waiting out the grace period
    Terminating,
    /// SIGKILL sent after the grace period ran out
    Killed,
    Exited,
}

impl ProcessState {
    pub fn can_transition_to(self, next: ProcessState) -> bool {
        use ProcessState::*;
        matches!(
            (self, next),
            (Spawned, Running)
                | (Running, Exited)
                | (Running, TimedOut)
                | (TimedOut, Terminating)
                | (Terminating, Exited)
                | (Terminating, Killed)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, ProcessState::Exited | ProcessState::Killed)
    }

    /// Move to `next`, logging the transition
    pub fn advance(self, next: ProcessState, pid: Option<u32>) -> ProcessState {
        debug_assert!(
            self.can_transition_to(next),
            "invalid process transition {self} -> {next}"
        );
        tracing::trace!(pid = ?pid, from = %self, to = %next, "bolt process state change");
        next
    }
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProcessState::Spawned => "spawned",
            ProcessState::Running => "running",
            ProcessState::TimedOut => "timed-out",
            ProcessState::Terminating => "terminating",
            ProcessState::Killed => "killed",
            ProcessState::Exited => "exited",
        };
        f.write_str(name)
    }
}
