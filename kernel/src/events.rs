//! Kernel events (§9): a typed, testable notification stream, kept separate
//! from the `log` crate's ambient diagnostic logging. `log` is for operators
//! debugging the simulator itself; `Event` is the simulator's own output,
//! the thing a UI or test harness observes and asserts on.

use std::fmt;
use std::path::PathBuf;

use crate::commands::Command;
use crate::error::{CommandError, LoadError};
use crate::process::{ProcessId, TerminationReason, UserId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A program was loaded and admitted straight to Ready.
    Admitted {
        pid: ProcessId,
        uid: UserId,
        program_path: PathBuf,
    },
    /// A program was loaded and joined Ready by sharing a sibling's page map,
    /// without allocating new frames (§4.6).
    AdmittedAsSibling {
        pid: ProcessId,
        uid: UserId,
        program_path: PathBuf,
        sibling_pid: ProcessId,
    },
    /// A load request could not be admitted and was placed on New to retry
    /// on a later tick (§4.3, §7), or failed outright.
    LoadDeferred {
        program_path: PathBuf,
        uid: UserId,
        reason: LoadError,
    },
    /// A New-list entry was dropped permanently: an I/O-class failure, not a
    /// capacity shortfall (§4.3, §7 open question).
    LoadFailed {
        program_path: PathBuf,
        uid: UserId,
        reason: LoadError,
    },
    /// A process left Running or New for Terminated.
    Terminated {
        pid: ProcessId,
        reason: TerminationReason,
    },
    /// A page map's last sharer terminated; its frames were released.
    FramesReleased { pid: ProcessId, frame_count: usize },
    /// A `KILL`/`MATAR` targeted a PID that is not currently tracked.
    KillTargetNotFound { pid: ProcessId },
    /// A command line failed to parse; state is unchanged.
    CommandRejected { reason: CommandError },
    /// A command was accepted and is about to be applied.
    CommandAccepted { command: Command },
    /// Priorities were recomputed for the Ready/Running set on quantum
    /// expiry (§4.4).
    Aged { num_users: usize },
    /// The simulator is shutting down (`EXIT`/`SALIR`).
    Exiting,
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Admitted {
                pid,
                uid,
                program_path,
            } => write!(
                f,
                "admitted pid {pid} (uid {uid}, {})",
                program_path.display()
            ),
            Self::AdmittedAsSibling {
                pid,
                uid,
                program_path,
                sibling_pid,
            } => write!(
                f,
                "admitted pid {pid} (uid {uid}, {}) sharing pages with pid {sibling_pid}",
                program_path.display()
            ),
            Self::LoadDeferred {
                program_path,
                uid,
                reason,
            } => write!(
                f,
                "deferred load of {} (uid {uid}): {reason}",
                program_path.display()
            ),
            Self::LoadFailed {
                program_path,
                uid,
                reason,
            } => write!(
                f,
                "load of {} (uid {uid}) failed permanently: {reason}",
                program_path.display()
            ),
            Self::Terminated { pid, reason } => write!(f, "pid {pid} terminated: {reason}"),
            Self::FramesReleased { pid, frame_count } => {
                write!(f, "pid {pid} released {frame_count} frame(s)")
            }
            Self::KillTargetNotFound { pid } => write!(f, "no such process: pid {pid}"),
            Self::CommandRejected { reason } => write!(f, "command rejected: {reason}"),
            Self::CommandAccepted { command } => write!(f, "accepted: {command:?}"),
            Self::Aged { num_users } => write!(f, "aged ready/running set ({num_users} active user(s))"),
            Self::Exiting => write!(f, "exiting"),
        }
    }
}
