//! Entries on the New list: load requests awaiting frames (§4.3, §4.6).
//!
//! A New-list entry has an identity (PID, UID, program path) but no page
//! map yet — it has not been loaded into swap. Once `load()` succeeds it
//! becomes a full `Pcb` and moves to Ready.

use std::path::PathBuf;

use crate::process::{ProcessId, UserId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingLoad {
    pub pid: ProcessId,
    pub uid: UserId,
    pub program_path: PathBuf,
}
