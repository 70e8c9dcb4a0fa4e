//! Process management: PCBs, loader, and the four process lists (§3, §4.3).

pub mod lists;
pub mod loader;
pub mod pcb;
pub mod pending;

pub use lists::ProcessLists;
pub use loader::{load, Loaded};
pub use pcb::{Pcb, ProcessId, Register, Registers, TerminationReason, UserId};
pub use pending::PendingLoad;

/// Monotonic PID allocator.
#[derive(Default)]
pub struct PidAllocator {
    next: u64,
}

impl PidAllocator {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    pub fn alloc(&mut self) -> ProcessId {
        let pid = ProcessId(self.next);
        self.next += 1;
        pid
    }
}
