//! The simulator's explicit context: no module-scope statics (§9 "Global
//! mutable state"). Every operation runs against a `Kernel` value the
//! caller owns, so tests can build fresh, independent instances.

use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::admission::{self, find_sibling_page_map, termination_reason_for, Admission};
use crate::commands::{self, Command};
use crate::error::SwapError;
use crate::events::Event;
use crate::interp::{self, StepOutcome};
use crate::mm::{FrameTable, PageMap};
use crate::process::{Pcb, PendingLoad, PidAllocator, ProcessLists};
use crate::sched::{self, FairShare};
use crate::swap::SwapStore;

/// Owns every piece of simulator state: the swap file, the frame table, the
/// four process lists, the PID allocator, and the scheduler's quantum
/// counter and fair-share weight (§2, §9).
pub struct Kernel {
    swap: SwapStore,
    frames: FrameTable,
    lists: ProcessLists,
    pids: PidAllocator,
    quantum_counter: i64,
    fair_share: FairShare,
    priority_base: i64,
    quantum: i64,
    inc_cpu: i64,
}

impl Kernel {
    /// Create (truncating) the swap file at `swap_path` and start with
    /// empty process lists, using the default quantum and base priority
    /// (§3's `QUANTUM`/`PBASE` constants).
    pub fn new(swap_path: impl AsRef<Path>) -> Result<Self, SwapError> {
        Self::with_config(swap_path, sched::QUANTUM, sched::PBASE)
    }

    /// Create (truncating) the swap file at `swap_path` with an overridden
    /// quantum and base priority (§10.3: both are CLI-overridable in the
    /// hosted binary rather than hardcoded).
    pub fn with_config(
        swap_path: impl AsRef<Path>,
        quantum: i64,
        priority_base: i64,
    ) -> Result<Self, SwapError> {
        let swap = SwapStore::create_or_open(swap_path)?;
        info!("swap store ready at {}", swap.path().display());
        Ok(Self {
            swap,
            frames: FrameTable::new(),
            lists: ProcessLists::new(),
            pids: PidAllocator::new(),
            quantum_counter: 0,
            fair_share: FairShare::from_active_users(0),
            priority_base,
            quantum,
            inc_cpu: sched::inc_cpu_for(priority_base, quantum),
        })
    }

    pub fn lists(&self) -> &ProcessLists {
        &self.lists
    }

    pub fn frames(&self) -> &FrameTable {
        &self.frames
    }

    pub fn fair_share(&self) -> FairShare {
        self.fair_share
    }

    fn recompute_fair_share(&mut self) {
        self.fair_share = sched::recompute_fair_share(&self.lists);
    }

    /// Parse and apply one command line (§5, §6).
    pub fn handle_command(&mut self, line: &str) -> Vec<Event> {
        let command = match commands::parse(line) {
            Ok(c) => c,
            Err(reason) => {
                warn!("rejected command {line:?}: {reason}");
                return vec![Event::CommandRejected { reason }];
            }
        };
        debug!("accepted command: {command:?}");
        let mut events = vec![Event::CommandAccepted {
            command: command.clone(),
        }];

        match command {
            Command::Load { program_path, uid } => {
                events.extend(self.load(program_path, uid));
            }
            Command::Kill { pid } => {
                events.extend(self.kill(pid));
            }
            Command::Exit => {
                events.extend(self.exit());
            }
        }
        events
    }

    fn load(&mut self, program_path: PathBuf, uid: crate::process::UserId) -> Vec<Event> {
        let pid = self.pids.alloc();
        let mut events = Vec::new();

        if let Some(shared_map) = find_sibling_page_map(&self.lists, &program_path, uid) {
            let sibling_pid = self
                .lists
                .find_sibling(&program_path, uid)
                .expect("just found above")
                .pid;
            let pcb = Pcb::new(pid, uid, program_path.clone(), self.priority_base, shared_map);
            events.push(Event::AdmittedAsSibling {
                pid,
                uid,
                program_path,
                sibling_pid,
            });
            self.lists.push_ready(pcb);
            self.recompute_fair_share();
            return events;
        }

        match admission::admit_or_defer(
            pid,
            uid,
            &program_path,
            self.priority_base,
            &mut self.frames,
            &mut self.swap,
        ) {
            Admission::Admitted(pcb) => {
                events.push(Event::Admitted {
                    pid,
                    uid,
                    program_path,
                });
                self.lists.push_ready(pcb);
                self.recompute_fair_share();
            }
            Admission::Deferred(pending, reason) => {
                events.push(Event::LoadDeferred {
                    program_path,
                    uid,
                    reason,
                });
                self.lists.push_new(pending);
            }
            Admission::Failed(error) => {
                let reason = termination_reason_for(&error);
                events.push(Event::LoadFailed {
                    program_path,
                    uid,
                    reason: error,
                });
                events.push(Event::Terminated { pid, reason });
            }
        }
        events
    }

    fn kill(&mut self, pid: crate::process::ProcessId) -> Vec<Event> {
        if let Some(pcb) = self.lists.take_by_pid(pid) {
            return self.finish_termination(pcb, crate::process::TerminationReason::Killed);
        }
        if let Some(PendingLoad { pid, .. }) = self.lists.take_pending_by_pid(pid) {
            return vec![Event::Terminated {
                pid,
                reason: crate::process::TerminationReason::Killed,
            }];
        }
        vec![Event::KillTargetNotFound { pid }]
    }

    fn finish_termination(
        &mut self,
        mut pcb: Pcb,
        reason: crate::process::TerminationReason,
    ) -> Vec<Event> {
        pcb.termination = Some(reason);
        let pid = pcb.pid;
        let frame_count = pcb.page_map.frames().len();
        let released = crate::mm::is_last_sharer(&pcb.page_map);
        if released {
            interp::release_frames_if_last_sharer(&pcb, &mut self.frames);
        }
        // Detach from the shared-map group before filing under Terminated:
        // Terminated is retained only for display (§3), so it must not keep
        // holding the live `Arc`. Otherwise a surviving sibling's later
        // termination would still see this dead PCB's reference and never
        // observe itself as the last *live* sharer (review fix: last-sharer
        // accounting must count live holders only, not Terminated ones).
        pcb.page_map = PageMap::new(pcb.page_map.frames().to_vec());
        self.lists.terminated.push(pcb);

        let mut events = vec![Event::Terminated { pid, reason }];
        if released {
            events.push(Event::FramesReleased { pid, frame_count });
        }

        self.recompute_fair_share();
        let admitted = admission::scan_new(
            &mut self.lists,
            self.priority_base,
            &mut self.frames,
            &mut self.swap,
        );
        if !admitted.is_empty() {
            self.recompute_fair_share();
        }
        events.extend(admitted);
        events
    }

    fn exit(&mut self) -> Vec<Event> {
        let mut events = Vec::new();
        while let Some(pcb) = self.lists.running.take() {
            events.extend(self.finish_termination(pcb, crate::process::TerminationReason::Killed));
        }
        while let Some(pcb) = self.lists.ready.pop_front() {
            events.extend(self.finish_termination(pcb, crate::process::TerminationReason::Killed));
        }
        while let Some(pending) = self.lists.new.pop_front() {
            events.push(Event::Terminated {
                pid: pending.pid,
                reason: crate::process::TerminationReason::Killed,
            });
        }
        events.push(Event::Exiting);
        events
    }

    /// Advance the simulation by one tick (§4.5, §5): dispatch if Running is
    /// empty, then execute at most one instruction, apply accounting, and
    /// age on quantum expiry.
    pub fn tick(&mut self) -> Vec<Event> {
        let mut events = Vec::new();

        if self.lists.running.is_none() {
            if let Some(pcb) = self.lists.take_min_priority_ready() {
                debug!("dispatching pid {}", pcb.pid);
                self.lists.running = Some(pcb);
            } else {
                return events;
            }
        }

        let mut running = self.lists.running.take().expect("checked above");
        match interp::step(&mut running, &mut self.swap) {
            StepOutcome::Continued => {
                sched::account_cpu_usage(&mut running, &mut self.lists.ready, self.inc_cpu);
                self.quantum_counter += 1;

                if self.quantum_counter >= self.quantum {
                    sched::age_on_quantum_expiry(&mut self.lists, self.fair_share, self.priority_base);
                    // `age_on_quantum_expiry` only sees `self.lists.running`,
                    // which is currently `None` (we took it above) — age
                    // `running` directly instead, then requeue it.
                    sched::age(&mut running, self.fair_share, self.priority_base);
                    events.push(Event::Aged {
                        num_users: self.fair_share.num_users,
                    });
                    self.lists.push_ready(running);
                    self.quantum_counter = 0;
                    self.recompute_fair_share();
                } else {
                    self.lists.running = Some(running);
                }
            }
            StepOutcome::Terminated(reason) => {
                self.quantum_counter = 0;
                events.extend(self.finish_termination(running, reason));
            }
        }

        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Write;
    use tempfile::tempdir;

    fn write_program(dir: &Path, name: &str, lines: &[&str]) -> PathBuf {
        let path = dir.join(name);
        let mut f = fs::File::create(&path).unwrap();
        for line in lines {
            writeln!(f, "{line}").unwrap();
        }
        path
    }

    #[test]
    fn load_admits_to_ready_and_tick_dispatches() {
        let dir = tempdir().unwrap();
        let prog = write_program(dir.path(), "p.txt", &["MOV AX 5"]);
        let mut kernel = Kernel::new(dir.path().join("SWAP.bin")).unwrap();

        let events = kernel.handle_command(&format!("LOAD {} 1", prog.display()));
        assert!(events.iter().any(|e| matches!(e, Event::Admitted { .. })));
        assert_eq!(kernel.lists().ready.len(), 1);

        kernel.tick();
        assert!(kernel.lists().running.is_some());
        assert_eq!(kernel.lists().running.as_ref().unwrap().registers.ax, 5);
    }

    #[test]
    fn second_identical_load_shares_page_map() {
        let dir = tempdir().unwrap();
        let prog = write_program(dir.path(), "same.txt", &["MOV AX 1"]);
        let mut kernel = Kernel::new(dir.path().join("SWAP.bin")).unwrap();

        kernel.handle_command(&format!("LOAD {} 7", prog.display()));
        let free_after_first = kernel.frames().count_free();
        let events = kernel.handle_command(&format!("LOAD {} 7", prog.display()));

        assert!(events
            .iter()
            .any(|e| matches!(e, Event::AdmittedAsSibling { .. })));
        assert_eq!(kernel.frames().count_free(), free_after_first);
    }

    #[test]
    fn div_by_zero_terminates_and_frees_the_core() {
        let dir = tempdir().unwrap();
        let prog = write_program(dir.path(), "bad.txt", &["DIV AX 0"]);
        let mut kernel = Kernel::new(dir.path().join("SWAP.bin")).unwrap();
        kernel.handle_command(&format!("LOAD {} 1", prog.display()));

        // A single tick both dispatches (Running was empty) and executes
        // the first instruction, which here faults immediately.
        let events = kernel.tick();
        assert!(events
            .iter()
            .any(|e| matches!(e, Event::Terminated { .. })));
        assert!(kernel.lists().running.is_none());
    }

    #[test]
    fn kill_frees_frames_and_admits_a_deferred_process() {
        let dir = tempdir().unwrap();
        let small = write_program(dir.path(), "small.txt", &["MOV AX 1"]);
        let huge_lines: Vec<String> = (0..(crate::swap::SWAP_FRAMES - 1) * crate::swap::PAGE_SIZE)
            .map(|_| "INC AX".to_string())
            .collect();
        let huge_refs: Vec<&str> = huge_lines.iter().map(|s| s.as_str()).collect();
        let huge = write_program(dir.path(), "huge.txt", &huge_refs);

        let mut kernel = Kernel::new(dir.path().join("SWAP.bin")).unwrap();
        let admit = kernel.handle_command(&format!("LOAD {} 1", small.display()));
        let pid = admit
            .iter()
            .find_map(|e| match e {
                Event::Admitted { pid, .. } => Some(*pid),
                _ => None,
            })
            .unwrap();

        let deferred = kernel.handle_command(&format!("LOAD {} 2", huge.display()));
        assert!(deferred
            .iter()
            .any(|e| matches!(e, Event::LoadDeferred { .. })));

        let events = kernel.handle_command(&format!("KILL {}", pid.0));
        assert!(events
            .iter()
            .any(|e| matches!(e, Event::Admitted { .. })));
    }

    #[test]
    fn malformed_command_does_not_change_state() {
        let dir = tempdir().unwrap();
        let mut kernel = Kernel::new(dir.path().join("SWAP.bin")).unwrap();
        let events = kernel.handle_command("FROB nonsense");
        assert!(matches!(events[0], Event::CommandRejected { .. }));
        assert!(kernel.lists().ready.is_empty());
    }
}
