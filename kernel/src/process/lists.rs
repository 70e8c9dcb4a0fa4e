//! The four disjoint process lists (§3): New, Ready, Running, Terminated.

use std::collections::VecDeque;

use crate::process::{Pcb, PendingLoad, ProcessId};

/// Owns the four lists. A PCB (or, on New, a pending load request) is in
/// exactly one of them at any time (§8).
#[derive(Default)]
pub struct ProcessLists {
    pub new: VecDeque<PendingLoad>,
    pub ready: VecDeque<Pcb>,
    pub running: Option<Pcb>,
    pub terminated: Vec<Pcb>,
}

impl ProcessLists {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert at the tail of Ready, preserving insertion order for
    /// tie-breaking (§4.4).
    pub fn push_ready(&mut self, pcb: Pcb) {
        self.ready.push_back(pcb);
    }

    /// Insert at the tail of New.
    pub fn push_new(&mut self, pending: PendingLoad) {
        self.new.push_back(pending);
    }

    /// Remove and return the Ready PCB with minimum `priority`; ties break by
    /// earliest insertion (lowest index, §4.4).
    pub fn take_min_priority_ready(&mut self) -> Option<Pcb> {
        let (idx, _) = self
            .ready
            .iter()
            .enumerate()
            .min_by_key(|(idx, pcb)| (pcb.priority, *idx))?;
        self.ready.remove(idx)
    }

    /// Remove a PCB with the given PID from Running or Ready. Used by `kill`
    /// (§5, §6). Does not search New: a pending load has no PCB yet, see
    /// `take_pending_by_pid`.
    pub fn take_by_pid(&mut self, pid: ProcessId) -> Option<Pcb> {
        if let Some(running) = &self.running {
            if running.pid == pid {
                return self.running.take();
            }
        }
        if let Some(idx) = self.ready.iter().position(|p| p.pid == pid) {
            return self.ready.remove(idx);
        }
        None
    }

    /// Remove a pending load request with the given PID from New. Used by
    /// `kill` when the target has not yet been admitted (§5, §6).
    pub fn take_pending_by_pid(&mut self, pid: ProcessId) -> Option<PendingLoad> {
        let idx = self.new.iter().position(|p| p.pid == pid)?;
        self.new.remove(idx)
    }

    /// Find a live sibling (Ready or Running) with the same program path and
    /// UID, for page-map sharing (§4.6). Checked at command time, not during
    /// the New-list scan.
    pub fn find_sibling(
        &self,
        program_path: &std::path::Path,
        uid: crate::process::UserId,
    ) -> Option<&Pcb> {
        if let Some(running) = &self.running {
            if running.is_sibling_of(&program_path.to_path_buf(), uid) {
                return Some(running);
            }
        }
        self.ready
            .iter()
            .find(|p| p.is_sibling_of(&program_path.to_path_buf(), uid))
    }

    /// Every PCB currently scheduling-relevant (Running ∪ Ready), for aging
    /// and UID accounting (§4.4).
    pub fn scheduling_relevant_mut(&mut self) -> impl Iterator<Item = &mut Pcb> {
        self.running.iter_mut().chain(self.ready.iter_mut())
    }

    /// Distinct UIDs currently in Ready ∪ Running, for `NumUs` (§3, §4.4).
    pub fn distinct_active_uids(&self) -> Vec<crate::process::UserId> {
        let mut uids: Vec<crate::process::UserId> = self
            .running
            .iter()
            .chain(self.ready.iter())
            .map(|p| p.uid)
            .collect();
        uids.sort_by_key(|u| u.0);
        uids.dedup();
        uids
    }

    /// All PIDs across all four lists, for the global PID-uniqueness
    /// invariant (§8) and diagnostics.
    pub fn all_pids(&self) -> Vec<ProcessId> {
        let mut pids: Vec<ProcessId> = self.new.iter().map(|p| p.pid).collect();
        pids.extend(self.ready.iter().map(|p| p.pid));
        pids.extend(self.running.iter().map(|p| p.pid));
        pids.extend(self.terminated.iter().map(|p| p.pid));
        pids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mm::PageMap;
    use crate::process::UserId;
    use std::path::PathBuf;

    fn pcb(pid: u64, priority: i64) -> Pcb {
        Pcb::new(
            ProcessId(pid),
            UserId(1),
            PathBuf::from("p.txt"),
            priority,
            PageMap::new(vec![]),
        )
    }

    #[test]
    fn min_priority_ties_break_by_insertion_order() {
        let mut lists = ProcessLists::new();
        lists.push_ready(pcb(1, 60));
        lists.push_ready(pcb(2, 60));
        lists.push_ready(pcb(3, 10));

        let picked = lists.take_min_priority_ready().unwrap();
        assert_eq!(picked.pid, ProcessId(3));

        let picked2 = lists.take_min_priority_ready().unwrap();
        assert_eq!(picked2.pid, ProcessId(1), "equal priority: earliest insertion wins");
    }

    #[test]
    fn take_by_pid_finds_running_too() {
        let mut lists = ProcessLists::new();
        lists.running = Some(pcb(5, 60));
        let taken = lists.take_by_pid(ProcessId(5)).unwrap();
        assert_eq!(taken.pid, ProcessId(5));
        assert!(lists.running.is_none());
    }
}
