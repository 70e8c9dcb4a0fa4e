//! Admission/termination coordinator (§4.6): sibling detection at
//! command-time, and the New-list scan after any event that frees frames.

use std::path::Path;

use crate::error::LoadError;
use crate::events::Event;
use crate::mm::{FrameTable, PageMap};
use crate::process::{load, Pcb, PendingLoad, ProcessId, ProcessLists, TerminationReason, UserId};
use crate::swap::SwapStore;

/// Result of trying to admit a single load request, for `admit_or_defer`.
pub enum Admission {
    Admitted(Pcb),
    Deferred(PendingLoad, LoadError),
    Failed(LoadError),
}

/// If a live sibling exists in Ready or Running, build a PCB that shares its
/// page map (§4.6). Sibling detection never looks at New: New entries carry
/// no page map.
pub fn find_sibling_page_map(
    lists: &ProcessLists,
    program_path: &Path,
    uid: UserId,
) -> Option<std::sync::Arc<PageMap>> {
    lists
        .find_sibling(program_path, uid)
        .map(|sibling| sibling.page_map.clone())
}

/// Attempt to admit one load request: try `load()`, classifying the result
/// per §4.3/§7. Does not consult sibling detection — call
/// `find_sibling_page_map` first at command time.
pub fn admit_or_defer(
    pid: ProcessId,
    uid: UserId,
    program_path: &Path,
    priority_base: i64,
    frame_table: &mut FrameTable,
    swap: &mut SwapStore,
) -> Admission {
    match load(program_path, pid, frame_table, swap) {
        Ok(loaded) => {
            let pcb = Pcb::new(
                pid,
                uid,
                program_path.to_path_buf(),
                priority_base,
                loaded.page_map,
            );
            Admission::Admitted(pcb)
        }
        Err(e @ LoadError::NotEnoughFrames { .. }) => Admission::Deferred(
            PendingLoad {
                pid,
                uid,
                program_path: program_path.to_path_buf(),
            },
            e,
        ),
        Err(e @ LoadError::ProgramTooLarge { .. }) => Admission::Failed(e),
        Err(e @ LoadError::EmptyOrMissingProgram { .. }) | Err(e @ LoadError::Io { .. }) => {
            Admission::Failed(e)
        }
    }
}

/// Map a permanent load failure onto the termination reason reported for
/// the PCB that never got to exist (§7).
pub fn termination_reason_for(error: &LoadError) -> TerminationReason {
    match error {
        LoadError::ProgramTooLarge { .. } => TerminationReason::ProgramTooLarge,
        LoadError::EmptyOrMissingProgram { .. } | LoadError::Io { .. } => {
            TerminationReason::LoadIoError
        }
        LoadError::NotEnoughFrames { .. } => {
            unreachable!("NotEnoughFrames is deferred, not failed")
        }
    }
}

/// Scan New head-to-tail exactly once, admitting every request that now
/// fits and leaving the rest in place (§4.6). A request that fails
/// permanently (I/O error or oversize) is dropped and reported, never
/// re-tried.
///
/// Sibling detection is not repeated here: New entries were only placed
/// there because no sibling existed at command time, and siblings can only
/// arise from a later command, which re-checks independently.
pub fn scan_new(
    lists: &mut ProcessLists,
    priority_base: i64,
    frame_table: &mut FrameTable,
    swap: &mut SwapStore,
) -> Vec<Event> {
    let mut events = Vec::new();
    let pending: Vec<PendingLoad> = lists.new.drain(..).collect();

    for request in pending {
        match admit_or_defer(
            request.pid,
            request.uid,
            &request.program_path,
            priority_base,
            frame_table,
            swap,
        ) {
            Admission::Admitted(pcb) => {
                events.push(Event::Admitted {
                    pid: pcb.pid,
                    uid: pcb.uid,
                    program_path: pcb.program_path.clone(),
                });
                lists.push_ready(pcb);
            }
            Admission::Deferred(pending, _) => lists.new.push_back(pending),
            Admission::Failed(error) => {
                let reason = termination_reason_for(&error);
                events.push(Event::LoadFailed {
                    program_path: request.program_path,
                    uid: request.uid,
                    reason: error,
                });
                events.push(Event::Terminated {
                    pid: request.pid,
                    reason,
                });
            }
        }
    }

    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::ProcessId;
    use std::fs;
    use std::io::Write;
    use tempfile::tempdir;

    fn write_program(dir: &Path, name: &str, lines: usize) -> std::path::PathBuf {
        let path = dir.join(name);
        let mut f = fs::File::create(&path).unwrap();
        for i in 0..lines {
            writeln!(f, "mov ax {i}").unwrap();
        }
        path
    }

    #[test]
    fn scan_admits_process_that_now_fits_and_leaves_others_deferred() {
        let dir = tempdir().unwrap();
        let small = write_program(dir.path(), "small.txt", 1);
        let huge = write_program(
            dir.path(),
            "huge.txt",
            (crate::swap::SWAP_FRAMES - 1) * crate::swap::PAGE_SIZE,
        );

        let mut swap = SwapStore::create_or_open(dir.path().join("SWAP.bin")).unwrap();
        let mut frames = FrameTable::new();
        // Leave exactly one frame free.
        for _ in 0..(crate::swap::SWAP_FRAMES - 1) {
            frames.allocate(ProcessId(99)).unwrap();
        }

        let mut lists = ProcessLists::new();
        lists.push_new(PendingLoad {
            pid: ProcessId(1),
            uid: UserId(1),
            program_path: small,
        });
        lists.push_new(PendingLoad {
            pid: ProcessId(2),
            uid: UserId(1),
            program_path: huge,
        });

        let events = scan_new(&mut lists, 60, &mut frames, &mut swap);
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], Event::Admitted { .. }));
        assert_eq!(lists.ready.len(), 1);
        assert_eq!(lists.new.len(), 1, "the huge process stays deferred");
    }

    #[test]
    fn missing_program_is_dropped_from_new_not_retried() {
        let dir = tempdir().unwrap();
        let mut swap = SwapStore::create_or_open(dir.path().join("SWAP.bin")).unwrap();
        let mut frames = FrameTable::new();
        let mut lists = ProcessLists::new();
        lists.push_new(PendingLoad {
            pid: ProcessId(1),
            uid: UserId(1),
            program_path: dir.path().join("nope.txt"),
        });

        let events = scan_new(&mut lists, 60, &mut frames, &mut swap);
        assert!(lists.new.is_empty());
        assert!(lists.ready.is_empty());
        assert!(events
            .iter()
            .any(|e| matches!(e, Event::Terminated { reason: TerminationReason::LoadIoError, .. })));
    }

    #[test]
    fn sibling_in_ready_is_found_and_shares_page_map() {
        let mut lists = ProcessLists::new();
        let map = PageMap::new(vec![3, 4]);
        lists.push_ready(Pcb::new(
            ProcessId(1),
            UserId(7),
            std::path::PathBuf::from("same.txt"),
            60,
            map.clone(),
        ));

        let found = find_sibling_page_map(&lists, Path::new("same.txt"), UserId(7));
        assert!(found.is_some());
        assert_eq!(found.unwrap().frames(), &[3, 4]);
    }
}
