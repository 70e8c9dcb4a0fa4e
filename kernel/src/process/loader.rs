//! Page loader: program file → swap frames → page map (§4.3).

use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::error::LoadError;
use crate::mm::{FrameTable, PageMap};
use crate::process::ProcessId;
use crate::swap::{pad_instruction, SwapStore, PAGE_SIZE, SWAP_FRAMES};

/// Result of a successful load: the page map and the process's size in
/// instructions (informational; the page map already carries `TmpSize`).
pub struct Loaded {
    pub page_map: Arc<PageMap>,
    pub line_count: usize,
}

/// Load `program_path` into swap on behalf of `pid`, per §4.3's algorithm.
///
/// On any failure after frames have been allocated, every frame allocated
/// during this call is freed before the error is returned (rollback).
pub fn load(
    program_path: &Path,
    pid: ProcessId,
    frame_table: &mut FrameTable,
    swap: &mut SwapStore,
) -> Result<Loaded, LoadError> {
    let contents = fs::read_to_string(program_path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            LoadError::EmptyOrMissingProgram {
                path: program_path.to_path_buf(),
            }
        } else {
            LoadError::Io {
                path: program_path.to_path_buf(),
                reason: e.to_string(),
            }
        }
    })?;

    let lines: Vec<String> = contents
        .lines()
        .map(|l| l.trim_end_matches('\r').to_uppercase())
        .collect();

    if lines.is_empty() {
        return Err(LoadError::EmptyOrMissingProgram {
            path: program_path.to_path_buf(),
        });
    }

    let frame_count = lines.len().div_ceil(PAGE_SIZE);

    if frame_count > SWAP_FRAMES {
        return Err(LoadError::ProgramTooLarge {
            needed: frame_count,
            capacity: SWAP_FRAMES,
        });
    }

    if frame_table.count_free() < frame_count {
        return Err(LoadError::NotEnoughFrames {
            needed: frame_count,
            free: frame_table.count_free(),
        });
    }

    let mut allocated = Vec::with_capacity(frame_count);
    let result = write_program(&lines, frame_count, pid, frame_table, swap, &mut allocated);

    match result {
        Ok(()) => Ok(Loaded {
            page_map: PageMap::new(allocated),
            line_count: lines.len(),
        }),
        Err(e) => {
            for frame in allocated {
                frame_table.free(frame);
            }
            Err(e)
        }
    }
}

fn write_program(
    lines: &[String],
    frame_count: usize,
    pid: ProcessId,
    frame_table: &mut FrameTable,
    swap: &mut SwapStore,
    allocated: &mut Vec<usize>,
) -> Result<(), LoadError> {
    let mut cursor = 0usize;
    for _ in 0..frame_count {
        let frame = frame_table
            .allocate(pid)
            .expect("count_free() checked above; allocation cannot fail here");
        allocated.push(frame);

        for slot in 0..PAGE_SIZE {
            let record = match lines.get(cursor) {
                Some(line) => pad_instruction(line),
                None => [0u8; 32],
            };
            swap.write_instruction(frame, slot, &record)
                .map_err(|e| LoadError::Io {
                    path: std::path::PathBuf::from(swap.path()),
                    reason: e.to_string(),
                })?;
            cursor += 1;
        }
    }
    Ok(())
}
