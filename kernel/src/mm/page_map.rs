//! Per-process page maps (TMP), shared between sibling processes (§3, §9).
//!
//! A page map is immutable once built by the loader, so sharing it needs no
//! interior mutability: an `Arc<PageMap>` clone is the whole sharing
//! mechanism, and the last clone dropped is exactly "the last sharer
//! terminates" from §4.6. `Arc::strong_count` stands in for the source's
//! explicit "am I the last holder?" scan — but only counts *live* holders
//! (New/Ready/Running) correctly if nothing outside that set keeps a clone.
//! Terminated PCBs are retained for display (§3) but must not hold onto the
//! shared `Arc`: the caller that moves a PCB to Terminated detaches it to a
//! private, unshared `PageMap` first, or the strong count would never drop
//! back to the live sharers' true number and frames would never be freed.

use std::sync::Arc;

/// Ordered sequence of frame indices a process's virtual pages map to.
#[derive(Debug, PartialEq, Eq)]
pub struct PageMap {
    frames: Vec<usize>,
}

impl PageMap {
    pub fn new(frames: Vec<usize>) -> Arc<Self> {
        Arc::new(Self { frames })
    }

    /// Number of pages (`TmpSize`).
    pub fn size(&self) -> usize {
        self.frames.len()
    }

    /// Frame index backing virtual page `page`, if resident.
    pub fn frame(&self, page: usize) -> Option<usize> {
        self.frames.get(page).copied()
    }

    /// All frames, in page order.
    pub fn frames(&self) -> &[usize] {
        &self.frames
    }
}

/// Whether `map` is held by exactly one live PCB (this one). When true, the
/// caller terminating is the last sharer and must release the frames.
///
/// Correct only if every other holder is a live PCB (New/Ready/Running);
/// Terminated PCBs must have already been detached from the shared map (see
/// module docs), or they would keep the count inflated forever.
pub fn is_last_sharer(map: &Arc<PageMap>) -> bool {
    Arc::strong_count(map) == 1
}
