//! Scheduler: quantum tracking, CPU accounting, and priority aging (§4.4).

use crate::process::{Pcb, ProcessLists};

/// Default ticks of CPU time a process may hold Running before a requeue
/// (§1, §4.4). Overridable at startup (§10.3); see `Kernel::with_config`.
pub const QUANTUM: i64 = 5;
/// Default baseline priority every new process starts at (§1, §3).
/// Overridable at startup (§10.3).
pub const PBASE: i64 = 60;
/// Default per-tick CPU-usage increment, derived from `PBASE`/`QUANTUM`
/// (§4.4). A `Kernel` built with non-default quantum/priority-base derives
/// its own `inc_cpu` the same way; see `inc_cpu_for`.
pub const INC_CPU: i64 = PBASE / QUANTUM;

/// Derive the per-tick CPU accounting increment from a priority base and
/// quantum (§4.4: `INC_CPU = floor(PBASE/QUANTUM)`), for non-default
/// scheduler configurations (§10.3).
pub fn inc_cpu_for(priority_base: i64, quantum: i64) -> i64 {
    priority_base / quantum
}

const WEIGHT_EPSILON: f64 = 0.0001;

/// Per-user fair-share weight: the inverse of the number of distinct active
/// users, recomputed whenever the active-user set changes (§1, §4.4).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FairShare {
    pub num_users: usize,
    pub weight: f64,
}

impl FairShare {
    pub fn from_active_users(num_users: usize) -> Self {
        let weight = if num_users > 0 {
            1.0 / num_users as f64
        } else {
            0.0
        };
        Self { num_users, weight }
    }
}

/// Recompute `W`/`NumUs` from the current Ready ∪ Running set (§4.4).
pub fn recompute_fair_share(lists: &ProcessLists) -> FairShare {
    FairShare::from_active_users(lists.distinct_active_uids().len())
}

/// Apply one tick's worth of CPU accounting (§4.4, right after execute).
///
/// `running` accrues `INC_CPU` to both `kcpu` and `kcpu_x_u`; every Ready PCB
/// sharing its UID accrues `INC_CPU` to `kcpu_x_u` only. `running` lives in
/// its own field, disjoint from the Ready queue, so both can be borrowed
/// mutably at once without unsafe code.
pub fn account_cpu_usage(
    running: &mut Pcb,
    ready: &mut std::collections::VecDeque<Pcb>,
    inc_cpu: i64,
) {
    running.kcpu += inc_cpu;
    running.kcpu_x_u += inc_cpu;
    for pcb in ready.iter_mut().filter(|p| p.uid == running.uid) {
        pcb.kcpu_x_u += inc_cpu;
    }
}

/// Recompute `priority` for one PCB from the aging formula (§1, §4.4):
///
/// `P = PBASE + KCPU/2 + KCPUxU/(4*W)` when `|W| > epsilon`, else
/// `P = PBASE + KCPU/2`. Halves `kcpu`/`kcpu_x_u` first, as the quantum
/// expiry handler does for every Ready PCB and for Running itself (§4.4).
pub fn age(pcb: &mut Pcb, fair_share: FairShare, priority_base: i64) {
    pcb.kcpu /= 2;
    pcb.kcpu_x_u /= 2;
    pcb.priority = if fair_share.weight.abs() > WEIGHT_EPSILON {
        priority_base + pcb.kcpu / 2 + (pcb.kcpu_x_u as f64 / (4.0 * fair_share.weight)) as i64
    } else {
        priority_base + pcb.kcpu / 2
    };
}

/// Apply aging to every Ready PCB and, if given, to the PCB about to leave
/// Running (§4.4: both halve their counters and recompute priority exactly
/// once per quantum expiry, never twice for the same PCB).
pub fn age_on_quantum_expiry(lists: &mut ProcessLists, fair_share: FairShare, priority_base: i64) {
    for pcb in lists.ready.iter_mut() {
        age(pcb, fair_share, priority_base);
    }
    if let Some(running) = lists.running.as_mut() {
        age(running, fair_share, priority_base);
    }
}
