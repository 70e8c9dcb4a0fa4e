//! `sokernel`: an educational multiprogramming simulator.
//!
//! Three subsystems compose into one tick-driven core: a paged virtual
//! memory system backed by a single swap file (`swap`, `mm`), a small
//! register-machine interpreter (`interp`), and a priority-aging scheduler
//! with per-user fair-share weights (`sched`). `admission` coordinates
//! frame availability against the process lists (`process`); `kernel` is
//! the explicit context tying all of it together, driven by `commands` in
//! and `events` out.

pub mod admission;
pub mod commands;
pub mod error;
pub mod events;
pub mod interp;
pub mod kernel;
pub mod mm;
pub mod process;
pub mod sched;
pub mod swap;

pub use error::KernelError;
pub use events::Event;
pub use kernel::Kernel;
