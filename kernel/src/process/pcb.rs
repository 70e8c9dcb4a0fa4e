//! Process Control Block (§3).

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::mm::PageMap;

/// Process ID: unique and monotonically increasing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProcessId(pub u64);

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// User ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UserId(pub u32);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The four general-purpose registers (§1, §4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Register {
    Ax,
    Bx,
    Cx,
    Dx,
}

impl Register {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "AX" => Some(Self::Ax),
            "BX" => Some(Self::Bx),
            "CX" => Some(Self::Cx),
            "DX" => Some(Self::Dx),
            _ => None,
        }
    }
}

/// Register file, indexable by `Register`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Registers {
    pub ax: i64,
    pub bx: i64,
    pub cx: i64,
    pub dx: i64,
}

impl Registers {
    pub fn get(&self, r: Register) -> i64 {
        match r {
            Register::Ax => self.ax,
            Register::Bx => self.bx,
            Register::Cx => self.cx,
            Register::Dx => self.dx,
        }
    }

    pub fn set(&mut self, r: Register, value: i64) {
        match r {
            Register::Ax => self.ax = value,
            Register::Bx => self.bx = value,
            Register::Cx => self.cx = value,
            Register::Dx => self.dx = value,
        }
    }
}

/// Why a process stopped running (§3 lifecycle, §7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationReason {
    EndOfProgram,
    SegFault,
    InvalidInstruction,
    ArithmeticFault,
    Killed,
    ProgramTooLarge,
    LoadIoError,
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::EndOfProgram => "end of program",
            Self::SegFault => "segmentation fault",
            Self::InvalidInstruction => "invalid instruction",
            Self::ArithmeticFault => "arithmetic fault",
            Self::Killed => "killed",
            Self::ProgramTooLarge => "program too large",
            Self::LoadIoError => "program could not be loaded",
        };
        write!(f, "{s}")
    }
}

/// Process Control Block: identity, registers, scheduling fields, page map.
pub struct Pcb {
    pub pid: ProcessId,
    pub uid: UserId,
    pub program_path: PathBuf,

    pub registers: Registers,
    /// Virtual program counter, in instructions.
    pub pc: usize,
    /// Last fetched instruction record, as decoded text.
    pub ir: String,

    /// Scheduling priority; lower runs first.
    pub priority: i64,
    /// Per-process CPU usage counter.
    pub kcpu: i64,
    /// Per-user CPU usage counter, aggregated into this PCB (§4.4).
    pub kcpu_x_u: i64,

    pub page_map: Arc<PageMap>,

    /// Set once the process leaves Running, for display/diagnostics.
    pub termination: Option<TerminationReason>,
    /// Human-readable "frame:offset" of the last successful translation.
    pub last_translation: String,
}

impl Pcb {
    pub fn new(
        pid: ProcessId,
        uid: UserId,
        program_path: PathBuf,
        priority_base: i64,
        page_map: Arc<PageMap>,
    ) -> Self {
        Self {
            pid,
            uid,
            program_path,
            registers: Registers::default(),
            pc: 0,
            ir: String::new(),
            priority: priority_base,
            kcpu: 0,
            kcpu_x_u: 0,
            page_map,
            termination: None,
            last_translation: String::new(),
        }
    }

    /// Number of resident pages (`TmpSize`).
    pub fn tmp_size(&self) -> usize {
        self.page_map.size()
    }

    /// True if `other` would share a page map with this PCB (§3, §4.6):
    /// identical program path and UID.
    pub fn is_sibling_of(&self, program_path: &PathBuf, uid: UserId) -> bool {
        self.uid == uid && &self.program_path == program_path
    }
}
