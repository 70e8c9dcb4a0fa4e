//! Instruction cycle: translate, fetch, decode, execute, account (§4.5).

pub mod instruction;

pub use instruction::{decode, Instruction, Operand};

use crate::error::RuntimeFault;
use crate::mm::is_last_sharer;
use crate::process::{Pcb, Register, TerminationReason};
use crate::swap::{is_end_sentinel, SwapStore, PAGE_SIZE};

/// Outcome of running one instruction for the Running PCB.
pub enum StepOutcome {
    /// Instruction executed successfully, process keeps running.
    Continued,
    /// Process terminated; carries the reason for the `Event` layer.
    Terminated(TerminationReason),
}

/// Translate `pcb.pc`, fetch, decode, and execute exactly one instruction.
///
/// Does not perform scheduler accounting (KCPU/KCPUxU/quantum) or PC
/// advancement on termination; the caller (the scheduler, §4.4) is
/// responsible for accounting on `Continued` and for list transitions on
/// `Terminated`.
pub fn step(pcb: &mut Pcb, swap: &mut SwapStore) -> StepOutcome {
    let page = pcb.pc / PAGE_SIZE;
    let offset = pcb.pc % PAGE_SIZE;

    // Translate (§4.5 step 1). page == TmpSize is not a fault: the PCB has
    // simply run off the end of its last allocated page, which is the
    // ordinary end-of-program case (no frame exists to hold a sentinel
    // there, so there is nothing to fetch). Only page > TmpSize, which a
    // live PCB can never actually reach since PC only ever advances by one,
    // is a genuine SegFault.
    if page > pcb.tmp_size() {
        return StepOutcome::Terminated(TerminationReason::SegFault);
    }
    if page == pcb.tmp_size() {
        return StepOutcome::Terminated(TerminationReason::EndOfProgram);
    }
    let frame = pcb
        .page_map
        .frame(page)
        .expect("page < tmp_size so the page map has this page");
    pcb.last_translation = format!("{frame:04X}:{offset:02X}");

    // Fetch (§4.5 step 2).
    let record = swap
        .read_instruction(frame, offset)
        .expect("frame/offset are in range by construction");
    if is_end_sentinel(&record) {
        return StepOutcome::Terminated(TerminationReason::EndOfProgram);
    }
    let text = String::from_utf8_lossy(&record).trim_end().to_string();
    pcb.ir = text.clone();

    // Decode (§4.5 step 3).
    let instruction = match decode(&text) {
        Ok(i) => i,
        Err(fault) => return StepOutcome::Terminated(reason_for(fault)),
    };

    // Execute (§4.5 step 4).
    match execute(pcb, instruction) {
        Ok(()) => {
            pcb.pc += 1;
            StepOutcome::Continued
        }
        Err(fault) => StepOutcome::Terminated(reason_for(fault)),
    }
}

fn reason_for(fault: RuntimeFault) -> TerminationReason {
    match fault {
        RuntimeFault::SegFault => TerminationReason::SegFault,
        RuntimeFault::InvalidInstruction => TerminationReason::InvalidInstruction,
        RuntimeFault::ArithmeticFault => TerminationReason::ArithmeticFault,
    }
}

fn operand_value(pcb: &Pcb, operand: Operand) -> i64 {
    match operand {
        Operand::Register(r) => pcb.registers.get(r),
        Operand::Immediate(v) => v,
    }
}

fn execute(pcb: &mut Pcb, instruction: Instruction) -> Result<(), RuntimeFault> {
    let result = match instruction {
        Instruction::Mov { dst, src } => (dst, operand_value(pcb, src)),
        Instruction::Add { dst, src } => (dst, pcb.registers.get(dst) + operand_value(pcb, src)),
        Instruction::Sub { dst, src } => (dst, pcb.registers.get(dst) - operand_value(pcb, src)),
        Instruction::Mul { dst, src } => (dst, pcb.registers.get(dst) * operand_value(pcb, src)),
        Instruction::Div { dst, src } => {
            let divisor = operand_value(pcb, src);
            if divisor == 0 {
                return Err(RuntimeFault::ArithmeticFault);
            }
            (dst, pcb.registers.get(dst) / divisor)
        }
        Instruction::Inc { dst } => (dst, pcb.registers.get(dst) + 1),
        Instruction::Dec { dst } => (dst, pcb.registers.get(dst) - 1),
        Instruction::End => return Err(RuntimeFault::InvalidInstruction), // unreachable: handled by caller
    };
    pcb.registers.set(result.0, result.1);
    Ok(())
}

/// Release a terminating PCB's frames if it is (about to be) the last
/// sharer of its page map (§4.6, §9).
pub fn release_frames_if_last_sharer(
    pcb: &Pcb,
    frame_table: &mut crate::mm::FrameTable,
) {
    if is_last_sharer(&pcb.page_map) {
        for &frame in pcb.page_map.frames() {
            frame_table.free(frame);
        }
    }
}
