//! The simulator: owns all architectural and microarchitectural state and
//! drives the pipeline one tick at a time.

use crate::error::SimError;
use crate::memory::{CODE_BASE, CodeMemory, DATA_MEMORY_SIZE, DataMemory};
use crate::pipeline::StageLatch;
use crate::registers::RegisterFile;

/// Why the simulator stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Every instruction in the program retired.
    AllRetired,
    /// The user-supplied cycle budget was exhausted first.
    CycleCapReached,
    /// A HALT instruction retired.
    Halted,
}

/// Owns every piece of state that changes as the pipeline runs: registers,
/// memories, the five stage latches, the program counter, the clock, and
/// the bookkeeping the terminal report and termination check need.
#[derive(Debug)]
pub struct Simulator {
    pub regs: RegisterFile,
    pub code: CodeMemory,
    pub data: DataMemory,

    pub pc: i32,
    pub clock: u64,
    pub zero: bool,
    pub retired: usize,
    pub ex_halt: bool,
    /// Set by Writeback when a HALT instruction retires.
    pub halted: bool,

    pub fetch: StageLatch,
    pub decode: StageLatch,
    pub execute: StageLatch,
    pub memory: StageLatch,
    pub writeback: StageLatch,

    /// Opaque simulation-mode string accepted on the command line and
    /// stored for reference; the pipeline core never reads it.
    pub mode: String,
    pub cycle_cap: u64,
    pub trace: bool,
}

impl Simulator {
    #[must_use]
    pub fn new(code: CodeMemory, mode: String, cycle_cap: u64, trace: bool) -> Self {
        Self {
            regs: RegisterFile::new(),
            code,
            data: DataMemory::new(DATA_MEMORY_SIZE),
            pc: CODE_BASE,
            clock: 0,
            zero: false,
            retired: 0,
            ex_halt: false,
            halted: false,
            fetch: StageLatch::empty(),
            decode: StageLatch::empty(),
            execute: StageLatch::empty(),
            memory: StageLatch::empty(),
            writeback: StageLatch::empty(),
            mode,
            cycle_cap,
            trace,
        }
    }

    /// Runs the pipeline to completion, returning why it stopped.
    ///
    /// # Errors
    /// Propagates a [`SimError`] from any stage (currently only an
    /// out-of-range data-memory access in Memory).
    pub fn run(&mut self) -> Result<StopReason, SimError> {
        loop {
            if let Some(reason) = self.stop_reason() {
                tracing::info!(clock = self.clock, retired = self.retired, ?reason, "pipeline terminated");
                return Ok(reason);
            }
            self.tick()?;
        }
    }

    fn stop_reason(&self) -> Option<StopReason> {
        if self.retired >= self.code.len() {
            Some(if self.halted { StopReason::Halted } else { StopReason::AllRetired })
        } else if self.clock >= self.cycle_cap {
            Some(StopReason::CycleCapReached)
        } else {
            None
        }
    }

    /// Advances the pipeline by one cycle. Stages run in reverse dataflow
    /// order — Writeback, Memory, Execute, Decode, Fetch — so that each
    /// stage consumes the latch its upstream neighbor produced on the
    /// *previous* tick before that latch is overwritten this tick.
    fn tick(&mut self) -> Result<(), SimError> {
        if self.trace {
            crate::trace::print_cycle(self);
        }
        crate::pipeline::writeback::tick(self);
        crate::pipeline::memory_stage::tick(self)?;
        crate::pipeline::execute::tick(self);
        crate::pipeline::decode::tick(self);
        crate::pipeline::fetch::tick(self);
        self.clock += 1;
        Ok(())
    }
}
