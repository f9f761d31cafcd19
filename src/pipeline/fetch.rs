//! Fetch: keeps the F latch populated with the instruction at the current
//! PC while the front end is not frozen by a stall or a flush.

use crate::memory::INSTRUCTION_WIDTH;
use crate::pipeline::StageLatch;
use crate::sim::Simulator;

pub fn tick(sim: &mut Simulator) {
    if sim.execute.flush {
        sim.fetch = StageLatch::empty();
        return;
    }

    let instruction = sim.code.fetch(sim.pc);
    sim.fetch.instruction = instruction;
    sim.fetch.pc = sim.pc;

    if sim.decode.stalled || sim.fetch.stalled || sim.fetch.busy {
        // DRF could not accept a hand-off, or F itself is frozen (MUL
        // re-fetch path): hold the same PC and re-read it next tick.
        return;
    }

    sim.pc += INSTRUCTION_WIDTH;
    sim.decode = sim.fetch.clone();
}
