//! Decode / Register Read: the hazard-detection stage. Admits an
//! instruction to Execute only once its source operands are valid, marking
//! any destination register as pending for the duration the write is in
//! flight.

use crate::isa::Opcode;
use crate::pipeline::StageLatch;
use crate::sim::Simulator;

pub fn tick(sim: &mut Simulator) {
    if sim.execute.flush {
        // Execute just set this flush flag on its own latch this same tick
        // (Execute runs before Decode within a tick) to carry a HALT's
        // freeze forward to Fetch, which runs after Decode. Leave the EX
        // latch untouched — in particular do not let it be blanked below,
        // which would erase the flush before Fetch ever observes it.
        return;
    }

    // Stall flags are re-evaluated fresh every tick rather than latched
    // from the previous one.
    sim.fetch.stalled = false;
    sim.decode.stalled = false;

    if sim.execute.busy {
        // Execute is mid-MUL: nothing may enter it this tick.
        sim.fetch.stalled = true;
        sim.decode.stalled = true;
        return;
    }

    let Some(instr) = sim.decode.instruction else {
        sim.execute = StageLatch::empty();
        return;
    };

    let mut admit = true;
    let mut rs1_value = 0;
    let mut rs2_value = 0;
    let mut arithmetic_instr = false;

    match instr.opcode {
        Opcode::Movc => {}

        Opcode::Load => {
            if sim.regs.is_valid(instr.rs1) {
                rs1_value = sim.regs.read(instr.rs1);
            } else {
                admit = false;
            }
        }

        Opcode::Store => {
            if sim.regs.is_valid(instr.rs1) && sim.regs.is_valid(instr.rs2) {
                rs1_value = sim.regs.read(instr.rs1);
                rs2_value = sim.regs.read(instr.rs2);
            } else {
                admit = false;
            }
        }

        Opcode::Add | Opcode::Sub | Opcode::And | Opcode::Or | Opcode::Xor | Opcode::Mul => {
            if sim.regs.is_valid(instr.rs1) && sim.regs.is_valid(instr.rs2) {
                rs1_value = sim.regs.read(instr.rs1);
                rs2_value = sim.regs.read(instr.rs2);
                arithmetic_instr = matches!(instr.opcode, Opcode::Add | Opcode::Sub | Opcode::Mul);
            } else {
                admit = false;
            }
        }

        Opcode::Jump => {
            // No validity gate on rs1 here: the source design reads it
            // unconditionally, and this implementation preserves that.
            rs1_value = sim.regs.read(instr.rs1);
        }

        Opcode::Bz | Opcode::Bnz => {
            // The zero flag may still belong to an arithmetic instruction
            // sitting in Memory or Writeback this tick; stall rather than
            // branch on a stale flag.
            if sim.memory.arithmetic_instr || sim.writeback.arithmetic_instr {
                admit = false;
            }
        }

        Opcode::Halt => {
            sim.fetch = StageLatch::empty();
            sim.fetch.stalled = true;
            sim.ex_halt = true;
        }
    }

    if !admit {
        sim.fetch.stalled = true;
        sim.decode.stalled = true;
        return;
    }

    sim.decode.rs1_value = rs1_value;
    sim.decode.rs2_value = rs2_value;
    sim.decode.arithmetic_instr = arithmetic_instr;

    if instr.opcode.writes_register() {
        sim.regs.mark_pending(instr.rd);
    }

    sim.execute = sim.decode.clone();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::isa::Instruction;
    use crate::memory::CodeMemory;

    fn sim_with(instructions: Vec<Instruction>) -> Simulator {
        Simulator::new(CodeMemory::new(instructions), String::new(), 100, false)
    }

    #[test]
    fn movc_admits_unconditionally_and_marks_rd_pending() {
        let mut sim = sim_with(vec![Instruction::new(Opcode::Movc, 2, 0, 0, 5)]);
        sim.decode.instruction = Some(Instruction::new(Opcode::Movc, 2, 0, 0, 5));
        tick(&mut sim);
        assert!(!sim.regs.is_valid(2));
        assert!(sim.execute.instruction.is_some());
    }

    #[test]
    fn add_stalls_when_source_register_invalid() {
        let mut sim = sim_with(vec![Instruction::new(Opcode::Add, 3, 1, 2, 0)]);
        sim.decode.instruction = Some(Instruction::new(Opcode::Add, 3, 1, 2, 0));
        sim.regs.mark_pending(1);
        tick(&mut sim);
        assert!(sim.decode.stalled);
        assert!(sim.fetch.stalled);
    }

    #[test]
    fn branch_stalls_while_arithmetic_producer_in_flight() {
        let mut sim = sim_with(vec![Instruction::new(Opcode::Bz, 0, 0, 0, 8)]);
        sim.decode.instruction = Some(Instruction::new(Opcode::Bz, 0, 0, 0, 8));
        sim.memory.arithmetic_instr = true;
        tick(&mut sim);
        assert!(sim.decode.stalled);
    }

    #[test]
    fn jump_reads_rs1_with_no_validity_check() {
        let mut sim = sim_with(vec![Instruction::new(Opcode::Jump, 0, 4, 0, 0)]);
        sim.decode.instruction = Some(Instruction::new(Opcode::Jump, 0, 4, 0, 0));
        sim.regs.mark_pending(4);
        tick(&mut sim);
        assert!(!sim.decode.stalled);
        assert!(sim.execute.instruction.is_some());
    }
}
