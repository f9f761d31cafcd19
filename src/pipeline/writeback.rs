//! Writeback: commits register results and retires instructions.

use crate::isa::Opcode;
use crate::pipeline::StageLatch;
use crate::sim::Simulator;

pub fn tick(sim: &mut Simulator) {
    let Some(instr) = sim.writeback.instruction else {
        return;
    };

    if sim.writeback.nop {
        return;
    }

    if instr.opcode.writes_register() {
        sim.regs.write(instr.rd, sim.writeback.buffer);
        sim.regs.mark_valid(instr.rd);
        // Any retiring write settles the hazard that may have stalled the
        // front end; release both unconditionally.
        sim.fetch.stalled = false;
        sim.decode.stalled = false;
    }

    if instr.opcode == Opcode::Halt {
        sim.retired = sim.code.len().saturating_sub(1);
        sim.halted = true;
        sim.execute = StageLatch::empty();
        sim.decode = StageLatch::empty();
        sim.fetch = StageLatch::empty();
    }

    sim.retired += 1;
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
    fn register_write_commits_value_and_restores_validity() {
        let mut sim = sim_with(vec![Instruction::new(Opcode::Movc, 4, 0, 0, 0)]);
        sim.writeback.instruction = Some(Instruction::new(Opcode::Movc, 4, 0, 0, 0));
        sim.writeback.buffer = 42;
        sim.regs.mark_pending(4);
        tick(&mut sim);
        assert_eq!(sim.regs.read(4), 42);
        assert!(sim.regs.is_valid(4));
        assert_eq!(sim.retired, 1);
    }

    #[test]
    fn store_retires_without_writing_a_register() {
        let mut sim = sim_with(vec![Instruction::new(Opcode::Store, 0, 0, 0, 0)]);
        sim.writeback.instruction = Some(Instruction::new(Opcode::Store, 0, 0, 0, 0));
        tick(&mut sim);
        assert_eq!(sim.retired, 1);
    }

    #[test]
    fn nop_bubble_does_not_retire() {
        let mut sim = sim_with(vec![Instruction::new(Opcode::Mul, 0, 0, 0, 0)]);
        sim.writeback.instruction = Some(Instruction::new(Opcode::Mul, 0, 0, 0, 0));
        sim.writeback.nop = true;
        tick(&mut sim);
        assert_eq!(sim.retired, 0);
    }

    #[test]
    fn halt_forces_retired_to_code_memory_size() {
        let mut sim = sim_with(vec![
            Instruction::new(Opcode::Movc, 0, 0, 0, 1),
            Instruction::new(Opcode::Halt, 0, 0, 0, 0),
        ]);
        sim.writeback.instruction = Some(Instruction::new(Opcode::Halt, 0, 0, 0, 0));
        tick(&mut sim);
        assert_eq!(sim.retired, sim.code.len());
        assert!(sim.halted);
    }
}
