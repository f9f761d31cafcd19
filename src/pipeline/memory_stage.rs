//! Memory: data-memory access plus branch resolution. This is where a
//! taken BZ/BNZ actually redirects the PC and squashes whatever Decode and
//! Execute are currently holding — one tick before Execute itself would
//! otherwise have acted on them, since Memory runs ahead of Execute within
//! a tick.

use crate::error::SimError;
use crate::isa::Opcode;
use crate::pipeline::StageLatch;
use crate::sim::Simulator;

pub fn tick(sim: &mut Simulator) -> Result<(), SimError> {
    let Some(instr) = sim.memory.instruction else {
        sim.writeback = sim.memory.clone();
        return Ok(());
    };

    if sim.memory.nop {
        sim.writeback = sim.memory.clone();
        return Ok(());
    }

    match instr.opcode {
        Opcode::Store => {
            sim.data.write(sim.memory.mem_address, sim.memory.rs1_value, sim.memory.pc)?;
        }

        Opcode::Load => {
            sim.memory.buffer = sim.data.read(sim.memory.mem_address, sim.memory.pc)?;
        }

        Opcode::Bz | Opcode::Bnz => {
            if sim.memory.mem_address != 0 {
                sim.pc = sim.memory.mem_address;

                if let Some(squashed) = sim.execute.instruction {
                    if matches!(
                        squashed.opcode,
                        Opcode::Add
                            | Opcode::Sub
                            | Opcode::Mul
                            | Opcode::And
                            | Opcode::Or
                            | Opcode::Xor
                            | Opcode::Movc
                            | Opcode::Load
                    ) {
                        sim.regs.mark_valid(squashed.rd);
                    }
                }

                sim.execute = StageLatch::empty();
                sim.decode = StageLatch::empty();

                // Forward branches subtract the skipped-instruction count;
                // backward branches *add* the already-negative `imm/4` and
                // then subtract one more, matching the original's
                // `ins_completed = (ins_completed + (imm/4)) - 1` path.
                let adjust: i32 = if instr.imm < 0 { instr.imm / 4 - 1 } else { -(instr.imm / 4) };
                sim.retired = sim.retired.saturating_add_signed(adjust as isize);

                if sim.ex_halt {
                    sim.ex_halt = false;
                    sim.fetch.stalled = false;
                }
            }
        }

        Opcode::Halt => {
            sim.execute = StageLatch::empty();
            sim.decode = StageLatch::empty();
            sim.fetch = StageLatch::empty();
            sim.ex_halt = true;
        }

        _ => {}
    }

    sim.writeback = sim.memory.clone();
    Ok(())
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
    fn store_then_load_round_trip_through_data_memory() {
        let mut sim = sim_with(vec![Instruction::new(Opcode::Store, 0, 0, 0, 0)]);
        sim.memory.instruction = Some(Instruction::new(Opcode::Store, 0, 0, 0, 0));
        sim.memory.mem_address = 8;
        sim.memory.rs1_value = 77;
        tick(&mut sim).unwrap();
        assert_eq!(sim.data.read(8, 4000).unwrap(), 77);
    }

    #[test]
    fn taken_branch_redirects_pc_and_squashes_execute_and_decode() {
        let mut sim = sim_with(vec![Instruction::new(Opcode::Bz, 0, 0, 0, 16)]);
        sim.memory.instruction = Some(Instruction::new(Opcode::Bz, 0, 0, 0, 16));
        sim.memory.mem_address = 4020;
        sim.memory.pc = 4004;
        sim.execute.instruction = Some(Instruction::new(Opcode::Add, 2, 0, 0, 0));
        sim.regs.mark_pending(2);
        sim.decode.instruction = Some(Instruction::new(Opcode::Sub, 3, 0, 0, 0));

        tick(&mut sim).unwrap();

        assert_eq!(sim.pc, 4020);
        assert!(sim.execute.is_empty());
        assert!(sim.decode.is_empty());
        assert!(sim.regs.is_valid(2));
    }

    #[test]
    fn not_taken_branch_leaves_pipeline_untouched() {
        let mut sim = sim_with(vec![Instruction::new(Opcode::Bz, 0, 0, 0, 16)]);
        sim.memory.instruction = Some(Instruction::new(Opcode::Bz, 0, 0, 0, 16));
        sim.memory.mem_address = 0;
        sim.execute.instruction = Some(Instruction::new(Opcode::Add, 2, 0, 0, 0));

        tick(&mut sim).unwrap();

        assert_eq!(sim.pc, 4000);
        assert!(sim.execute.instruction.is_some());
    }

    #[test]
    fn out_of_bounds_store_is_a_fatal_error() {
        let mut sim = sim_with(vec![Instruction::new(Opcode::Store, 0, 0, 0, 0)]);
        sim.memory.instruction = Some(Instruction::new(Opcode::Store, 0, 0, 0, 0));
        sim.memory.mem_address = -1;
        assert!(tick(&mut sim).is_err());
    }

    #[test]
    fn nop_bubble_forwards_without_architectural_effect() {
        let mut sim = sim_with(vec![Instruction::new(Opcode::Mul, 0, 0, 0, 0)]);
        sim.memory.instruction = Some(Instruction::new(Opcode::Mul, 0, 0, 0, 0));
        sim.memory.nop = true;
        sim.memory.buffer = 999;
        tick(&mut sim).unwrap();
        assert!(sim.writeback.nop);
        assert_eq!(sim.writeback.buffer, 999);
    }
}
