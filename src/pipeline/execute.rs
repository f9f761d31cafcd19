//! Execute: the ALU, effective-address computation, branch condition
//! evaluation, and the two-cycle MUL functional unit.

use crate::isa::Opcode;
use crate::pipeline::StageLatch;
use crate::sim::Simulator;

pub fn tick(sim: &mut Simulator) {
    let Some(instr) = sim.execute.instruction else {
        sim.memory = sim.execute.clone();
        return;
    };

    match instr.opcode {
        Opcode::Store => {
            sim.execute.mem_address = sim.execute.rs2_value + instr.imm;
        }

        Opcode::Load => {
            sim.execute.mem_address = sim.execute.rs1_value + instr.imm;
        }

        Opcode::Movc => {
            sim.execute.buffer = instr.imm;
        }

        Opcode::Add => {
            let result = sim.execute.rs1_value.wrapping_add(sim.execute.rs2_value);
            sim.execute.buffer = result;
            sim.zero = result == 0;
        }

        Opcode::Sub => {
            let result = sim.execute.rs1_value.wrapping_sub(sim.execute.rs2_value);
            sim.execute.buffer = result;
            sim.zero = result == 0;
        }

        Opcode::And => sim.execute.buffer = sim.execute.rs1_value & sim.execute.rs2_value,
        Opcode::Or => sim.execute.buffer = sim.execute.rs1_value | sim.execute.rs2_value,
        Opcode::Xor => sim.execute.buffer = sim.execute.rs1_value ^ sim.execute.rs2_value,

        Opcode::Mul => {
            if sim.execute.mul_flag {
                let result = sim.execute.rs1_value.wrapping_mul(sim.execute.rs2_value);
                sim.execute.buffer = result;
                sim.zero = result == 0;
                sim.execute.nop = false;
                sim.execute.busy = false;
            } else {
                // First of two cycles: no result yet, hold Execute busy and
                // forward a bubble downstream.
                sim.execute.mul_flag = true;
                sim.execute.busy = true;
                sim.execute.nop = true;
            }
        }

        Opcode::Jump => {
            // Writes PC directly, with no flush of Decode/Fetch: wrong-path
            // instructions already in the front end are allowed to leak
            // through, matching the source design.
            sim.pc = sim.execute.rs1_value + instr.imm;
        }

        Opcode::Bz => {
            if sim.zero {
                sim.execute.mem_address = sim.execute.pc + instr.imm;
                sim.zero = false;
            } else {
                sim.execute.mem_address = 0;
            }
        }

        Opcode::Bnz => {
            if sim.zero {
                sim.execute.mem_address = 0;
            } else {
                sim.execute.mem_address = sim.execute.pc + instr.imm;
            }
        }

        Opcode::Halt => {
            sim.execute.flush = true;
            sim.decode = StageLatch::empty();
            sim.decode.stalled = true;
            sim.fetch = StageLatch::empty();
            sim.fetch.stalled = true;
            sim.ex_halt = true;
        }
    }

    sim.memory = sim.execute.clone();
}
