//! Per-tick stage disassembly and the final register/memory report. This
//! is the simulator's required terminal output, distinct from the ambient
//! `tracing` diagnostics emitted elsewhere (see `main.rs`).

use crate::memory::DATA_MEMORY_DUMP_SIZE;
use crate::pipeline::StageLatch;
use crate::sim::Simulator;

fn stage_line(name: &str, latch: &StageLatch) {
    match latch.instruction {
        Some(instr) if !latch.nop => println!("{name}: pc={} {instr}", latch.pc),
        Some(_) => println!("{name}: pc={} NOP", latch.pc),
        None => println!("{name}: EMPTY"),
    }
}

/// Prints the per-stage disassembly for the cycle about to run, in the
/// fixed order Fetch, Decode/RF, Execute, Memory, Writeback.
pub fn print_cycle(sim: &Simulator) {
    println!("--- Cycle {} ---", sim.clock);
    stage_line("Fetch", &sim.fetch);
    stage_line("Decode/RF", &sim.decode);
    stage_line("Execute", &sim.execute);
    stage_line("Memory", &sim.memory);
    stage_line("Writeback", &sim.writeback);
}

/// Prints the final register file (with validity) and the first
/// [`DATA_MEMORY_DUMP_SIZE`] cells of data memory.
pub fn print_summary(sim: &Simulator) {
    println!("\n=== State of Architectural Registers ===");
    for (i, (value, valid)) in sim.regs.values().iter().zip(sim.regs.validity()).enumerate() {
        let status = if *valid > 0 { "Valid" } else { "Invalid" };
        println!("R{i:<2} = {value:<8} {status}");
    }

    println!("\n=== State of Data Memory ===");
    for (addr, value) in sim.data.dump(DATA_MEMORY_DUMP_SIZE).iter().enumerate() {
        println!("MEM[{addr}] = {value}");
    }
}
