use std::path::PathBuf;
use std::process::ExitCode;

use apex_sim::error::AppError;
use apex_sim::sim::Simulator;
use apex_sim::{parser, trace};
use clap::Parser;
use clap_verbosity_flag::{InfoLevel, Verbosity};

/// Run the APEX five-stage pipeline simulator over an assembly source file.
#[derive(Debug, Parser)]
#[command(name = "apex-sim", version, about)]
struct Args {
    /// Path to the assembly source file.
    source: PathBuf,

    /// Opaque simulation-mode string, stored but unused by the core.
    mode: String,

    /// Maximum number of clock cycles to run before giving up.
    cycles: u64,

    /// Print the per-cycle stage disassembly.
    #[arg(long)]
    trace: bool,

    #[command(flatten)]
    verbosity: Verbosity<InfoLevel>,
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            eprint!("{err}");
            return ExitCode::from(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    tracing_subscriber::EnvFilter::new(args.verbosity.log_level_filter().to_string())
                }),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("apex-sim: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), AppError> {
    let code = parser::load_program(&args.source)?;
    tracing::info!(instructions = code.len(), source = %args.source.display(), "program loaded");

    let mut sim = Simulator::new(code, args.mode.clone(), args.cycles, args.trace);
    let reason = sim.run()?;
    tracing::info!(?reason, clock = sim.clock, retired = sim.retired, "run complete");

    trace::print_summary(&sim);
    Ok(())
}
