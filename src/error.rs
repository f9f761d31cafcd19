//! Structured error types. Initialization failures and the one fatal runtime
//! condition (an out-of-range data-memory access) are reported through
//! these variants rather than by panicking.

use thiserror::Error;

/// Errors that can occur while parsing an assembly source file into code
/// memory.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("cannot read source file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("program is empty: {path}")]
    EmptyProgram { path: String },

    #[error("line {line}: unrecognized opcode {token:?}")]
    UnknownOpcode { line: usize, token: String },

    #[error("line {line}: malformed instruction {text:?}")]
    MalformedInstruction { line: usize, text: String },
}

/// Errors that can occur while the pipeline is running.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("data memory access out of bounds: address {address} at pc {pc}")]
    MemoryOutOfBounds { address: i32, pc: i32 },
}

/// The top-level error type returned by the binary's `main`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Sim(#[from] SimError),
}
