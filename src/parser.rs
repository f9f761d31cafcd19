//! The textual assembly parser: turns one instruction-per-line source text
//! into a [`CodeMemory`]. Line-oriented, comma-separated tokens, first
//! token is the opcode mnemonic.
//!
//! Operand tokens take the form `R<n>` for a register or `#<n>` for an
//! immediate; the leading sigil character is stripped before the remainder
//! is parsed as a signed integer, so `R7` and `#7` both yield `7`. A bare
//! integer token (no sigil) is also accepted and is parsed directly,
//! without stripping a leading character — see `DESIGN.md` for why this
//! implementation does not replicate the source parser's literal behavior
//! of stripping the first character of every operand unconditionally.

use std::fs;
use std::path::Path;

use crate::error::ParseError;
use crate::isa::{Instruction, Opcode};
use crate::memory::CodeMemory;

/// Reads `path` and parses it into code memory.
///
/// # Errors
/// Returns [`ParseError::Io`] if the file cannot be read, or
/// [`ParseError::EmptyProgram`], [`ParseError::UnknownOpcode`], or
/// [`ParseError::MalformedInstruction`] if the text is not well-formed.
pub fn load_program(path: &Path) -> Result<CodeMemory, ParseError> {
    let text = fs::read_to_string(path).map_err(|source| ParseError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let mut instructions = Vec::new();
    for (line_no, raw_line) in text.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }
        instructions.push(parse_line(line_no + 1, line)?);
    }

    if instructions.is_empty() {
        return Err(ParseError::EmptyProgram { path: path.display().to_string() });
    }

    Ok(CodeMemory::new(instructions))
}

fn parse_line(line_no: usize, line: &str) -> Result<Instruction, ParseError> {
    let tokens: Vec<&str> = line.split(',').map(str::trim).collect();
    let malformed = || ParseError::MalformedInstruction { line: line_no, text: line.to_string() };

    let opcode = match tokens[0].to_ascii_uppercase().as_str() {
        "MOVC" => Opcode::Movc,
        "LOAD" => Opcode::Load,
        "STORE" => Opcode::Store,
        "ADD" => Opcode::Add,
        "SUB" => Opcode::Sub,
        "AND" => Opcode::And,
        "OR" => Opcode::Or,
        "XOR" => Opcode::Xor,
        "MUL" => Opcode::Mul,
        "JUMP" => Opcode::Jump,
        "BZ" => Opcode::Bz,
        "BNZ" => Opcode::Bnz,
        "HALT" => Opcode::Halt,
        other => {
            return Err(ParseError::UnknownOpcode { line: line_no, token: other.to_string() });
        }
    };

    let operand = |index: usize| -> Result<i32, ParseError> {
        let token = tokens.get(index).copied().ok_or_else(malformed)?;
        parse_operand(token).ok_or_else(malformed)
    };

    let instruction = match opcode {
        Opcode::Movc => Instruction::new(opcode, operand(1)? as usize, 0, 0, operand(2)?),
        Opcode::Load => {
            Instruction::new(opcode, operand(1)? as usize, operand(2)? as usize, 0, operand(3)?)
        }
        Opcode::Store => {
            Instruction::new(opcode, 0, operand(1)? as usize, operand(2)? as usize, operand(3)?)
        }
        Opcode::Add | Opcode::Sub | Opcode::And | Opcode::Or | Opcode::Xor | Opcode::Mul => {
            Instruction::new(
                opcode,
                operand(1)? as usize,
                operand(2)? as usize,
                operand(3)? as usize,
                0,
            )
        }
        Opcode::Jump => Instruction::new(opcode, 0, operand(1)? as usize, 0, operand(2)?),
        Opcode::Bz | Opcode::Bnz => Instruction::new(opcode, 0, 0, 0, operand(1)?),
        Opcode::Halt => Instruction::new(opcode, 0, 0, 0, 0),
    };

    Ok(instruction)
}

fn parse_operand(token: &str) -> Option<i32> {
    if token.is_empty() {
        return None;
    }
    if let Ok(bare) = token.parse::<i32>() {
        return Some(bare);
    }
    token.get(1..)?.parse::<i32>().ok()
}
