//! Disassembler: program → canonical IPPcode22 source text.
//!
//! Output is the header line followed by one instruction per line. No
//! indentation, no comments, no blank lines. Integers are written in
//! decimal and strings with `\DDD` escapes where needed.

use ippcode_common::Program;

/// Disassemble a program into canonical source text.
///
/// For programs whose names are valid identifiers the output reassembles
/// to an identical program (`assemble(disassemble(program)) == program`).
pub fn disassemble(program: &Program) -> String {
    let mut text = String::from(".IPPcode22\n");
    for instr in &program.instructions {
        text.push_str(&instr.to_string());
        text.push('\n');
    }
    text
}
