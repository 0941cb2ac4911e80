//! IPPcode22 front ends: source text and XML.
//!
//! - [`assemble`] reads IPPcode22 source text into a [`Program`].
//! - [`disassemble`] writes a program back as canonical source text.
//! - [`to_xml`] and [`load_xml`] convert between programs and the XML
//!   representation consumed by the interpreter.
//!
//! # Usage
//!
//! ```
//! use ippcode_assembler::{assemble, disassemble, load_xml, to_xml};
//!
//! let text = ".IPPcode22\nDEFVAR GF@x\nMOVE GF@x int@42\nWRITE GF@x\n";
//! let program = assemble(text).unwrap();
//! assert_eq!(disassemble(&program), text);
//! assert_eq!(load_xml(&to_xml(&program)).unwrap(), program);
//! ```
//!
//! # Roundtrip Guarantee
//!
//! `assemble(disassemble(program)) == program` holds for programs whose
//! labels and variable names are valid identifiers. The disassembler
//! outputs canonical text; the assembler also accepts non-canonical input
//! (lowercase opcodes, octal and hex integers, comments).

pub mod error;
pub mod xml;

mod disassembler;
mod lexer;
mod parser;

pub use error::{AsmError, XmlError};
pub use xml::{load_xml, to_xml};

use ippcode_common::Program;
use lexer::{is_header, tokenize_line};
use parser::parse_line;
use tracing::debug;

/// Assemble IPPcode22 source text into a program.
///
/// The first non-empty line must be the `.IPPcode22` header. Input with no
/// instructions at all is an empty program. Returns the first error
/// encountered.
pub fn assemble(text: &str) -> Result<Program, AsmError> {
    let mut instructions = Vec::new();
    let mut header_seen = false;

    for (idx, line) in text.lines().enumerate() {
        let line_num = idx + 1;
        let words = tokenize_line(line);
        if words.is_empty() {
            continue;
        }

        if !header_seen {
            if !is_header(&words) {
                return Err(AsmError::MissingHeader { line: line_num });
            }
            header_seen = true;
            continue;
        }

        if let Some(instr) = parse_line(&words, line_num)? {
            instructions.push(instr);
        }
    }

    debug!(instructions = instructions.len(), "source assembled");
    Ok(Program::new(instructions))
}

/// Disassemble a program into canonical source text.
///
/// The output starts with the header line, then one instruction per line.
pub fn disassemble(program: &Program) -> String {
    disassembler::disassemble(program)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ippcode_common::{FrameTag, Instruction, Symbol, Value, Variable};

    #[test]
    fn assemble_minimal() {
        let program = assemble(".IPPcode22\nWRITE string@hi\n").unwrap();
        assert_eq!(
            program.instructions,
            vec![Instruction::Write(Symbol::Const(Value::String("hi".into())))]
        );
    }

    #[test]
    fn empty_input_is_empty_program() {
        assert_eq!(assemble(""), Ok(Program::default()));
        assert_eq!(assemble("# nothing here\n\n"), Ok(Program::default()));
    }

    #[test]
    fn header_only() {
        assert_eq!(assemble(".ippcode22 # header\n"), Ok(Program::default()));
    }

    #[test]
    fn roundtrip_disassemble_then_assemble() {
        let x = Variable::new(FrameTag::Global, "x");
        let original = Program::new(vec![
            Instruction::DefVar(x.clone()),
            Instruction::Read(x.clone(), ippcode_common::ValueKind::String),
            Instruction::Label("loop".into()),
            Instruction::Concat(
                x.clone(),
                Symbol::Var(x.clone()),
                Symbol::Const(Value::String(" \\ # \n".into())),
            ),
            Instruction::JumpIfEq("loop".into(), Symbol::Var(x), Symbol::Const(Value::Nil)),
        ]);
        let text = disassemble(&original);
        let reassembled = assemble(&text).unwrap();
        assert_eq!(original, reassembled);
    }

    #[test]
    fn roundtrip_assemble_then_disassemble_then_assemble() {
        let text = ".ippCode22\nmove GF@x int@0x1f\nwrite bool@true\n";
        let first = assemble(text).unwrap();
        let canonical = disassemble(&first);
        assert_eq!(canonical, ".IPPcode22\nMOVE GF@x int@31\nWRITE bool@true\n");
        let second = assemble(&canonical).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn assemble_with_comments_and_blanks() {
        let text = "\
# leading comment
.IPPcode22   # header

DEFVAR GF@a # declare
   WRITE   GF@a
";
        let program = assemble(text).unwrap();
        assert_eq!(program.len(), 2);
    }

    #[test]
    fn octal_and_hex_produce_same_result() {
        let oct = assemble(".IPPcode22\nPUSHS int@0o777\n").unwrap();
        let hex = assemble(".IPPcode22\nPUSHS int@0x1FF\n").unwrap();
        let dec = assemble(".IPPcode22\nPUSHS int@511\n").unwrap();
        assert_eq!(oct, hex);
        assert_eq!(hex, dec);
    }

    #[test]
    fn error_missing_header() {
        let err = assemble("WRITE int@1\n").unwrap_err();
        assert_eq!(err, AsmError::MissingHeader { line: 1 });
        assert_eq!(err.kind().exit_code(), 21);
    }

    #[test]
    fn error_unknown_opcode() {
        let err = assemble(".IPPcode22\nFOOBAR\n").unwrap_err();
        assert!(matches!(err, AsmError::UnknownOpcode { line: 2, .. }));
        assert_eq!(err.kind().exit_code(), 22);
    }

    #[test]
    fn error_repeated_header() {
        let err = assemble(".IPPcode22\n.IPPcode22\n").unwrap_err();
        assert!(matches!(err, AsmError::UnknownOpcode { line: 2, .. }));
    }

    #[test]
    fn error_missing_argument() {
        let err = assemble(".IPPcode22\nDEFVAR\n").unwrap_err();
        assert!(matches!(err, AsmError::MissingArgument { line: 2, .. }));
        assert_eq!(err.kind().exit_code(), 23);
    }

    #[test]
    fn opcode_error_wins_over_bad_operands() {
        let err = assemble(".IPPcode22\nFOO GF@1bad\n").unwrap_err();
        assert!(matches!(err, AsmError::UnknownOpcode { .. }));
    }

    #[test]
    fn error_reports_correct_line() {
        let text = ".IPPcode22\nBREAK\n\n# c\nMOVE GF@x\n";
        let err = assemble(text).unwrap_err();
        assert!(matches!(err, AsmError::MissingArgument { line: 5, .. }));
    }
}
