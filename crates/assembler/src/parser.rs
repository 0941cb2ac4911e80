//! Parser for IPPcode22 source words into instructions.
//!
//! The opcode's signature decides how each operand word is read.

use crate::error::AsmError;
use crate::lexer::{is_identifier, lex_constant, lex_type, lex_variable};
use ippcode_common::{Instruction, Opcode, Operand, OperandKind};

/// Parse the words of a single line into an instruction.
///
/// Returns `Ok(None)` for blank lines (empty word list).
pub(crate) fn parse_line(words: &[&str], line_num: usize) -> Result<Option<Instruction>, AsmError> {
    let Some((&mnemonic, args)) = words.split_first() else {
        return Ok(None);
    };

    let opcode = Opcode::from_mnemonic(mnemonic).map_err(|_| AsmError::UnknownOpcode {
        line: line_num,
        token: mnemonic.to_string(),
    })?;

    let signature = opcode.signature();
    if args.len() < signature.len() {
        return Err(AsmError::MissingArgument {
            line: line_num,
            opcode: opcode.mnemonic(),
            expected: signature.len(),
        });
    }
    if let Some(extra) = args.get(signature.len()) {
        return Err(AsmError::UnexpectedToken {
            line: line_num,
            token: extra.to_string(),
        });
    }

    let operands = signature
        .iter()
        .zip(args)
        .map(|(&kind, word)| parse_operand(kind, word, line_num))
        .collect::<Result<Vec<_>, _>>()?;

    Instruction::new(opcode, operands)
        .map(Some)
        .map_err(|source| AsmError::Instruction {
            line: line_num,
            source,
        })
}

/// Read one operand word as the kind the opcode expects.
fn parse_operand(kind: OperandKind, word: &str, line_num: usize) -> Result<Operand, AsmError> {
    let operand = match kind {
        OperandKind::Var => lex_variable(word).map(Operand::Var),
        OperandKind::Symb => lex_variable(word)
            .map(Operand::Var)
            .or_else(|| lex_constant(word).map(Operand::Const)),
        OperandKind::Label => is_identifier(word).then(|| Operand::Label(word.to_string())),
        OperandKind::Type => lex_type(word).map(Operand::Type),
    };

    operand.ok_or_else(|| AsmError::InvalidOperand {
        line: line_num,
        expected: kind.name(),
        token: word.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ippcode_common::{FrameTag, Symbol, Value, ValueKind, Variable};

    fn gf(name: &str) -> Variable {
        Variable::new(FrameTag::Global, name)
    }

    #[test]
    fn blank_line() {
        assert_eq!(parse_line(&[], 1), Ok(None));
    }

    #[test]
    fn nullary() {
        assert_eq!(
            parse_line(&["createframe"], 1),
            Ok(Some(Instruction::CreateFrame))
        );
    }

    #[test]
    fn var_and_symbol() {
        assert_eq!(
            parse_line(&["MOVE", "GF@x", "int@-3"], 1),
            Ok(Some(Instruction::Move(
                gf("x"),
                Symbol::Const(Value::Int(-3))
            )))
        );
        assert_eq!(
            parse_line(&["MOVE", "GF@x", "TF@y"], 1),
            Ok(Some(Instruction::Move(
                gf("x"),
                Symbol::Var(Variable::new(FrameTag::Temporary, "y"))
            )))
        );
    }

    #[test]
    fn label_and_symbols() {
        assert_eq!(
            parse_line(&["JUMPIFEQ", "end", "GF@x", "nil@nil"], 4),
            Ok(Some(Instruction::JumpIfEq(
                "end".into(),
                Symbol::Var(gf("x")),
                Symbol::Const(Value::Nil)
            )))
        );
    }

    #[test]
    fn read_type_operand() {
        assert_eq!(
            parse_line(&["READ", "GF@n", "bool"], 1),
            Ok(Some(Instruction::Read(gf("n"), ValueKind::Bool)))
        );
    }

    #[test]
    fn unknown_opcode() {
        assert_eq!(
            parse_line(&["HALT"], 2),
            Err(AsmError::UnknownOpcode {
                line: 2,
                token: "HALT".into()
            })
        );
    }

    #[test]
    fn missing_argument() {
        assert_eq!(
            parse_line(&["ADD", "GF@x", "int@1"], 3),
            Err(AsmError::MissingArgument {
                line: 3,
                opcode: "ADD",
                expected: 3
            })
        );
    }

    #[test]
    fn extra_argument() {
        assert_eq!(
            parse_line(&["RETURN", "now"], 5),
            Err(AsmError::UnexpectedToken {
                line: 5,
                token: "now".into()
            })
        );
    }

    #[test]
    fn constant_where_variable_expected() {
        assert_eq!(
            parse_line(&["DEFVAR", "int@1"], 1),
            Err(AsmError::InvalidOperand {
                line: 1,
                expected: "var",
                token: "int@1".into()
            })
        );
    }

    #[test]
    fn variable_is_not_a_label() {
        assert!(matches!(
            parse_line(&["JUMP", "GF@x"], 1),
            Err(AsmError::InvalidOperand {
                expected: "label",
                ..
            })
        ));
    }

    #[test]
    fn bad_literal() {
        assert!(matches!(
            parse_line(&["WRITE", "int@abc"], 1),
            Err(AsmError::InvalidOperand { .. })
        ));
        assert!(matches!(
            parse_line(&["WRITE", "string@a\\1"], 1),
            Err(AsmError::InvalidOperand { .. })
        ));
    }
}
