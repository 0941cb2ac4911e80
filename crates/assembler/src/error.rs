//! Error types for the IPPcode22 front ends.

use ippcode_common::{ErrorKind, InstructionError};
use thiserror::Error;

/// Errors produced while assembling IPPcode22 source text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AsmError {
    /// The first non-empty line is not `.IPPcode22`.
    #[error("line {line}: expected '.IPPcode22' header")]
    MissingHeader { line: usize },

    /// An unrecognized opcode mnemonic was encountered.
    #[error("line {line}: unknown opcode '{token}'")]
    UnknownOpcode { line: usize, token: String },

    /// An opcode did not have enough operands.
    #[error("line {line}: {opcode} expects {expected} operand(s)")]
    MissingArgument {
        line: usize,
        opcode: &'static str,
        expected: usize,
    },

    /// A token appeared after the last operand.
    #[error("line {line}: unexpected token '{token}'")]
    UnexpectedToken { line: usize, token: String },

    /// An operand does not match the syntax of the expected kind.
    #[error("line {line}: invalid {expected} '{token}'")]
    InvalidOperand {
        line: usize,
        expected: &'static str,
        token: String,
    },

    /// The operands were rejected when building the instruction.
    #[error("line {line}: {source}")]
    Instruction {
        line: usize,
        source: InstructionError,
    },
}

impl AsmError {
    /// Error category, which determines the process exit code.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AsmError::MissingHeader { .. } => ErrorKind::Header,
            AsmError::UnknownOpcode { .. } => ErrorKind::Opcode,
            AsmError::MissingArgument { .. }
            | AsmError::UnexpectedToken { .. }
            | AsmError::InvalidOperand { .. }
            | AsmError::Instruction { .. } => ErrorKind::Lexical,
        }
    }
}

/// Errors produced while loading a program from its XML representation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum XmlError {
    /// The document is not well-formed XML.
    #[error("malformed XML: {0}")]
    Malformed(String),

    /// The root element is not `<program>`.
    #[error("root element must be 'program', found '{0}'")]
    UnexpectedRoot(String),

    /// `<program>` has no `language` attribute.
    #[error("program element has no 'language' attribute")]
    MissingLanguage,

    /// `language` is not IPPcode22.
    #[error("unsupported language '{0}'")]
    UnsupportedLanguage(String),

    /// An attribute not allowed on its element.
    #[error("unexpected attribute '{attribute}' on '{element}'")]
    UnexpectedAttribute { element: String, attribute: String },

    /// A child of `<program>` other than `<instruction>`.
    #[error("unexpected element '{0}'")]
    UnexpectedElement(String),

    /// An instruction without both `order` and `opcode`.
    #[error("instruction is missing the '{0}' attribute")]
    MissingAttribute(&'static str),

    /// `order` is not a positive integer.
    #[error("invalid instruction order '{0}'")]
    InvalidOrder(String),

    /// Two instructions share an `order`.
    #[error("duplicate instruction order {0}")]
    DuplicateOrder(u64),

    /// A child of `<instruction>` other than `arg1`, `arg2` or `arg3`.
    #[error("instruction {order}: unexpected element '{name}'")]
    UnexpectedArgument { order: u64, name: String },

    /// An argument element without exactly one `type` attribute.
    #[error("instruction {order}: {name} must have exactly one 'type' attribute")]
    ArgumentAttributes { order: u64, name: String },

    /// The same argument position given twice.
    #[error("instruction {order}: duplicate {name}")]
    DuplicateArgument { order: u64, name: String },

    /// Argument positions with a gap, e.g. `arg1` and `arg3`.
    #[error("instruction {order}: missing arg{position}")]
    MissingArgument { order: u64, position: usize },

    /// `type` attribute value not known.
    #[error("instruction {order}: unknown argument type '{ty}'")]
    UnknownArgumentType { order: u64, ty: String },

    /// Unknown opcode, bad operands or unparseable literal.
    #[error("instruction {order}: {source}")]
    Instruction {
        order: u64,
        source: InstructionError,
    },
}

impl XmlError {
    /// Error category, which determines the process exit code.
    pub fn kind(&self) -> ErrorKind {
        match self {
            XmlError::Malformed(_) => ErrorKind::SourceFormat,
            _ => ErrorKind::SourceStructure,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_unknown_opcode() {
        let e = AsmError::UnknownOpcode {
            line: 3,
            token: "FOO".to_string(),
        };
        assert_eq!(e.to_string(), "line 3: unknown opcode 'FOO'");
    }

    #[test]
    fn error_display_missing_argument() {
        let e = AsmError::MissingArgument {
            line: 7,
            opcode: "DEFVAR",
            expected: 1,
        };
        assert_eq!(e.to_string(), "line 7: DEFVAR expects 1 operand(s)");
    }

    #[test]
    fn error_display_invalid_operand() {
        let e = AsmError::InvalidOperand {
            line: 2,
            expected: "var",
            token: "GF@1x".to_string(),
        };
        assert_eq!(e.to_string(), "line 2: invalid var 'GF@1x'");
    }

    #[test]
    fn asm_error_kinds() {
        assert_eq!(AsmError::MissingHeader { line: 1 }.kind().exit_code(), 21);
        assert_eq!(
            AsmError::UnknownOpcode {
                line: 1,
                token: "X".into()
            }
            .kind()
            .exit_code(),
            22
        );
        assert_eq!(
            AsmError::UnexpectedToken {
                line: 1,
                token: "X".into()
            }
            .kind()
            .exit_code(),
            23
        );
    }

    #[test]
    fn xml_error_kinds() {
        assert_eq!(XmlError::Malformed("eof".into()).kind().exit_code(), 31);
        assert_eq!(XmlError::DuplicateOrder(2).kind().exit_code(), 32);
        let e = XmlError::Instruction {
            order: 4,
            source: InstructionError::UnknownOpcode("HALT".into()),
        };
        assert_eq!(e.kind().exit_code(), 32);
        assert_eq!(e.to_string(), "instruction 4: unknown opcode 'HALT'");
    }

    #[test]
    fn error_clone_and_eq() {
        let e1 = XmlError::MissingArgument {
            order: 1,
            position: 2,
        };
        let e2 = e1.clone();
        assert_eq!(e1, e2);
    }
}
