//! Runtime errors for the IPPcode22 engine.
//!
//! Every error carries the index (`at`) of the instruction that raised it.
//! For execution errors this is the program counter; for ingestion errors
//! it is the position in the raw instruction sequence.

use ippcode_common::{ErrorKind, FrameTag, Opcode};
use thiserror::Error;

/// Errors that occur while ingesting or executing a program.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    /// A LABEL name appears more than once.
    #[error("duplicate label '{name}' at instruction {at}")]
    DuplicateLabel { at: usize, name: String },

    /// JUMP, CALL or a conditional jump names a label that does not exist.
    #[error("undefined label '{name}' at instruction {at}")]
    UndefinedLabel { at: usize, name: String },

    /// DEFVAR on a name that already exists in its frame.
    #[error("redefinition of variable {var} at instruction {at}")]
    Redefinition { at: usize, var: String },

    /// Operand values of a kind the opcode does not accept.
    #[error("{opcode}: bad operand types ({found}) at instruction {at}")]
    OperandType {
        at: usize,
        opcode: Opcode,
        found: String,
    },

    /// Access to a variable that was never declared.
    #[error("undeclared variable {var} at instruction {at}")]
    UndeclaredVariable { at: usize, var: String },

    /// LF with an empty local frame stack, or TF with no temporary frame.
    #[error("frame {frame} does not exist at instruction {at}")]
    FrameNotFound { at: usize, frame: FrameTag },

    /// Read of a declared variable that holds no value.
    #[error("variable {var} has no value at instruction {at}")]
    UnsetVariable { at: usize, var: String },

    /// POPS on an empty data stack.
    #[error("data stack is empty at instruction {at}")]
    EmptyDataStack { at: usize },

    /// RETURN on an empty call stack.
    #[error("call stack is empty at instruction {at}")]
    EmptyCallStack { at: usize },

    /// IDIV with a zero divisor.
    #[error("division by zero at instruction {at}")]
    DivisionByZero { at: usize },

    /// EXIT with a code outside 0..=49.
    #[error("exit code {code} out of range 0..=49 at instruction {at}")]
    ExitCodeOutOfRange { at: usize, code: i64 },

    /// String index below zero or past the last character.
    #[error("index {index} out of range (length {length}) at instruction {at}")]
    IndexOutOfRange { at: usize, index: i64, length: usize },

    /// INT2CHAR with a value that is not a Unicode scalar value.
    #[error("invalid code point {code} at instruction {at}")]
    InvalidCodePoint { at: usize, code: i64 },

    /// The input stream could not be read.
    #[error("cannot read input at instruction {at}: {reason}")]
    ReadFailed { at: usize, reason: String },

    /// The output or diagnostic stream could not be written.
    #[error("cannot write output at instruction {at}: {reason}")]
    WriteFailed { at: usize, reason: String },
}

impl RuntimeError {
    /// Error category, which determines the process exit code.
    pub fn kind(&self) -> ErrorKind {
        match self {
            RuntimeError::DuplicateLabel { .. }
            | RuntimeError::UndefinedLabel { .. }
            | RuntimeError::Redefinition { .. } => ErrorKind::Semantic,
            RuntimeError::OperandType { .. } => ErrorKind::OperandType,
            RuntimeError::UndeclaredVariable { .. } => ErrorKind::UndeclaredVariable,
            RuntimeError::FrameNotFound { .. } => ErrorKind::FrameNotFound,
            RuntimeError::UnsetVariable { .. }
            | RuntimeError::EmptyDataStack { .. }
            | RuntimeError::EmptyCallStack { .. } => ErrorKind::MissingValue,
            RuntimeError::DivisionByZero { .. } | RuntimeError::ExitCodeOutOfRange { .. } => {
                ErrorKind::OperandValue
            }
            RuntimeError::IndexOutOfRange { .. } | RuntimeError::InvalidCodePoint { .. } => {
                ErrorKind::StringOperation
            }
            RuntimeError::ReadFailed { .. } => ErrorKind::InputOpen,
            RuntimeError::WriteFailed { .. } => ErrorKind::OutputOpen,
        }
    }

    /// Index of the instruction that raised the error.
    pub fn at(&self) -> usize {
        match self {
            RuntimeError::DuplicateLabel { at, .. }
            | RuntimeError::UndefinedLabel { at, .. }
            | RuntimeError::Redefinition { at, .. }
            | RuntimeError::OperandType { at, .. }
            | RuntimeError::UndeclaredVariable { at, .. }
            | RuntimeError::FrameNotFound { at, .. }
            | RuntimeError::UnsetVariable { at, .. }
            | RuntimeError::EmptyDataStack { at }
            | RuntimeError::EmptyCallStack { at }
            | RuntimeError::DivisionByZero { at }
            | RuntimeError::ExitCodeOutOfRange { at, .. }
            | RuntimeError::IndexOutOfRange { at, .. }
            | RuntimeError::InvalidCodePoint { at, .. }
            | RuntimeError::ReadFailed { at, .. }
            | RuntimeError::WriteFailed { at, .. } => *at,
        }
    }
}
