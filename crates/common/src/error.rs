//! Error kinds shared by every IPPcode22 component, and instruction
//! construction errors.

use thiserror::Error;

/// Abstract error category. Each category maps to a stable process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Missing or forbidden command-line parameter combination.
    Parameter,
    /// Input file could not be opened or read.
    InputOpen,
    /// Output could not be opened or written.
    OutputOpen,
    /// Test directory does not exist or cannot be listed.
    TestDirectory,
    /// Source text does not start with the `.IPPcode22` header.
    Header,
    /// Source text uses an unknown opcode.
    Opcode,
    /// Lexical or syntactic error in source text.
    Lexical,
    /// XML is not well-formed.
    SourceFormat,
    /// XML is well-formed but does not describe a valid program.
    SourceStructure,
    /// Undefined or duplicate label, variable redefinition.
    Semantic,
    /// Operand of the wrong kind.
    OperandType,
    /// Access to a variable that was never declared.
    UndeclaredVariable,
    /// Access to a frame that does not exist.
    FrameNotFound,
    /// Missing value in a variable, the data stack or the call stack.
    MissingValue,
    /// Bad operand value (division by zero, EXIT code out of range).
    OperandValue,
    /// Bad string operation (index out of range, invalid code point).
    StringOperation,
    /// Unexpected host failure.
    Internal,
}

impl ErrorKind {
    /// Process exit status for this error kind.
    pub fn exit_code(&self) -> i32 {
        match self {
            ErrorKind::Parameter => 10,
            ErrorKind::InputOpen => 11,
            ErrorKind::OutputOpen => 12,
            ErrorKind::TestDirectory => 41,
            ErrorKind::Header => 21,
            ErrorKind::Opcode => 22,
            ErrorKind::Lexical => 23,
            ErrorKind::SourceFormat => 31,
            ErrorKind::SourceStructure => 32,
            ErrorKind::Semantic => 52,
            ErrorKind::OperandType => 53,
            ErrorKind::UndeclaredVariable => 54,
            ErrorKind::FrameNotFound => 55,
            ErrorKind::MissingValue => 56,
            ErrorKind::OperandValue => 57,
            ErrorKind::StringOperation => 58,
            ErrorKind::Internal => 99,
        }
    }
}

/// Errors raised while building an [`Instruction`](crate::Instruction) from
/// an opcode name and its operands.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InstructionError {
    /// Opcode name not in the instruction set.
    #[error("unknown opcode '{0}'")]
    UnknownOpcode(String),

    /// Wrong number of operands for the opcode.
    #[error("{opcode} expects {expected} operand(s), found {found}")]
    ArityMismatch {
        opcode: &'static str,
        expected: usize,
        found: usize,
    },

    /// Operand at `position` (1-based) has the wrong kind.
    #[error("{opcode} operand {position} must be a {expected}, found a {found}")]
    OperandMismatch {
        opcode: &'static str,
        position: usize,
        expected: &'static str,
        found: &'static str,
    },

    /// Constant text does not parse as its declared kind.
    #[error("invalid {kind} literal '{text}'")]
    InvalidLiteral { kind: &'static str, text: String },

    /// Variable reference not of the form `GF@name`, `LF@name` or `TF@name`.
    #[error("invalid variable '{0}'")]
    InvalidVariable(String),

    /// Type operand other than `int`, `bool` or `string`.
    #[error("unknown type name '{0}'")]
    UnknownTypeName(String),
}

impl InstructionError {
    /// Malformed instructions are structural errors of the program description.
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::SourceStructure
    }
}
