//! Opcode definitions for the IPPcode22 instruction set.
//!
//! The opcode table is closed: names are resolved once, at load time, and
//! every opcode carries a fixed operand signature.

use crate::error::InstructionError;
use crate::operand::OperandKind;

use OperandKind::{Label, Symb, Type, Var};

/// Identifies the operation to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    // Frames and function calls
    /// `MOVE <var> <symb>`
    Move,
    /// Replace the temporary frame with a fresh empty one.
    CreateFrame,
    /// Move the temporary frame onto the local frame stack.
    PushFrame,
    /// Pop the local frame stack into the temporary frame.
    PopFrame,
    /// `DEFVAR <var>`
    DefVar,
    /// `CALL <label>`
    Call,
    /// Return to the address on top of the call stack.
    Return,

    // Data stack
    /// `PUSHS <symb>`
    Pushs,
    /// `POPS <var>`
    Pops,

    // Arithmetic, relational, boolean and conversion
    /// `ADD <var> <symb> <symb>`
    Add,
    /// `SUB <var> <symb> <symb>`
    Sub,
    /// `MUL <var> <symb> <symb>`
    Mul,
    /// `IDIV <var> <symb> <symb>`, floor division.
    Idiv,
    /// `LT <var> <symb> <symb>`
    Lt,
    /// `GT <var> <symb> <symb>`
    Gt,
    /// `EQ <var> <symb> <symb>`
    Eq,
    /// `AND <var> <symb> <symb>`
    And,
    /// `OR <var> <symb> <symb>`
    Or,
    /// `NOT <var> <symb>`
    Not,
    /// `INT2CHAR <var> <symb>`
    Int2Char,
    /// `STRI2INT <var> <symb> <symb>`
    Stri2Int,

    // Input and output
    /// `READ <var> <type>`
    Read,
    /// `WRITE <symb>`
    Write,

    // Strings
    /// `CONCAT <var> <symb> <symb>`
    Concat,
    /// `STRLEN <var> <symb>`
    Strlen,
    /// `GETCHAR <var> <symb> <symb>`
    GetChar,
    /// `SETCHAR <var> <symb> <symb>`
    SetChar,

    // Types
    /// `TYPE <var> <symb>`
    Type,

    // Control flow
    /// `LABEL <label>`, a pseudo-instruction removed at ingestion.
    Label,
    /// `JUMP <label>`
    Jump,
    /// `JUMPIFEQ <label> <symb> <symb>`
    JumpIfEq,
    /// `JUMPIFNEQ <label> <symb> <symb>`
    JumpIfNeq,
    /// `EXIT <symb>`
    Exit,

    // Debugging
    /// `DPRINT <symb>`
    DPrint,
    /// Dump the machine state to the diagnostic stream.
    Break,
}

/// All opcodes, in definition order.
pub const ALL_OPCODES: [Opcode; 35] = [
    Opcode::Move,
    Opcode::CreateFrame,
    Opcode::PushFrame,
    Opcode::PopFrame,
    Opcode::DefVar,
    Opcode::Call,
    Opcode::Return,
    Opcode::Pushs,
    Opcode::Pops,
    Opcode::Add,
    Opcode::Sub,
    Opcode::Mul,
    Opcode::Idiv,
    Opcode::Lt,
    Opcode::Gt,
    Opcode::Eq,
    Opcode::And,
    Opcode::Or,
    Opcode::Not,
    Opcode::Int2Char,
    Opcode::Stri2Int,
    Opcode::Read,
    Opcode::Write,
    Opcode::Concat,
    Opcode::Strlen,
    Opcode::GetChar,
    Opcode::SetChar,
    Opcode::Type,
    Opcode::Label,
    Opcode::Jump,
    Opcode::JumpIfEq,
    Opcode::JumpIfNeq,
    Opcode::Exit,
    Opcode::DPrint,
    Opcode::Break,
];

impl Opcode {
    /// Returns the uppercase mnemonic for this opcode.
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Opcode::Move => "MOVE",
            Opcode::CreateFrame => "CREATEFRAME",
            Opcode::PushFrame => "PUSHFRAME",
            Opcode::PopFrame => "POPFRAME",
            Opcode::DefVar => "DEFVAR",
            Opcode::Call => "CALL",
            Opcode::Return => "RETURN",
            Opcode::Pushs => "PUSHS",
            Opcode::Pops => "POPS",
            Opcode::Add => "ADD",
            Opcode::Sub => "SUB",
            Opcode::Mul => "MUL",
            Opcode::Idiv => "IDIV",
            Opcode::Lt => "LT",
            Opcode::Gt => "GT",
            Opcode::Eq => "EQ",
            Opcode::And => "AND",
            Opcode::Or => "OR",
            Opcode::Not => "NOT",
            Opcode::Int2Char => "INT2CHAR",
            Opcode::Stri2Int => "STRI2INT",
            Opcode::Read => "READ",
            Opcode::Write => "WRITE",
            Opcode::Concat => "CONCAT",
            Opcode::Strlen => "STRLEN",
            Opcode::GetChar => "GETCHAR",
            Opcode::SetChar => "SETCHAR",
            Opcode::Type => "TYPE",
            Opcode::Label => "LABEL",
            Opcode::Jump => "JUMP",
            Opcode::JumpIfEq => "JUMPIFEQ",
            Opcode::JumpIfNeq => "JUMPIFNEQ",
            Opcode::Exit => "EXIT",
            Opcode::DPrint => "DPRINT",
            Opcode::Break => "BREAK",
        }
    }

    /// Operand kinds this opcode takes, in order.
    pub fn signature(&self) -> &'static [OperandKind] {
        match self {
            Opcode::CreateFrame
            | Opcode::PushFrame
            | Opcode::PopFrame
            | Opcode::Return
            | Opcode::Break => &[],

            Opcode::DefVar | Opcode::Pops => &[Var],

            Opcode::Call | Opcode::Label | Opcode::Jump => &[Label],

            Opcode::Pushs | Opcode::Write | Opcode::Exit | Opcode::DPrint => &[Symb],

            Opcode::Move | Opcode::Int2Char | Opcode::Strlen | Opcode::Type | Opcode::Not => {
                &[Var, Symb]
            }

            Opcode::Read => &[Var, Type],

            Opcode::Add
            | Opcode::Sub
            | Opcode::Mul
            | Opcode::Idiv
            | Opcode::Lt
            | Opcode::Gt
            | Opcode::Eq
            | Opcode::And
            | Opcode::Or
            | Opcode::Stri2Int
            | Opcode::Concat
            | Opcode::GetChar
            | Opcode::SetChar => &[Var, Symb, Symb],

            Opcode::JumpIfEq | Opcode::JumpIfNeq => &[Label, Symb, Symb],
        }
    }

    /// Number of operands.
    pub fn arity(&self) -> usize {
        self.signature().len()
    }

    /// Resolve a mnemonic, ignoring ASCII case.
    pub fn from_mnemonic(name: &str) -> Result<Self, InstructionError> {
        ALL_OPCODES
            .iter()
            .find(|op| op.mnemonic().eq_ignore_ascii_case(name))
            .copied()
            .ok_or_else(|| InstructionError::UnknownOpcode(name.to_string()))
    }
}

impl TryFrom<&str> for Opcode {
    type Error = InstructionError;

    fn try_from(name: &str) -> Result<Self, Self::Error> {
        Opcode::from_mnemonic(name)
    }
}

impl std::fmt::Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.mnemonic())
    }
}
