//! Instruction operands: variables, constants, labels and type names.

use std::fmt;

use crate::error::InstructionError;
use crate::kind::ValueKind;
use crate::value::Value;

/// Which frame a variable lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameTag {
    /// `GF`, the global frame.
    Global,
    /// `LF`, the top of the local frame stack.
    Local,
    /// `TF`, the temporary frame.
    Temporary,
}

impl FrameTag {
    /// Source prefix (`GF`, `LF` or `TF`).
    pub fn prefix(&self) -> &'static str {
        match self {
            FrameTag::Global => "GF",
            FrameTag::Local => "LF",
            FrameTag::Temporary => "TF",
        }
    }

    /// Look up a frame by its prefix. Case-sensitive.
    pub fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "GF" => Some(FrameTag::Global),
            "LF" => Some(FrameTag::Local),
            "TF" => Some(FrameTag::Temporary),
            _ => None,
        }
    }
}

impl fmt::Display for FrameTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// A variable reference such as `GF@counter`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Variable {
    /// Frame the name is looked up in.
    pub frame: FrameTag,
    /// Name, unique within its frame.
    pub name: String,
}

impl Variable {
    pub fn new(frame: FrameTag, name: impl Into<String>) -> Self {
        Self {
            frame,
            name: name.into(),
        }
    }

    /// Parse `FRAME@name`. The name itself is not validated here; the text
    /// assembler enforces identifier syntax, the XML loader trusts its input.
    pub fn parse(text: &str) -> Result<Self, InstructionError> {
        let invalid = || InstructionError::InvalidVariable(text.to_string());
        let (prefix, name) = text.trim().split_once('@').ok_or_else(invalid)?;
        let frame = FrameTag::from_prefix(prefix).ok_or_else(invalid)?;
        if name.is_empty() {
            return Err(invalid());
        }
        Ok(Self::new(frame, name))
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.frame, self.name)
    }
}

/// Something that evaluates to a value: a variable or a constant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Symbol {
    Var(Variable),
    Const(Value),
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbol::Var(v) => write!(f, "{v}"),
            Symbol::Const(c) => f.write_str(&c.literal()),
        }
    }
}

/// Operand category an opcode expects at a given position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandKind {
    /// `<var>`: must be a variable.
    Var,
    /// `<symb>`: a variable or a constant.
    Symb,
    /// `<label>`: a label name.
    Label,
    /// `<type>`: `int`, `bool` or `string`.
    Type,
}

impl OperandKind {
    pub fn name(&self) -> &'static str {
        match self {
            OperandKind::Var => "var",
            OperandKind::Symb => "symbol",
            OperandKind::Label => "label",
            OperandKind::Type => "type",
        }
    }
}

/// An untyped operand as delivered by a front end, before it is checked
/// against the opcode's signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    Var(Variable),
    Const(Value),
    Label(String),
    Type(ValueKind),
}

impl Operand {
    /// Short description used in error messages.
    pub fn describe(&self) -> &'static str {
        match self {
            Operand::Var(_) => "var",
            Operand::Const(_) => "constant",
            Operand::Label(_) => "label",
            Operand::Type(_) => "type",
        }
    }
}

impl From<Symbol> for Operand {
    fn from(symbol: Symbol) -> Self {
        match symbol {
            Symbol::Var(v) => Operand::Var(v),
            Symbol::Const(c) => Operand::Const(c),
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Var(v) => write!(f, "{v}"),
            Operand::Const(c) => f.write_str(&c.literal()),
            Operand::Label(l) => f.write_str(l),
            Operand::Type(t) => write!(f, "{t}"),
        }
    }
}
