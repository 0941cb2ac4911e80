//! Value kinds of the IPPcode22 type system.
//!
//! Every runtime value has exactly one kind. The kind name is what TYPE
//! stores and what READ's type operand names.

use crate::error::InstructionError;

/// Discriminant of a [`Value`](crate::Value).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// Signed 64-bit integer.
    Int,
    /// Boolean.
    Bool,
    /// Unicode text.
    String,
    /// The single `nil` value.
    Nil,
}

/// All value kinds, in definition order.
pub const ALL_VALUE_KINDS: [ValueKind; 4] = [
    ValueKind::Int,
    ValueKind::Bool,
    ValueKind::String,
    ValueKind::Nil,
];

impl ValueKind {
    /// Returns the lowercase name used in source text, XML and TYPE results.
    pub fn name(&self) -> &'static str {
        match self {
            ValueKind::Int => "int",
            ValueKind::Bool => "bool",
            ValueKind::String => "string",
            ValueKind::Nil => "nil",
        }
    }

    /// Look up a kind by its exact (lowercase) name.
    pub fn from_name(name: &str) -> Option<Self> {
        ALL_VALUE_KINDS.iter().find(|k| k.name() == name).copied()
    }

    /// Whether READ can produce a value of this kind (`nil` is not a type operand).
    pub fn is_readable(&self) -> bool {
        !matches!(self, ValueKind::Nil)
    }
}

impl TryFrom<&str> for ValueKind {
    type Error = InstructionError;

    /// Parse a type-name operand. Only `int`, `bool` and `string` are accepted.
    fn try_from(name: &str) -> Result<Self, Self::Error> {
        match ValueKind::from_name(name) {
            Some(kind) if kind.is_readable() => Ok(kind),
            _ => Err(InstructionError::UnknownTypeName(name.to_string())),
        }
    }
}

impl std::fmt::Display for ValueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
