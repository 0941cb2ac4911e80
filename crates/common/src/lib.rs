//! IPPcode22 common types.
//!
//! This crate provides the data model shared by the front ends and the
//! execution engine:
//!
//! - [`Value`] and [`ValueKind`]: the runtime value model
//! - [`Variable`], [`Symbol`], [`Operand`]: instruction operands
//! - [`Opcode`]: the closed table of 35 opcodes and their signatures
//! - [`Instruction`]: fixed-arity typed instructions
//! - [`Program`]: an ordered instruction sequence
//! - [`ErrorKind`]: error categories and their process exit codes

pub mod error;
pub mod instruction;
pub mod kind;
pub mod opcode;
pub mod operand;
pub mod program;
pub mod value;

// Re-export commonly used types at the crate root.
pub use error::{ErrorKind, InstructionError};
pub use instruction::Instruction;
pub use kind::ValueKind;
pub use opcode::Opcode;
pub use operand::{FrameTag, Operand, OperandKind, Symbol, Variable};
pub use program::Program;
pub use value::Value;

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Escaping then decoding any text gives the text back.
        #[test]
        fn escapes_roundtrip(text in any::<String>()) {
            let escaped = value::encode_escapes(&text);
            prop_assert_eq!(value::decode_escapes(&escaped), text);
        }

        /// Text without backslashes is left untouched by decoding.
        #[test]
        fn decode_without_backslash_is_identity(text in "[^\\\\]*") {
            prop_assert_eq!(value::decode_escapes(&text), text);
        }

        /// Every i64, printed in decimal or hex, parses back.
        #[test]
        fn parse_int_accepts_printed_values(n in any::<i64>()) {
            prop_assert_eq!(value::parse_int(&n.to_string()), Some(n));
            let hex = if n < 0 {
                format!("-0x{:x}", (n as i128).unsigned_abs())
            } else {
                format!("0x{n:x}")
            };
            prop_assert_eq!(value::parse_int(&hex), Some(n));
        }

        /// A constant's source literal rebuilds the same constant.
        #[test]
        fn literal_text_rebuilds_value(n in any::<i64>(), s in any::<String>(), b in any::<bool>()) {
            for value in [Value::Int(n), Value::String(s.clone()), Value::Bool(b), Value::Nil] {
                let rebuilt = Value::from_literal(value.kind(), &value.escaped_text());
                prop_assert_eq!(rebuilt, Ok(value));
            }
        }

        /// EQ is symmetric and never fails when one side is nil.
        #[test]
        fn nil_equality_is_total(n in any::<i64>()) {
            let v = Value::Int(n);
            prop_assert_eq!(Value::Nil.equals(&v), Some(false));
            prop_assert_eq!(v.equals(&Value::Nil), Some(false));
        }
    }
}
