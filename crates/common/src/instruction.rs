//! Typed IPPcode22 instructions.
//!
//! Front ends deliver an opcode plus a list of untyped [`Operand`]s. They are
//! checked against the opcode's signature exactly once, in
//! [`Instruction::new`], and stored as a fixed-arity variant. The engine never
//! indexes into an operand list.

use std::fmt;

use crate::error::InstructionError;
use crate::kind::ValueKind;
use crate::opcode::Opcode;
use crate::operand::{Operand, OperandKind, Symbol, Variable};

/// A single instruction with operands already checked against its opcode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    Move(Variable, Symbol),
    CreateFrame,
    PushFrame,
    PopFrame,
    DefVar(Variable),
    Call(String),
    Return,

    Pushs(Symbol),
    Pops(Variable),

    Add(Variable, Symbol, Symbol),
    Sub(Variable, Symbol, Symbol),
    Mul(Variable, Symbol, Symbol),
    Idiv(Variable, Symbol, Symbol),
    Lt(Variable, Symbol, Symbol),
    Gt(Variable, Symbol, Symbol),
    Eq(Variable, Symbol, Symbol),
    And(Variable, Symbol, Symbol),
    Or(Variable, Symbol, Symbol),
    Not(Variable, Symbol),
    Int2Char(Variable, Symbol),
    Stri2Int(Variable, Symbol, Symbol),

    Read(Variable, ValueKind),
    Write(Symbol),

    Concat(Variable, Symbol, Symbol),
    Strlen(Variable, Symbol),
    GetChar(Variable, Symbol, Symbol),
    SetChar(Variable, Symbol, Symbol),

    Type(Variable, Symbol),

    Label(String),
    Jump(String),
    JumpIfEq(String, Symbol, Symbol),
    JumpIfNeq(String, Symbol, Symbol),
    Exit(Symbol),

    DPrint(Symbol),
    Break,
}

/// Hands out operands one at a time, checking each against the kind the
/// opcode expects at that position.
struct OperandCursor {
    opcode: Opcode,
    operands: std::vec::IntoIter<Operand>,
    position: usize,
}

impl OperandCursor {
    fn new(opcode: Opcode, operands: Vec<Operand>) -> Result<Self, InstructionError> {
        if operands.len() != opcode.arity() {
            return Err(InstructionError::ArityMismatch {
                opcode: opcode.mnemonic(),
                expected: opcode.arity(),
                found: operands.len(),
            });
        }
        Ok(Self {
            opcode,
            operands: operands.into_iter(),
            position: 0,
        })
    }

    fn next(&mut self) -> Result<Operand, InstructionError> {
        self.position += 1;
        self.operands
            .next()
            .ok_or(InstructionError::ArityMismatch {
                opcode: self.opcode.mnemonic(),
                expected: self.opcode.arity(),
                found: self.position - 1,
            })
    }

    fn mismatch(&self, expected: OperandKind, found: &Operand) -> InstructionError {
        InstructionError::OperandMismatch {
            opcode: self.opcode.mnemonic(),
            position: self.position,
            expected: expected.name(),
            found: found.describe(),
        }
    }

    fn var(&mut self) -> Result<Variable, InstructionError> {
        match self.next()? {
            Operand::Var(v) => Ok(v),
            other => Err(self.mismatch(OperandKind::Var, &other)),
        }
    }

    fn symb(&mut self) -> Result<Symbol, InstructionError> {
        match self.next()? {
            Operand::Var(v) => Ok(Symbol::Var(v)),
            Operand::Const(c) => Ok(Symbol::Const(c)),
            other => Err(self.mismatch(OperandKind::Symb, &other)),
        }
    }

    fn label(&mut self) -> Result<String, InstructionError> {
        match self.next()? {
            Operand::Label(l) => Ok(l),
            other => Err(self.mismatch(OperandKind::Label, &other)),
        }
    }

    fn type_name(&mut self) -> Result<ValueKind, InstructionError> {
        match self.next()? {
            Operand::Type(t) if t.is_readable() => Ok(t),
            other => Err(self.mismatch(OperandKind::Type, &other)),
        }
    }
}

impl Instruction {
    /// Build an instruction, validating operand count and kinds.
    pub fn new(opcode: Opcode, operands: Vec<Operand>) -> Result<Self, InstructionError> {
        let mut args = OperandCursor::new(opcode, operands)?;

        let instr = match opcode {
            Opcode::Move => Instruction::Move(args.var()?, args.symb()?),
            Opcode::CreateFrame => Instruction::CreateFrame,
            Opcode::PushFrame => Instruction::PushFrame,
            Opcode::PopFrame => Instruction::PopFrame,
            Opcode::DefVar => Instruction::DefVar(args.var()?),
            Opcode::Call => Instruction::Call(args.label()?),
            Opcode::Return => Instruction::Return,
            Opcode::Pushs => Instruction::Pushs(args.symb()?),
            Opcode::Pops => Instruction::Pops(args.var()?),
            Opcode::Add => Instruction::Add(args.var()?, args.symb()?, args.symb()?),
            Opcode::Sub => Instruction::Sub(args.var()?, args.symb()?, args.symb()?),
            Opcode::Mul => Instruction::Mul(args.var()?, args.symb()?, args.symb()?),
            Opcode::Idiv => Instruction::Idiv(args.var()?, args.symb()?, args.symb()?),
            Opcode::Lt => Instruction::Lt(args.var()?, args.symb()?, args.symb()?),
            Opcode::Gt => Instruction::Gt(args.var()?, args.symb()?, args.symb()?),
            Opcode::Eq => Instruction::Eq(args.var()?, args.symb()?, args.symb()?),
            Opcode::And => Instruction::And(args.var()?, args.symb()?, args.symb()?),
            Opcode::Or => Instruction::Or(args.var()?, args.symb()?, args.symb()?),
            Opcode::Not => Instruction::Not(args.var()?, args.symb()?),
            Opcode::Int2Char => Instruction::Int2Char(args.var()?, args.symb()?),
            Opcode::Stri2Int => Instruction::Stri2Int(args.var()?, args.symb()?, args.symb()?),
            Opcode::Read => Instruction::Read(args.var()?, args.type_name()?),
            Opcode::Write => Instruction::Write(args.symb()?),
            Opcode::Concat => Instruction::Concat(args.var()?, args.symb()?, args.symb()?),
            Opcode::Strlen => Instruction::Strlen(args.var()?, args.symb()?),
            Opcode::GetChar => Instruction::GetChar(args.var()?, args.symb()?, args.symb()?),
            Opcode::SetChar => Instruction::SetChar(args.var()?, args.symb()?, args.symb()?),
            Opcode::Type => Instruction::Type(args.var()?, args.symb()?),
            Opcode::Label => Instruction::Label(args.label()?),
            Opcode::Jump => Instruction::Jump(args.label()?),
            Opcode::JumpIfEq => Instruction::JumpIfEq(args.label()?, args.symb()?, args.symb()?),
            Opcode::JumpIfNeq => {
                Instruction::JumpIfNeq(args.label()?, args.symb()?, args.symb()?)
            }
            Opcode::Exit => Instruction::Exit(args.symb()?),
            Opcode::DPrint => Instruction::DPrint(args.symb()?),
            Opcode::Break => Instruction::Break,
        };

        Ok(instr)
    }

    /// The opcode of this instruction.
    pub fn opcode(&self) -> Opcode {
        match self {
            Instruction::Move(..) => Opcode::Move,
            Instruction::CreateFrame => Opcode::CreateFrame,
            Instruction::PushFrame => Opcode::PushFrame,
            Instruction::PopFrame => Opcode::PopFrame,
            Instruction::DefVar(_) => Opcode::DefVar,
            Instruction::Call(_) => Opcode::Call,
            Instruction::Return => Opcode::Return,
            Instruction::Pushs(_) => Opcode::Pushs,
            Instruction::Pops(_) => Opcode::Pops,
            Instruction::Add(..) => Opcode::Add,
            Instruction::Sub(..) => Opcode::Sub,
            Instruction::Mul(..) => Opcode::Mul,
            Instruction::Idiv(..) => Opcode::Idiv,
            Instruction::Lt(..) => Opcode::Lt,
            Instruction::Gt(..) => Opcode::Gt,
            Instruction::Eq(..) => Opcode::Eq,
            Instruction::And(..) => Opcode::And,
            Instruction::Or(..) => Opcode::Or,
            Instruction::Not(..) => Opcode::Not,
            Instruction::Int2Char(..) => Opcode::Int2Char,
            Instruction::Stri2Int(..) => Opcode::Stri2Int,
            Instruction::Read(..) => Opcode::Read,
            Instruction::Write(_) => Opcode::Write,
            Instruction::Concat(..) => Opcode::Concat,
            Instruction::Strlen(..) => Opcode::Strlen,
            Instruction::GetChar(..) => Opcode::GetChar,
            Instruction::SetChar(..) => Opcode::SetChar,
            Instruction::Type(..) => Opcode::Type,
            Instruction::Label(_) => Opcode::Label,
            Instruction::Jump(_) => Opcode::Jump,
            Instruction::JumpIfEq(..) => Opcode::JumpIfEq,
            Instruction::JumpIfNeq(..) => Opcode::JumpIfNeq,
            Instruction::Exit(_) => Opcode::Exit,
            Instruction::DPrint(_) => Opcode::DPrint,
            Instruction::Break => Opcode::Break,
        }
    }

    /// Operands in declaration order, as untyped [`Operand`]s.
    pub fn operands(&self) -> Vec<Operand> {
        let var = |v: &Variable| Operand::Var(v.clone());
        let symb = |s: &Symbol| Operand::from(s.clone());
        let label = |l: &String| Operand::Label(l.clone());

        match self {
            Instruction::CreateFrame
            | Instruction::PushFrame
            | Instruction::PopFrame
            | Instruction::Return
            | Instruction::Break => vec![],

            Instruction::DefVar(v) | Instruction::Pops(v) => vec![var(v)],

            Instruction::Call(l) | Instruction::Label(l) | Instruction::Jump(l) => vec![label(l)],

            Instruction::Pushs(s)
            | Instruction::Write(s)
            | Instruction::Exit(s)
            | Instruction::DPrint(s) => vec![symb(s)],

            Instruction::Move(v, s)
            | Instruction::Not(v, s)
            | Instruction::Int2Char(v, s)
            | Instruction::Strlen(v, s)
            | Instruction::Type(v, s) => vec![var(v), symb(s)],

            Instruction::Read(v, t) => vec![var(v), Operand::Type(*t)],

            Instruction::Add(v, a, b)
            | Instruction::Sub(v, a, b)
            | Instruction::Mul(v, a, b)
            | Instruction::Idiv(v, a, b)
            | Instruction::Lt(v, a, b)
            | Instruction::Gt(v, a, b)
            | Instruction::Eq(v, a, b)
            | Instruction::And(v, a, b)
            | Instruction::Or(v, a, b)
            | Instruction::Stri2Int(v, a, b)
            | Instruction::Concat(v, a, b)
            | Instruction::GetChar(v, a, b)
            | Instruction::SetChar(v, a, b) => vec![var(v), symb(a), symb(b)],

            Instruction::JumpIfEq(l, a, b) | Instruction::JumpIfNeq(l, a, b) => {
                vec![label(l), symb(a), symb(b)]
            }
        }
    }
}

/// Canonical source form, e.g. `ADD GF@x int@1 LF@y`.
impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.opcode().mnemonic())?;
        for operand in self.operands() {
            write!(f, " {operand}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operand::FrameTag;
    use crate::value::Value;

    fn gf(name: &str) -> Operand {
        Operand::Var(Variable::new(FrameTag::Global, name))
    }

    #[test]
    fn build_move() {
        let instr = Instruction::new(Opcode::Move, vec![gf("x"), Operand::Const(Value::Int(1))])
            .unwrap();
        assert_eq!(
            instr,
            Instruction::Move(
                Variable::new(FrameTag::Global, "x"),
                Symbol::Const(Value::Int(1))
            )
        );
        assert_eq!(instr.opcode(), Opcode::Move);
    }

    #[test]
    fn build_nullary() {
        assert_eq!(
            Instruction::new(Opcode::Break, vec![]),
            Ok(Instruction::Break)
        );
    }

    #[test]
    fn arity_mismatch() {
        let err = Instruction::new(Opcode::DefVar, vec![]).unwrap_err();
        assert_eq!(
            err,
            InstructionError::ArityMismatch {
                opcode: "DEFVAR",
                expected: 1,
                found: 0
            }
        );
    }

    #[test]
    fn var_position_rejects_constant() {
        let err = Instruction::new(Opcode::Pops, vec![Operand::Const(Value::Nil)]).unwrap_err();
        assert_eq!(
            err,
            InstructionError::OperandMismatch {
                opcode: "POPS",
                position: 1,
                expected: "var",
                found: "constant"
            }
        );
    }

    #[test]
    fn symbol_position_rejects_label() {
        let err = Instruction::new(
            Opcode::Add,
            vec![gf("x"), Operand::Label("l".into()), Operand::Const(Value::Int(1))],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            InstructionError::OperandMismatch { position: 2, .. }
        ));
    }

    #[test]
    fn read_rejects_nil_type() {
        let err =
            Instruction::new(Opcode::Read, vec![gf("x"), Operand::Type(ValueKind::Nil)]).unwrap_err();
        assert!(matches!(
            err,
            InstructionError::OperandMismatch { position: 2, .. }
        ));
    }

    #[test]
    fn operands_roundtrip_through_new() {
        let instr = Instruction::JumpIfNeq(
            "end".into(),
            Symbol::Var(Variable::new(FrameTag::Local, "i")),
            Symbol::Const(Value::Int(10)),
        );
        let rebuilt = Instruction::new(instr.opcode(), instr.operands()).unwrap();
        assert_eq!(instr, rebuilt);
    }

    #[test]
    fn display_canonical_form() {
        let instr = Instruction::Concat(
            Variable::new(FrameTag::Global, "s"),
            Symbol::Const(Value::String("a b".into())),
            Symbol::Var(Variable::new(FrameTag::Temporary, "t")),
        );
        assert_eq!(instr.to_string(), r"CONCAT GF@s string@a\032b TF@t");
        assert_eq!(
            Instruction::Read(Variable::new(FrameTag::Global, "n"), ValueKind::Int).to_string(),
            "READ GF@n int"
        );
        assert_eq!(Instruction::CreateFrame.to_string(), "CREATEFRAME");
    }
}
