//! Main execution loop and opcode dispatch for the IPPcode22 machine.

use std::cmp::Ordering;

use ippcode_common::value::parse_int;
use ippcode_common::{Instruction, Opcode, Symbol, Value, ValueKind, Variable};
use tracing::{info, trace};

use crate::error::RuntimeError;
use crate::machine::Machine;

/// How a run ended without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The program counter ran past the last instruction.
    Completed,
    /// EXIT was executed with this code.
    Exit(i32),
}

impl Termination {
    /// Process exit status for this outcome.
    pub fn exit_code(&self) -> i32 {
        match self {
            Termination::Completed => 0,
            Termination::Exit(code) => *code,
        }
    }
}

/// Where control goes after an instruction.
enum Flow {
    Next,
    Jump(usize),
    Exit(i32),
}

impl<'a> Machine<'a> {
    /// Execute from the current program counter until the end of the
    /// program, EXIT, or the first error. On error the program counter
    /// still points at the failing instruction.
    pub fn execute(&mut self) -> Result<Termination, RuntimeError> {
        while let Some(&instr) = self.code.get(self.pc) {
            trace!(pc = self.pc, %instr, "exec");
            let flow = self.step(instr)?;
            self.executed += 1;

            match flow {
                Flow::Next => self.pc += 1,
                Flow::Jump(target) => self.pc = target,
                Flow::Exit(code) => {
                    info!(code, executed = self.executed, "program exited");
                    return Ok(Termination::Exit(code));
                }
            }
        }

        info!(executed = self.executed, "program completed");
        Ok(Termination::Completed)
    }

    /// Execute one instruction. State is only changed on success.
    fn step(&mut self, instr: &Instruction) -> Result<Flow, RuntimeError> {
        let op = instr.opcode();

        match instr {
            // Frames and calls
            Instruction::Move(dst, src) => {
                let value = self.value(src)?;
                self.set_variable(dst, value)?;
            }
            Instruction::CreateFrame => self.create_temporary_frame(),
            Instruction::PushFrame => self.push_local_frame()?,
            Instruction::PopFrame => self.pop_local_frame()?,
            Instruction::DefVar(var) => self.declare_variable(var)?,
            Instruction::Call(label) => {
                let target = self.resolve_label(label)?;
                self.call_stack.push(self.pc + 1);
                return Ok(Flow::Jump(target));
            }
            Instruction::Return => {
                let target = self
                    .call_stack
                    .pop()
                    .ok_or(RuntimeError::EmptyCallStack { at: self.pc })?;
                return Ok(Flow::Jump(target));
            }

            // Data stack
            Instruction::Pushs(src) => {
                let value = self.value(src)?;
                self.data_stack.push(value);
            }
            Instruction::Pops(dst) => self.exec_pops(dst)?,

            // Arithmetic
            Instruction::Add(dst, a, b) => self.exec_arith(op, dst, a, b, i64::wrapping_add)?,
            Instruction::Sub(dst, a, b) => self.exec_arith(op, dst, a, b, i64::wrapping_sub)?,
            Instruction::Mul(dst, a, b) => self.exec_arith(op, dst, a, b, i64::wrapping_mul)?,
            Instruction::Idiv(dst, a, b) => self.exec_idiv(op, dst, a, b)?,

            // Relational and boolean
            Instruction::Lt(dst, a, b) => self.exec_relation(op, dst, a, b, Ordering::Less)?,
            Instruction::Gt(dst, a, b) => self.exec_relation(op, dst, a, b, Ordering::Greater)?,
            Instruction::Eq(dst, a, b) => {
                let equal = self.equality(op, a, b)?;
                self.set_variable(dst, Value::Bool(equal))?;
            }
            Instruction::And(dst, a, b) => self.exec_logic(op, dst, a, b, |x, y| x && y)?,
            Instruction::Or(dst, a, b) => self.exec_logic(op, dst, a, b, |x, y| x || y)?,
            Instruction::Not(dst, a) => match self.value(a)? {
                Value::Bool(x) => self.set_variable(dst, Value::Bool(!x))?,
                other => return Err(self.type_error(op, &[&other])),
            },

            // Conversions
            Instruction::Int2Char(dst, a) => self.exec_int2char(op, dst, a)?,
            Instruction::Stri2Int(dst, s, i) => {
                let (text, index) = self.string_and_index(op, s, i)?;
                let c = self.char_at(&text, index)?;
                self.set_variable(dst, Value::Int(i64::from(u32::from(c))))?;
            }

            // Input and output
            Instruction::Read(dst, kind) => self.exec_read(dst, *kind)?,
            Instruction::Write(src) => {
                let value = self.value(src)?;
                self.write_output(&value.to_string())?;
            }

            // Strings
            Instruction::Concat(dst, a, b) => match (self.value(a)?, self.value(b)?) {
                (Value::String(x), Value::String(y)) => {
                    self.set_variable(dst, Value::String(x + &y))?
                }
                (x, y) => return Err(self.type_error(op, &[&x, &y])),
            },
            Instruction::Strlen(dst, a) => match self.value(a)? {
                Value::String(s) => {
                    let len = s.chars().count() as i64;
                    self.set_variable(dst, Value::Int(len))?
                }
                other => return Err(self.type_error(op, &[&other])),
            },
            Instruction::GetChar(dst, s, i) => {
                let (text, index) = self.string_and_index(op, s, i)?;
                let c = self.char_at(&text, index)?;
                self.set_variable(dst, Value::String(c.to_string()))?;
            }
            Instruction::SetChar(dst, i, r) => self.exec_setchar(op, dst, i, r)?,

            // Types
            Instruction::Type(dst, src) => {
                let name = match self.read_value(src, true)? {
                    Some(value) => value.kind().name(),
                    None => "",
                };
                self.set_variable(dst, Value::String(name.to_string()))?;
            }

            // Control flow
            Instruction::Label(_) => {}
            Instruction::Jump(label) => return Ok(Flow::Jump(self.resolve_label(label)?)),
            Instruction::JumpIfEq(label, a, b) => {
                let target = self.resolve_label(label)?;
                if self.equality(op, a, b)? {
                    return Ok(Flow::Jump(target));
                }
            }
            Instruction::JumpIfNeq(label, a, b) => {
                let target = self.resolve_label(label)?;
                if !self.equality(op, a, b)? {
                    return Ok(Flow::Jump(target));
                }
            }
            Instruction::Exit(src) => return self.exec_exit(op, src),

            // Debugging
            Instruction::DPrint(src) => {
                let value = self.value(src)?;
                self.write_diagnostic(&format!("{value}\n"))?;
            }
            Instruction::Break => {
                let dump = self.snapshot();
                self.write_diagnostic(&dump)?;
            }
        }

        Ok(Flow::Next)
    }

    fn type_error(&self, opcode: Opcode, values: &[&Value]) -> RuntimeError {
        let found: Vec<&str> = values.iter().map(|v| v.kind().name()).collect();
        RuntimeError::OperandType {
            at: self.pc,
            opcode,
            found: found.join(", "),
        }
    }

    // ---- Data stack ----

    /// The value is only removed once it has been stored.
    fn exec_pops(&mut self, dst: &Variable) -> Result<(), RuntimeError> {
        let top = self
            .data_stack
            .last()
            .cloned()
            .ok_or(RuntimeError::EmptyDataStack { at: self.pc })?;
        self.set_variable(dst, top)?;
        self.data_stack.pop();
        Ok(())
    }

    // ---- Arithmetic ----

    fn int_operands(
        &self,
        opcode: Opcode,
        a: &Symbol,
        b: &Symbol,
    ) -> Result<(i64, i64), RuntimeError> {
        match (self.value(a)?, self.value(b)?) {
            (Value::Int(x), Value::Int(y)) => Ok((x, y)),
            (x, y) => Err(self.type_error(opcode, &[&x, &y])),
        }
    }

    fn exec_arith(
        &mut self,
        opcode: Opcode,
        dst: &Variable,
        a: &Symbol,
        b: &Symbol,
        int_op: fn(i64, i64) -> i64,
    ) -> Result<(), RuntimeError> {
        let (x, y) = self.int_operands(opcode, a, b)?;
        self.set_variable(dst, Value::Int(int_op(x, y)))
    }

    fn exec_idiv(
        &mut self,
        opcode: Opcode,
        dst: &Variable,
        a: &Symbol,
        b: &Symbol,
    ) -> Result<(), RuntimeError> {
        let (x, y) = self.int_operands(opcode, a, b)?;
        if y == 0 {
            return Err(RuntimeError::DivisionByZero { at: self.pc });
        }
        self.set_variable(dst, Value::Int(floor_div(x, y)))
    }

    // ---- Relational and boolean ----

    fn exec_relation(
        &mut self,
        opcode: Opcode,
        dst: &Variable,
        a: &Symbol,
        b: &Symbol,
        wanted: Ordering,
    ) -> Result<(), RuntimeError> {
        let (x, y) = (self.value(a)?, self.value(b)?);
        let ordering = x
            .compare(&y)
            .ok_or_else(|| self.type_error(opcode, &[&x, &y]))?;
        self.set_variable(dst, Value::Bool(ordering == wanted))
    }

    /// Equality shared by EQ, JUMPIFEQ and JUMPIFNEQ.
    fn equality(&self, opcode: Opcode, a: &Symbol, b: &Symbol) -> Result<bool, RuntimeError> {
        let (x, y) = (self.value(a)?, self.value(b)?);
        x.equals(&y)
            .ok_or_else(|| self.type_error(opcode, &[&x, &y]))
    }

    fn exec_logic(
        &mut self,
        opcode: Opcode,
        dst: &Variable,
        a: &Symbol,
        b: &Symbol,
        bool_op: fn(bool, bool) -> bool,
    ) -> Result<(), RuntimeError> {
        match (self.value(a)?, self.value(b)?) {
            (Value::Bool(x), Value::Bool(y)) => self.set_variable(dst, Value::Bool(bool_op(x, y))),
            (x, y) => Err(self.type_error(opcode, &[&x, &y])),
        }
    }

    // ---- Strings and conversions ----

    fn exec_int2char(
        &mut self,
        opcode: Opcode,
        dst: &Variable,
        a: &Symbol,
    ) -> Result<(), RuntimeError> {
        let code = match self.value(a)? {
            Value::Int(n) => n,
            other => return Err(self.type_error(opcode, &[&other])),
        };
        let c = u32::try_from(code)
            .ok()
            .and_then(char::from_u32)
            .ok_or(RuntimeError::InvalidCodePoint { at: self.pc, code })?;
        self.set_variable(dst, Value::String(c.to_string()))
    }

    fn string_and_index(
        &self,
        opcode: Opcode,
        s: &Symbol,
        i: &Symbol,
    ) -> Result<(String, i64), RuntimeError> {
        match (self.value(s)?, self.value(i)?) {
            (Value::String(text), Value::Int(index)) => Ok((text, index)),
            (x, y) => Err(self.type_error(opcode, &[&x, &y])),
        }
    }

    fn char_at(&self, text: &str, index: i64) -> Result<char, RuntimeError> {
        usize::try_from(index)
            .ok()
            .and_then(|i| text.chars().nth(i))
            .ok_or_else(|| RuntimeError::IndexOutOfRange {
                at: self.pc,
                index,
                length: text.chars().count(),
            })
    }

    fn exec_setchar(
        &mut self,
        opcode: Opcode,
        dst: &Variable,
        i: &Symbol,
        r: &Symbol,
    ) -> Result<(), RuntimeError> {
        let target = self.variable_value(dst)?;
        let (index, replacement) = (self.value(i)?, self.value(r)?);
        // An empty replacement is a kind error, reported before bounds.
        let first = match &replacement {
            Value::String(r) => r.chars().next(),
            _ => None,
        };
        let (text, index, new_char) = match (&target, &index, first) {
            (Value::String(t), Value::Int(n), Some(c)) => (t, *n, c),
            _ => return Err(self.type_error(opcode, &[&target, &index, &replacement])),
        };
        self.char_at(text, index)?;

        let updated: String = text
            .chars()
            .enumerate()
            .map(|(pos, c)| if pos as i64 == index { new_char } else { c })
            .collect();
        self.set_variable(dst, Value::String(updated))
    }

    // ---- Input, termination ----

    fn exec_read(&mut self, dst: &Variable, kind: ValueKind) -> Result<(), RuntimeError> {
        let line = self.read_line()?;
        let text = line.as_deref().map(str::trim).unwrap_or("");

        let value = if text.is_empty() {
            Value::Nil
        } else {
            match kind {
                ValueKind::Int => parse_int(text).map(Value::Int).unwrap_or(Value::Nil),
                ValueKind::Bool => Value::Bool(text.eq_ignore_ascii_case("true")),
                ValueKind::String => Value::String(text.to_string()),
                ValueKind::Nil => Value::Nil,
            }
        };
        self.set_variable(dst, value)
    }

    fn exec_exit(&mut self, opcode: Opcode, src: &Symbol) -> Result<Flow, RuntimeError> {
        match self.value(src)? {
            Value::Int(code @ 0..=49) => Ok(Flow::Exit(code as i32)),
            Value::Int(code) => Err(RuntimeError::ExitCodeOutOfRange { at: self.pc, code }),
            other => Err(self.type_error(opcode, &[&other])),
        }
    }
}

/// Integer division rounding toward negative infinity.
pub(crate) fn floor_div(a: i64, b: i64) -> i64 {
    let q = a.wrapping_div(b);
    if a.wrapping_rem(b) != 0 && ((a < 0) != (b < 0)) {
        q - 1
    } else {
        q
    }
}
