//! Machine state: frames, data stack, call stack, label table and streams.

use std::collections::BTreeMap;
use std::io::{BufRead, Write};

use ippcode_common::{FrameTag, Instruction, Program, Symbol, Value, Variable};
use tracing::debug;

use crate::error::RuntimeError;
use crate::frame::{Frame, Frames};

/// The I/O endpoints of a run.
///
/// `input` feeds READ, `output` receives WRITE, and `diagnostic` receives
/// DPRINT and BREAK.
pub struct Streams<'a> {
    pub input: &'a mut dyn BufRead,
    pub output: &'a mut dyn Write,
    pub diagnostic: &'a mut dyn Write,
}

impl<'a> Streams<'a> {
    pub fn new(
        input: &'a mut dyn BufRead,
        output: &'a mut dyn Write,
        diagnostic: &'a mut dyn Write,
    ) -> Self {
        Self {
            input,
            output,
            diagnostic,
        }
    }
}

/// The IPPcode22 machine. One instance executes one program.
pub struct Machine<'a> {
    /// Executable instructions, LABELs removed.
    pub(crate) code: Vec<&'a Instruction>,
    /// Label name to index in `code`.
    pub(crate) labels: BTreeMap<String, usize>,
    pub(crate) frames: Frames,
    /// Data stack used by PUSHS and POPS.
    pub(crate) data_stack: Vec<Value>,
    /// Return addresses pushed by CALL.
    pub(crate) call_stack: Vec<usize>,
    /// Program counter (index into `code`).
    pub(crate) pc: usize,
    /// Number of instructions executed so far.
    pub(crate) executed: u64,
    pub(crate) io: Streams<'a>,
}

impl<'a> Machine<'a> {
    /// Create an empty machine attached to the given streams.
    pub fn new(io: Streams<'a>) -> Self {
        Self {
            code: Vec::new(),
            labels: BTreeMap::new(),
            frames: Frames::new(),
            data_stack: Vec::new(),
            call_stack: Vec::new(),
            pc: 0,
            executed: 0,
            io,
        }
    }

    /// Split a raw instruction sequence into the label table and the
    /// executable instructions, keeping their relative order. Each label
    /// maps to the index of the first real instruction after it.
    pub fn ingest(&mut self, program: &'a Program) -> Result<(), RuntimeError> {
        for (at, instr) in program.instructions.iter().enumerate() {
            match instr {
                Instruction::Label(name) => {
                    if self.labels.contains_key(name) {
                        return Err(RuntimeError::DuplicateLabel {
                            at,
                            name: name.clone(),
                        });
                    }
                    self.labels.insert(name.clone(), self.code.len());
                }
                _ => self.code.push(instr),
            }
        }

        debug!(
            instructions = self.code.len(),
            labels = self.labels.len(),
            "program ingested"
        );
        Ok(())
    }

    /// Current program counter.
    pub fn pc(&self) -> usize {
        self.pc
    }

    /// Number of executable instructions.
    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    pub fn frames(&self) -> &Frames {
        &self.frames
    }

    pub fn data_stack(&self) -> &[Value] {
        &self.data_stack
    }

    pub fn call_stack(&self) -> &[usize] {
        &self.call_stack
    }

    // ---- Frames ----

    fn frame(&self, tag: FrameTag) -> Result<&Frame, RuntimeError> {
        self.frames
            .get(tag)
            .ok_or(RuntimeError::FrameNotFound { at: self.pc, frame: tag })
    }

    fn frame_mut(&mut self, tag: FrameTag) -> Result<&mut Frame, RuntimeError> {
        let at = self.pc;
        self.frames
            .get_mut(tag)
            .ok_or(RuntimeError::FrameNotFound { at, frame: tag })
    }

    /// CREATEFRAME: replace the temporary frame with an empty one.
    pub fn create_temporary_frame(&mut self) {
        self.frames.create_temporary();
    }

    /// PUSHFRAME: move the temporary frame onto the local frame stack.
    pub fn push_local_frame(&mut self) -> Result<(), RuntimeError> {
        if self.frames.push_temporary() {
            Ok(())
        } else {
            Err(RuntimeError::FrameNotFound {
                at: self.pc,
                frame: FrameTag::Temporary,
            })
        }
    }

    /// POPFRAME: move the top local frame back into the temporary frame.
    pub fn pop_local_frame(&mut self) -> Result<(), RuntimeError> {
        if self.frames.pop_local() {
            Ok(())
        } else {
            Err(RuntimeError::FrameNotFound {
                at: self.pc,
                frame: FrameTag::Local,
            })
        }
    }

    // ---- Variables ----

    /// Whether `var` is declared. Fails if its frame does not exist.
    pub fn variable_exists(&self, var: &Variable) -> Result<bool, RuntimeError> {
        Ok(self.frame(var.frame)?.contains_key(&var.name))
    }

    /// Declare `var` without a value.
    pub fn declare_variable(&mut self, var: &Variable) -> Result<(), RuntimeError> {
        if self.variable_exists(var)? {
            return Err(RuntimeError::Redefinition {
                at: self.pc,
                var: var.to_string(),
            });
        }
        self.frame_mut(var.frame)?.insert(var.name.clone(), None);
        Ok(())
    }

    /// Store `value` in a declared variable.
    pub fn set_variable(&mut self, var: &Variable, value: Value) -> Result<(), RuntimeError> {
        let at = self.pc;
        let slot = self
            .frame_mut(var.frame)?
            .get_mut(&var.name)
            .ok_or_else(|| RuntimeError::UndeclaredVariable {
                at,
                var: var.to_string(),
            })?;
        *slot = Some(value);
        Ok(())
    }

    fn slot(&self, var: &Variable) -> Result<&Option<Value>, RuntimeError> {
        self.frame(var.frame)?
            .get(&var.name)
            .ok_or_else(|| RuntimeError::UndeclaredVariable {
                at: self.pc,
                var: var.to_string(),
            })
    }

    /// Evaluate a symbol. Constants evaluate to themselves. An unset
    /// variable yields `None` when `allow_unset` is true and an error
    /// otherwise.
    pub fn read_value(
        &self,
        symbol: &Symbol,
        allow_unset: bool,
    ) -> Result<Option<Value>, RuntimeError> {
        let var = match symbol {
            Symbol::Const(value) => return Ok(Some(value.clone())),
            Symbol::Var(var) => var,
        };
        match self.slot(var)? {
            Some(value) => Ok(Some(value.clone())),
            None if allow_unset => Ok(None),
            None => Err(RuntimeError::UnsetVariable {
                at: self.pc,
                var: var.to_string(),
            }),
        }
    }

    /// Evaluate a symbol that must hold a value.
    pub fn value(&self, symbol: &Symbol) -> Result<Value, RuntimeError> {
        self.read_value(symbol, false)?
            .ok_or_else(|| RuntimeError::UnsetVariable {
                at: self.pc,
                var: symbol.to_string(),
            })
    }

    /// Value of a variable that must be declared and set.
    pub fn variable_value(&self, var: &Variable) -> Result<Value, RuntimeError> {
        self.slot(var)?
            .clone()
            .ok_or_else(|| RuntimeError::UnsetVariable {
                at: self.pc,
                var: var.to_string(),
            })
    }

    // ---- Labels ----

    /// Index of the first instruction after the label `name`.
    pub fn resolve_label(&self, name: &str) -> Result<usize, RuntimeError> {
        self.labels
            .get(name)
            .copied()
            .ok_or_else(|| RuntimeError::UndefinedLabel {
                at: self.pc,
                name: name.to_string(),
            })
    }

    // ---- Streams ----

    /// Read one line of input without its line terminator. `None` at EOF.
    pub(crate) fn read_line(&mut self) -> Result<Option<String>, RuntimeError> {
        let mut line = String::new();
        let n = self
            .io
            .input
            .read_line(&mut line)
            .map_err(|e| RuntimeError::ReadFailed {
                at: self.pc,
                reason: e.to_string(),
            })?;
        if n == 0 {
            return Ok(None);
        }
        let trimmed = line.trim_end_matches(['\n', '\r']).len();
        line.truncate(trimmed);
        Ok(Some(line))
    }

    pub(crate) fn write_output(&mut self, text: &str) -> Result<(), RuntimeError> {
        let at = self.pc;
        self.io
            .output
            .write_all(text.as_bytes())
            .map_err(|e| RuntimeError::WriteFailed {
                at,
                reason: e.to_string(),
            })
    }

    pub(crate) fn write_diagnostic(&mut self, text: &str) -> Result<(), RuntimeError> {
        let at = self.pc;
        self.io
            .diagnostic
            .write_all(text.as_bytes())
            .map_err(|e| RuntimeError::WriteFailed {
                at,
                reason: e.to_string(),
            })
    }

    /// Flush the output streams.
    pub fn flush(&mut self) -> Result<(), RuntimeError> {
        let at = self.pc;
        let failed = |e: std::io::Error| RuntimeError::WriteFailed {
            at,
            reason: e.to_string(),
        };
        self.io.output.flush().map_err(failed)?;
        self.io.diagnostic.flush().map_err(failed)
    }

    // ---- Debugging ----

    /// Human-readable dump of the whole machine state, as written by BREAK.
    pub fn snapshot(&self) -> String {
        let mut out = String::new();

        let position = match self.code.get(self.pc) {
            Some(instr) => format!("{} ({instr})", self.pc),
            None => format!("{} (end of program)", self.pc),
        };
        out.push_str(&format!(
            "pc: {position}, {} instruction(s) executed\n",
            self.executed
        ));

        out.push_str(&format!("GF: {}\n", format_frame(self.frames.global())));
        if self.frames.locals().is_empty() {
            out.push_str("LF: <empty stack>\n");
        }
        for (depth, frame) in self.frames.locals().iter().enumerate().rev() {
            out.push_str(&format!("LF[{depth}]: {}\n", format_frame(frame)));
        }
        match self.frames.temporary() {
            Some(frame) => out.push_str(&format!("TF: {}\n", format_frame(frame))),
            None => out.push_str("TF: <undefined>\n"),
        }

        let stack: Vec<String> = self.data_stack.iter().map(Value::literal).collect();
        out.push_str(&format!("data stack: [{}]\n", stack.join(", ")));

        let calls: Vec<String> = self.call_stack.iter().map(usize::to_string).collect();
        out.push_str(&format!("call stack: [{}]\n", calls.join(", ")));

        let labels: Vec<String> = self
            .labels
            .iter()
            .map(|(name, index)| format!("{name}={index}"))
            .collect();
        out.push_str(&format!("labels: {{{}}}\n", labels.join(", ")));

        out
    }
}

fn format_frame(frame: &Frame) -> String {
    let vars: Vec<String> = frame
        .iter()
        .map(|(name, slot)| match slot {
            Some(value) => format!("{name}={}", value.literal()),
            None => format!("{name}=<unset>"),
        })
        .collect();
    format!("{{{}}}", vars.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn gf(name: &str) -> Variable {
        Variable::new(FrameTag::Global, name)
    }

    fn tf(name: &str) -> Variable {
        Variable::new(FrameTag::Temporary, name)
    }

    /// In-memory streams for a test machine.
    struct Buffers {
        input: Cursor<Vec<u8>>,
        output: Vec<u8>,
        diagnostic: Vec<u8>,
    }

    impl Buffers {
        fn new(input: &str) -> Self {
            Self {
                input: Cursor::new(input.as_bytes().to_vec()),
                output: Vec::new(),
                diagnostic: Vec::new(),
            }
        }

        fn machine(&mut self) -> Machine<'_> {
            Machine::new(Streams::new(
                &mut self.input,
                &mut self.output,
                &mut self.diagnostic,
            ))
        }
    }

    #[test]
    fn read_after_set_returns_value() {
        let mut io = Buffers::new("");
        let mut m = io.machine();
        m.declare_variable(&gf("x")).unwrap();
        m.set_variable(&gf("x"), Value::Int(42)).unwrap();
        assert_eq!(
            m.read_value(&Symbol::Var(gf("x")), false),
            Ok(Some(Value::Int(42)))
        );
    }

    #[test]
    fn constant_reads_as_itself() {
        let mut io = Buffers::new("");
        let m = io.machine();
        let c = Symbol::Const(Value::string("hi"));
        assert_eq!(m.value(&c), Ok(Value::String("hi".into())));
    }

    #[test]
    fn unset_variable() {
        let mut io = Buffers::new("");
        let mut m = io.machine();
        m.declare_variable(&gf("x")).unwrap();
        let x = Symbol::Var(gf("x"));
        assert_eq!(m.read_value(&x, true), Ok(None));
        assert_eq!(
            m.read_value(&x, false),
            Err(RuntimeError::UnsetVariable {
                at: 0,
                var: "GF@x".into()
            })
        );
    }

    #[test]
    fn undeclared_variable() {
        let mut io = Buffers::new("");
        let mut m = io.machine();
        assert_eq!(
            m.set_variable(&gf("y"), Value::Nil),
            Err(RuntimeError::UndeclaredVariable {
                at: 0,
                var: "GF@y".into()
            })
        );
        assert!(matches!(
            m.value(&Symbol::Var(gf("y"))),
            Err(RuntimeError::UndeclaredVariable { .. })
        ));
    }

    #[test]
    fn redefinition() {
        let mut io = Buffers::new("");
        let mut m = io.machine();
        m.declare_variable(&gf("x")).unwrap();
        assert!(matches!(
            m.declare_variable(&gf("x")),
            Err(RuntimeError::Redefinition { .. })
        ));
    }

    #[test]
    fn missing_frames() {
        let mut io = Buffers::new("");
        let mut m = io.machine();
        assert_eq!(
            m.declare_variable(&tf("x")),
            Err(RuntimeError::FrameNotFound {
                at: 0,
                frame: FrameTag::Temporary
            })
        );
        assert_eq!(
            m.variable_exists(&Variable::new(FrameTag::Local, "x")),
            Err(RuntimeError::FrameNotFound {
                at: 0,
                frame: FrameTag::Local
            })
        );
        assert!(m.push_local_frame().is_err());
        assert!(m.pop_local_frame().is_err());
    }

    #[test]
    fn temporary_frame_survives_push_pop() {
        let mut io = Buffers::new("");
        let mut m = io.machine();
        m.create_temporary_frame();
        m.declare_variable(&tf("x")).unwrap();
        m.set_variable(&tf("x"), Value::Int(5)).unwrap();
        m.push_local_frame().unwrap();
        assert_eq!(
            m.value(&Symbol::Var(Variable::new(FrameTag::Local, "x"))),
            Ok(Value::Int(5))
        );
        m.pop_local_frame().unwrap();
        assert_eq!(m.value(&Symbol::Var(tf("x"))), Ok(Value::Int(5)));
    }

    #[test]
    fn ingest_builds_label_table() {
        let program = Program::new(vec![
            Instruction::Label("start".into()),
            Instruction::CreateFrame,
            Instruction::Label("mid".into()),
            Instruction::Label("mid2".into()),
            Instruction::PushFrame,
            Instruction::Label("end".into()),
        ]);
        let mut io = Buffers::new("");
        let mut m = io.machine();
        m.ingest(&program).unwrap();
        assert_eq!(m.len(), 2);
        assert_eq!(m.resolve_label("start"), Ok(0));
        assert_eq!(m.resolve_label("mid"), Ok(1));
        assert_eq!(m.resolve_label("mid2"), Ok(1));
        assert_eq!(m.resolve_label("end"), Ok(2));
        assert!(matches!(
            m.resolve_label("nowhere"),
            Err(RuntimeError::UndefinedLabel { .. })
        ));
    }

    #[test]
    fn ingest_rejects_duplicate_label() {
        let program = Program::new(vec![
            Instruction::Label("a".into()),
            Instruction::Break,
            Instruction::Label("a".into()),
        ]);
        let mut io = Buffers::new("");
        let mut m = io.machine();
        assert_eq!(
            m.ingest(&program),
            Err(RuntimeError::DuplicateLabel {
                at: 2,
                name: "a".into()
            })
        );
    }

    #[test]
    fn snapshot_lists_state() {
        let mut io = Buffers::new("");
        let mut m = io.machine();
        m.declare_variable(&gf("b")).unwrap();
        m.declare_variable(&gf("a")).unwrap();
        m.set_variable(&gf("a"), Value::Int(1)).unwrap();
        m.data_stack.push(Value::string("x y"));
        let dump = m.snapshot();
        assert!(dump.contains("GF: {a=int@1, b=<unset>}"), "{dump}");
        assert!(dump.contains("TF: <undefined>"), "{dump}");
        assert!(dump.contains(r"data stack: [string@x\032y]"), "{dump}");
        assert!(dump.contains("pc: 0 (end of program)"), "{dump}");
    }

    #[test]
    fn read_line_strips_terminator() {
        let mut io = Buffers::new("first\r\nsecond");
        let mut m = io.machine();
        assert_eq!(m.read_line(), Ok(Some("first".into())));
        assert_eq!(m.read_line(), Ok(Some("second".into())));
        assert_eq!(m.read_line(), Ok(None));
    }
}
