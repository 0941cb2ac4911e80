//! IPPcode22 execution engine.
//!
//! The machine has:
//! - a global frame, a stack of local frames and an optional temporary frame
//! - a data stack for PUSHS/POPS
//! - a call stack of return addresses
//! - a label table built once when the program is ingested
//!
//! # Usage
//!
//! ```
//! use ippcode_common::{Instruction, Program, Symbol, Value};
//! use ippcode_vm::{run, Streams, Termination};
//!
//! let program = Program::new(vec![
//!     Instruction::Write(Symbol::Const(Value::Int(42))),
//! ]);
//!
//! let mut input = std::io::empty();
//! let mut output = Vec::new();
//! let mut diagnostic = Vec::new();
//! let streams = Streams::new(&mut input, &mut output, &mut diagnostic);
//!
//! assert_eq!(run(&program, streams).unwrap(), Termination::Completed);
//! assert_eq!(output, b"42");
//! ```

pub mod error;
pub mod execute;
pub mod frame;
pub mod machine;

pub use error::RuntimeError;
pub use execute::Termination;
pub use frame::Frames;
pub use machine::{Machine, Streams};

use ippcode_common::Program;

/// Execute a program against the given streams.
///
/// This is the primary entry point. It:
/// 1. Ingests the program, building the label table
/// 2. Executes from the first instruction until the end or EXIT
/// 3. Flushes the output streams
///
/// # Errors
///
/// Returns the first [`RuntimeError`]. Output written before the error is
/// still flushed.
pub fn run<'a>(program: &'a Program, streams: Streams<'a>) -> Result<Termination, RuntimeError> {
    let mut machine = Machine::new(streams);
    machine.ingest(program)?;
    let outcome = machine.execute();
    let flushed = machine.flush();
    let termination = outcome?;
    flushed?;
    Ok(termination)
}
