//! CLI command implementations.
//!
//! Each command reports its own diagnostics on stderr and returns the
//! process exit status: `Ok` for a finished run, `Err` for a failure.

use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use ippcode_common::{ErrorKind, Program};
use ippcode_vm::Streams;
use tracing::debug;

use crate::tester::{self, Mode};

/// Read IPPcode22 source on stdin and print the XML form on stdout.
pub fn parse() -> Result<(), i32> {
    let text = read_stdin()?;
    let program = ippcode_assembler::assemble(&text).map_err(|e| {
        eprintln!("error: {e}");
        e.kind().exit_code()
    })?;

    write_stdout(&ippcode_assembler::to_xml(&program))
}

/// Load an XML program and run it.
///
/// Whichever of `source` and `input` is omitted comes from stdin; omitting
/// both is a parameter error. Both files are opened before the program is
/// loaded.
pub fn interpret(source: Option<PathBuf>, input: Option<PathBuf>) -> Result<i32, i32> {
    if source.is_none() && input.is_none() {
        eprintln!("error: at least one of --source and --input is required");
        return Err(ErrorKind::Parameter.exit_code());
    }

    let input = open_input(input.as_deref())?;
    let xml = match &source {
        Some(path) => read_file(path)?,
        None => read_stdin()?,
    };

    let program = ippcode_assembler::load_xml(&xml).map_err(|e| {
        eprintln!("error: {e}");
        e.kind().exit_code()
    })?;

    execute(&program, input)
}

/// Assemble an IPPcode22 source file and run it.
pub fn run(file: &Path, input: Option<PathBuf>) -> Result<i32, i32> {
    let input = open_input(input.as_deref())?;
    let text = read_file(file)?;

    let program = ippcode_assembler::assemble(&text).map_err(|e| {
        eprintln!("error: {e}");
        e.kind().exit_code()
    })?;

    execute(&program, input)
}

/// Load an XML program and print it as IPPcode22 source text.
pub fn unparse(source: Option<PathBuf>) -> Result<(), i32> {
    let xml = match &source {
        Some(path) => read_file(path)?,
        None => read_stdin()?,
    };

    let program = ippcode_assembler::load_xml(&xml).map_err(|e| {
        eprintln!("error: {e}");
        e.kind().exit_code()
    })?;

    write_stdout(&ippcode_assembler::disassemble(&program))
}

/// Run every case under `directory` and print the report.
pub fn test(directory: &Path, recursive: bool, mode: Mode) -> Result<(), i32> {
    let cases = tester::find_cases(directory, recursive).map_err(|e| {
        eprintln!("error: cannot search '{}': {e}", directory.display());
        ErrorKind::TestDirectory.exit_code()
    })?;

    let results: Vec<_> = cases
        .iter()
        .map(|case| tester::run_case(case, mode, directory))
        .collect();
    write_stdout(&tester::report(&results))
}

// --- Helpers ---

/// Open the READ input file, if one was given.
fn open_input(input: Option<&Path>) -> Result<Option<BufReader<File>>, i32> {
    let Some(path) = input else {
        return Ok(None);
    };
    let file = File::open(path).map_err(|e| {
        eprintln!("error: cannot open '{}': {e}", path.display());
        ErrorKind::InputOpen.exit_code()
    })?;
    Ok(Some(BufReader::new(file)))
}

/// Run a program with READ bound to `input`, or stdin without one.
fn execute(program: &Program, input: Option<BufReader<File>>) -> Result<i32, i32> {
    let mut reader: Box<dyn BufRead> = match input {
        Some(file) => Box::new(file),
        None => Box::new(io::stdin().lock()),
    };
    let mut output = BufWriter::new(io::stdout().lock());
    let mut diagnostic = io::stderr();

    debug!(instructions = program.len(), "starting run");
    let streams = Streams::new(&mut *reader, &mut output, &mut diagnostic);
    match ippcode_vm::run(program, streams) {
        Ok(termination) => Ok(termination.exit_code()),
        Err(e) => {
            eprintln!("error: {e}");
            Err(e.kind().exit_code())
        }
    }
}

fn write_stdout(text: &str) -> Result<(), i32> {
    let mut stdout = io::stdout().lock();
    let written = stdout.write_all(text.as_bytes()).and_then(|()| stdout.flush());
    written.map_err(|e| {
        eprintln!("error: cannot write output: {e}");
        ErrorKind::OutputOpen.exit_code()
    })
}

fn read_file(path: &Path) -> Result<String, i32> {
    fs::read_to_string(path).map_err(|e| {
        eprintln!("error: cannot read '{}': {e}", path.display());
        ErrorKind::InputOpen.exit_code()
    })
}

fn read_stdin() -> Result<String, i32> {
    let mut text = String::new();
    io::stdin().read_to_string(&mut text).map_err(|e| {
        eprintln!("error: cannot read stdin: {e}");
        ErrorKind::InputOpen.exit_code()
    })?;
    Ok(text)
}
