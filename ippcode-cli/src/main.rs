//! IPPcode22 CLI: parse source to XML, interpret XML, run source directly,
//! print XML back as source, and run directories of test cases.
//!
//! Exit codes:
//! - 0: Success (or the operand of EXIT)
//! - 10: Bad command-line parameters
//! - 11/12: Input or output could not be opened
//! - 21-23: Source text errors
//! - 31/32: XML errors
//! - 41: Test directory missing
//! - 52-58: Runtime errors

mod commands;
mod tester;

use std::path::PathBuf;
use std::process;

use clap::error::ErrorKind as ClapErrorKind;
use clap::{Parser, Subcommand};
use ippcode_common::ErrorKind;
use tester::Mode;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "ippcode")]
#[command(about = "Assemble and interpret IPPcode22 programs")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Read IPPcode22 source on stdin and print its XML representation
    Parse,

    /// Interpret a program in XML form
    Interpret {
        /// XML program file (stdin when omitted)
        #[arg(long)]
        source: Option<PathBuf>,

        /// File read by READ (stdin when omitted)
        #[arg(long)]
        input: Option<PathBuf>,
    },

    /// Assemble IPPcode22 source and run it
    Run {
        /// IPPcode22 source file
        file: PathBuf,

        /// File read by READ (stdin when omitted)
        #[arg(long)]
        input: Option<PathBuf>,
    },

    /// Print an XML program as IPPcode22 source
    Unparse {
        /// XML program file (stdin when omitted)
        #[arg(long)]
        source: Option<PathBuf>,
    },

    /// Run the .src/.in/.out/.rc cases in a directory
    Test {
        /// Directory searched for cases
        #[arg(long, default_value = ".")]
        directory: PathBuf,

        /// Also search subdirectories
        #[arg(long)]
        recursive: bool,

        /// Only assemble; .out holds the expected XML
        #[arg(long, conflicts_with = "int_only")]
        parse_only: bool,

        /// Only interpret; .src holds an XML program
        #[arg(long)]
        int_only: bool,
    },
}

fn main() {
    init_logging();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = match e.kind() {
                ClapErrorKind::DisplayHelp | ClapErrorKind::DisplayVersion => 0,
                _ => ErrorKind::Parameter.exit_code(),
            };
            // Nothing useful can be done if stderr itself is gone.
            let _ = e.print();
            process::exit(code);
        }
    };

    let result = match cli.command {
        Command::Parse => commands::parse().map(|()| 0),
        Command::Interpret { source, input } => commands::interpret(source, input),
        Command::Run { file, input } => commands::run(&file, input),
        Command::Unparse { source } => commands::unparse(source).map(|()| 0),
        Command::Test {
            directory,
            recursive,
            parse_only,
            int_only,
        } => {
            let mode = if parse_only {
                Mode::ParseOnly
            } else if int_only {
                Mode::InterpretOnly
            } else {
                Mode::Both
            };
            commands::test(&directory, recursive, mode).map(|()| 0)
        }
    };

    match result {
        Ok(code) | Err(code) => process::exit(code),
    }
}

/// Install the stderr subscriber; `RUST_LOG` overrides the `warn` default.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
