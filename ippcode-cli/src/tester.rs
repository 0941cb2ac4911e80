//! Directory-driven test runner.
//!
//! A test case is a `NAME.src` file with optional companions in the same
//! directory: `NAME.in` (READ input, default empty), `NAME.out` (expected
//! stdout, default empty) and `NAME.rc` (expected exit code, default 0).
//! Output is only compared when the expected exit code is 0.

use std::fs;
use std::io::{self, Cursor};
use std::path::{Path, PathBuf};

use ippcode_common::{ErrorKind, Program};
use ippcode_vm::Streams;
use tracing::{debug, info};

/// Which stages a case exercises.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// `.src` is IPPcode22 text, assembled and run through its XML form.
    Both,
    /// `.src` is IPPcode22 text. `.out` is the expected XML.
    ParseOnly,
    /// `.src` is an XML program.
    InterpretOnly,
}

/// One case on disk, identified by the path without extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCase {
    pub stem: PathBuf,
}

impl TestCase {
    fn companion(&self, extension: &str) -> PathBuf {
        let mut path = self.stem.clone().into_os_string();
        path.push(".");
        path.push(extension);
        PathBuf::from(path)
    }

    /// Case name relative to the test root, for reports.
    pub fn name(&self, root: &Path) -> String {
        let stem = self.stem.strip_prefix(root).unwrap_or(&self.stem);
        stem.display().to_string()
    }
}

/// Outcome of a single case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseResult {
    pub name: String,
    pub expected_code: i32,
    pub returned_code: i32,
    /// `None` when output was not compared.
    pub output_matches: Option<bool>,
}

impl CaseResult {
    pub fn passed(&self) -> bool {
        self.expected_code == self.returned_code && self.output_matches != Some(false)
    }
}

/// Collect every `.src` case under `dir`, sorted by path.
pub fn find_cases(dir: &Path, recursive: bool) -> io::Result<Vec<TestCase>> {
    let mut cases = Vec::new();
    collect_cases(dir, recursive, &mut cases)?;
    cases.sort_by(|a, b| a.stem.cmp(&b.stem));
    Ok(cases)
}

fn collect_cases(dir: &Path, recursive: bool, cases: &mut Vec<TestCase>) -> io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            if recursive {
                collect_cases(&path, recursive, cases)?;
            }
        } else if path.extension().is_some_and(|e| e == "src") {
            cases.push(TestCase {
                stem: path.with_extension(""),
            });
        }
    }
    Ok(())
}

/// Run one case in-process.
pub fn run_case(case: &TestCase, mode: Mode, root: &Path) -> CaseResult {
    let name = case.name(root);
    let expected_code = read_optional(&case.companion("rc"))
        .and_then(|text| text.trim().parse().ok())
        .unwrap_or(0);
    let input = read_optional(&case.companion("in")).unwrap_or_default();
    let expected_out = read_optional(&case.companion("out")).unwrap_or_default();

    let (returned_code, output) = match fs::read_to_string(case.companion("src")) {
        Ok(source) => match mode {
            Mode::Both => assemble(&source)
                .and_then(|program| reload(&ippcode_assembler::to_xml(&program)))
                .map_or_else(|code| (code, String::new()), |p| execute(&p, &input)),
            Mode::ParseOnly => match ippcode_assembler::assemble(&source) {
                Ok(program) => (0, ippcode_assembler::to_xml(&program)),
                Err(e) => (e.kind().exit_code(), String::new()),
            },
            Mode::InterpretOnly => match ippcode_assembler::load_xml(&source) {
                Ok(program) => execute(&program, &input),
                Err(e) => (e.kind().exit_code(), String::new()),
            },
        },
        Err(_) => (ErrorKind::InputOpen.exit_code(), String::new()),
    };

    let output_matches = (expected_code == 0 && returned_code == 0).then(|| match mode {
        Mode::ParseOnly => same_program(&output, &expected_out),
        Mode::Both | Mode::InterpretOnly => output == expected_out,
    });

    let result = CaseResult {
        name,
        expected_code,
        returned_code,
        output_matches,
    };
    debug!(case = %result.name, passed = result.passed(), "case finished");
    result
}

/// One line per case plus a pass count.
pub fn report(results: &[CaseResult]) -> String {
    let mut out = String::new();
    for r in results {
        let line = if r.passed() {
            format!("PASS  {}\n", r.name)
        } else if r.expected_code != r.returned_code {
            format!(
                "FAIL  {}: expected code {}, got {}\n",
                r.name, r.expected_code, r.returned_code
            )
        } else {
            format!("FAIL  {}: output differs\n", r.name)
        };
        out.push_str(&line);
    }
    let passed = results.iter().filter(|r| r.passed()).count();
    info!(passed, total = results.len(), "test run finished");
    out.push_str(&format!("{passed}/{} passed\n", results.len()));
    out
}

fn read_optional(path: &Path) -> Option<String> {
    fs::read_to_string(path).ok()
}

fn assemble(source: &str) -> Result<Program, i32> {
    ippcode_assembler::assemble(source).map_err(|e| e.kind().exit_code())
}

/// Load XML produced by the writer. A rejection means the writer and the
/// loader disagree.
fn reload(xml: &str) -> Result<Program, i32> {
    ippcode_assembler::load_xml(xml).map_err(|_| ErrorKind::Internal.exit_code())
}

/// Run with in-memory streams; returns the exit code and stdout.
fn execute(program: &Program, input: &str) -> (i32, String) {
    let mut reader = Cursor::new(input.as_bytes());
    let mut output = Vec::new();
    let mut diagnostic = io::sink();
    let streams = Streams::new(&mut reader, &mut output, &mut diagnostic);
    let code = match ippcode_vm::run(program, streams) {
        Ok(termination) => termination.exit_code(),
        Err(e) => e.kind().exit_code(),
    };
    (code, String::from_utf8_lossy(&output).into_owned())
}

/// XML outputs match when they load to the same program.
fn same_program(actual: &str, expected: &str) -> bool {
    match (
        ippcode_assembler::load_xml(actual),
        ippcode_assembler::load_xml(expected),
    ) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, content: &str) {
        fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn finds_src_files_only() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "b.src", "");
        write(dir.path(), "a.src", "");
        write(dir.path(), "a.out", "");
        write(dir.path(), "orphan.in", "");
        fs::create_dir(dir.path().join("sub")).unwrap();
        write(&dir.path().join("sub"), "c.src", "");

        let flat = find_cases(dir.path(), false).unwrap();
        let names: Vec<_> = flat.iter().map(|c| c.name(dir.path())).collect();
        assert_eq!(names, vec!["a", "b"]);

        let deep = find_cases(dir.path(), true).unwrap();
        assert_eq!(deep.len(), 3);
        assert!(deep.iter().any(|c| c.name(dir.path()).ends_with("c")));
    }

    #[test]
    fn missing_directory_is_an_error() {
        assert!(find_cases(Path::new("/nonexistent/tests"), false).is_err());
    }

    #[test]
    fn defaults_without_companions() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "empty.src", ".IPPcode22\n");
        let case = TestCase {
            stem: dir.path().join("empty"),
        };
        let result = run_case(&case, Mode::Both, dir.path());
        assert_eq!(result.expected_code, 0);
        assert_eq!(result.returned_code, 0);
        assert_eq!(result.output_matches, Some(true));
        assert!(result.passed());
    }

    #[test]
    fn both_mode_compares_output_and_code() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "echo.src",
            ".IPPcode22\nDEFVAR GF@x\nREAD GF@x string\nWRITE GF@x\n",
        );
        write(dir.path(), "echo.in", "hello\n");
        write(dir.path(), "echo.out", "hello");
        let case = TestCase {
            stem: dir.path().join("echo"),
        };
        assert!(run_case(&case, Mode::Both, dir.path()).passed());

        write(dir.path(), "echo.out", "bye");
        let result = run_case(&case, Mode::Both, dir.path());
        assert_eq!(result.output_matches, Some(false));
        assert!(!result.passed());
    }

    #[test]
    fn error_codes_skip_output_comparison() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "bad.src", ".IPPcode22\nWRITE GF@x\n");
        write(dir.path(), "bad.rc", "54\n");
        write(dir.path(), "bad.out", "ignored");
        let case = TestCase {
            stem: dir.path().join("bad"),
        };
        let result = run_case(&case, Mode::Both, dir.path());
        assert_eq!(result.returned_code, 54);
        assert_eq!(result.output_matches, None);
        assert!(result.passed());
    }

    #[test]
    fn parse_only_compares_programs() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "w.src", ".IPPcode22\nwrite int@0x10\n");
        write(
            dir.path(),
            "w.out",
            "<program language=\"IPPcode22\">\n  <instruction opcode=\"WRITE\" order=\"3\">\n    <arg1 type=\"int\">16</arg1>\n  </instruction>\n</program>",
        );
        let case = TestCase {
            stem: dir.path().join("w"),
        };
        assert!(run_case(&case, Mode::ParseOnly, dir.path()).passed());
    }

    #[test]
    fn interpret_only_reads_xml() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "x.src",
            "<program language=\"IPPcode22\"><instruction order=\"1\" opcode=\"EXIT\"><arg1 type=\"int\">3</arg1></instruction></program>",
        );
        write(dir.path(), "x.rc", "3");
        let case = TestCase {
            stem: dir.path().join("x"),
        };
        let result = run_case(&case, Mode::InterpretOnly, dir.path());
        assert_eq!(result.returned_code, 3);
        assert!(result.passed());
    }

    #[test]
    fn writer_output_rejected_by_loader_is_internal() {
        assert_eq!(reload("<program/>"), Err(99));
    }

    #[test]
    fn report_lists_failures() {
        let results = vec![
            CaseResult {
                name: "ok".into(),
                expected_code: 0,
                returned_code: 0,
                output_matches: Some(true),
            },
            CaseResult {
                name: "code".into(),
                expected_code: 0,
                returned_code: 53,
                output_matches: None,
            },
            CaseResult {
                name: "text".into(),
                expected_code: 0,
                returned_code: 0,
                output_matches: Some(false),
            },
        ];
        assert_eq!(
            report(&results),
            "PASS  ok\nFAIL  code: expected code 0, got 53\nFAIL  text: output differs\n1/3 passed\n"
        );
    }
}
