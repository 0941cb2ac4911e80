//! Tokenizer for IPPcode22 source text.
//!
//! A line is split into whitespace-separated words after stripping the `#`
//! comment. Operand words are classified later, once the opcode says which
//! operand kind is expected at each position.

use ippcode_common::{FrameTag, Value, ValueKind, Variable};

/// Characters allowed in identifiers besides ASCII letters and digits.
const SPECIAL_CHARS: &str = "_-$&%*!?";

/// Split a line into words. Returns an empty Vec for blank lines and
/// comment-only lines. Comments start with `#` and extend to end of line.
pub(crate) fn tokenize_line(line: &str) -> Vec<&str> {
    let line = match line.find('#') {
        Some(pos) => &line[..pos],
        None => line,
    };
    line.split_whitespace().collect()
}

/// Whether a line is the `.IPPcode22` header (case-insensitive).
pub(crate) fn is_header(words: &[&str]) -> bool {
    matches!(words, [word] if word.eq_ignore_ascii_case(".IPPcode22"))
}

/// Label names and variable names: a letter or special character followed
/// by letters, digits or special characters.
pub(crate) fn is_identifier(word: &str) -> bool {
    let is_start = |c: char| c.is_ascii_alphabetic() || SPECIAL_CHARS.contains(c);
    let mut chars = word.chars();
    match chars.next() {
        Some(first) if is_start(first) => chars.all(|c| is_start(c) || c.is_ascii_digit()),
        _ => false,
    }
}

/// `GF@name`, `LF@name` or `TF@name`.
pub(crate) fn lex_variable(word: &str) -> Option<Variable> {
    let (prefix, name) = word.split_once('@')?;
    let frame = FrameTag::from_prefix(prefix)?;
    is_identifier(name).then(|| Variable::new(frame, name))
}

/// `nil@nil`, `bool@true|false`, `int@<integer>` or `string@<text>`.
pub(crate) fn lex_constant(word: &str) -> Option<Value> {
    let (prefix, text) = word.split_once('@')?;
    match ValueKind::from_name(prefix)? {
        ValueKind::Nil => (text == "nil").then_some(Value::Nil),
        ValueKind::Bool => match text {
            "true" => Some(Value::Bool(true)),
            "false" => Some(Value::Bool(false)),
            _ => None,
        },
        ValueKind::Int => lex_int(text).map(Value::Int),
        ValueKind::String => is_string_literal(text).then(|| Value::string(text)),
    }
}

/// A type operand: `int`, `bool` or `string`.
pub(crate) fn lex_type(word: &str) -> Option<ValueKind> {
    ValueKind::try_from(word).ok()
}

/// Integer literal: optional sign, then decimal digits, octal with a `0`,
/// `0o` or `0O` prefix, or hexadecimal with a `0x` or `0X` prefix.
fn lex_int(text: &str) -> Option<i64> {
    let (negative, body) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };

    let is_octal_digit = |b: u8| (b'0'..=b'7').contains(&b);
    let (radix, digits) = if let Some(hex) = body.strip_prefix("0x").or(body.strip_prefix("0X")) {
        (16, hex)
    } else if let Some(oct) = body.strip_prefix("0o").or(body.strip_prefix("0O")) {
        (8, oct)
    } else if body.len() > 1 && body.starts_with('0') && body.bytes().all(is_octal_digit) {
        (8, &body[1..])
    } else {
        (10, body)
    };

    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return None;
    }

    let magnitude = i128::from_str_radix(digits, radix).ok()?;
    let value = if negative { -magnitude } else { magnitude };
    i64::try_from(value).ok()
}

/// String literal text: no whitespace, `#` or lone backslash; every
/// backslash starts a three-digit escape.
fn is_string_literal(text: &str) -> bool {
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' {
            let escape = bytes.get(i + 1..i + 4);
            if !escape.is_some_and(|d| d.iter().all(u8::is_ascii_digit)) {
                return false;
            }
            i += 4;
        } else {
            i += 1;
        }
    }
    !text.chars().any(|c| c.is_whitespace() || c == '#')
}
