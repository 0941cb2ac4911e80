//! Runtime value representation for the IPPcode22 engine.
//!
//! Values live in frame variables and on the data stack. They are
//! immutable: every instruction that "updates" a value builds a new one.

use std::cmp::Ordering;
use std::fmt;

use crate::error::InstructionError;
use crate::kind::ValueKind;

/// Runtime value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Signed 64-bit integer.
    Int(i64),
    /// Boolean value.
    Bool(bool),
    /// Text with `\DDD` escapes already decoded.
    String(String),
    /// The `nil` value.
    Nil,
}

impl Value {
    /// Returns the kind of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Int(_) => ValueKind::Int,
            Value::Bool(_) => ValueKind::Bool,
            Value::String(_) => ValueKind::String,
            Value::Nil => ValueKind::Nil,
        }
    }

    /// Build a string value from raw source text, decoding `\DDD` escapes.
    pub fn string(raw: &str) -> Self {
        Value::String(decode_escapes(raw))
    }

    /// Build a value from its kind and the raw text of a constant operand.
    ///
    /// Integers use automatic base detection (see [`parse_int`]), booleans
    /// must be exactly `true` or `false`, and `nil` must be exactly `nil`.
    pub fn from_literal(kind: ValueKind, text: &str) -> Result<Self, InstructionError> {
        let invalid = || InstructionError::InvalidLiteral {
            kind: kind.name(),
            text: text.to_string(),
        };
        match kind {
            ValueKind::Int => parse_int(text).map(Value::Int).ok_or_else(invalid),
            ValueKind::Bool => match text.trim() {
                "true" => Ok(Value::Bool(true)),
                "false" => Ok(Value::Bool(false)),
                _ => Err(invalid()),
            },
            ValueKind::String => Ok(Value::string(text)),
            ValueKind::Nil => match text.trim() {
                "nil" => Ok(Value::Nil),
                _ => Err(invalid()),
            },
        }
    }

    /// Equality as used by EQ, JUMPIFEQ and JUMPIFNEQ.
    ///
    /// `nil` is comparable with everything and equal only to `nil`. Otherwise
    /// both values must share a kind; `None` signals a kind mismatch.
    pub fn equals(&self, other: &Value) -> Option<bool> {
        match (self, other) {
            (Value::Nil, Value::Nil) => Some(true),
            (Value::Nil, _) | (_, Value::Nil) => Some(false),
            (a, b) if a.kind() == b.kind() => Some(a == b),
            _ => None,
        }
    }

    /// Ordering as used by LT and GT. Defined only for two ints, two bools
    /// (`false < true`) or two strings (by code point).
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Text of this value as it appears after the `kind@` prefix in source
    /// code: strings are re-escaped, `nil` is spelled out.
    pub fn escaped_text(&self) -> String {
        match self {
            Value::String(s) => encode_escapes(s),
            Value::Nil => "nil".to_string(),
            other => other.to_string(),
        }
    }

    /// Full source literal, e.g. `int@5` or `string@a\032b`.
    pub fn literal(&self) -> String {
        format!("{}@{}", self.kind().name(), self.escaped_text())
    }
}

/// The printed form used by WRITE and DPRINT. `nil` prints as empty text.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{n}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::String(s) => f.write_str(s),
            Value::Nil => Ok(()),
        }
    }
}

/// Decode every `\DDD` sequence (exactly three decimal digits) into the
/// character with that code point. A backslash not followed by three digits
/// is kept verbatim.
pub fn decode_escapes(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;

    while let Some(pos) = rest.find('\\') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos + 1..];
        let decoded = tail
            .as_bytes()
            .get(..3)
            .filter(|digits| digits.iter().all(u8::is_ascii_digit))
            .map(|digits| {
                digits
                    .iter()
                    .fold(0u32, |acc, d| acc * 10 + u32::from(d - b'0'))
            })
            .and_then(char::from_u32);

        match decoded {
            Some(c) => {
                out.push(c);
                rest = &tail[3..];
            }
            None => {
                out.push('\\');
                rest = tail;
            }
        }
    }

    out.push_str(rest);
    out
}

/// Inverse of [`decode_escapes`] for the characters that cannot appear
/// literally in source text: whitespace, control characters, `#` and `\`.
pub fn encode_escapes(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        let code = c as u32;
        let must_escape = c.is_whitespace() || c.is_control() || c == '#' || c == '\\';
        if must_escape && code < 1000 {
            out.push_str(&format!("\\{code:03}"));
        } else {
            out.push(c);
        }
    }
    out
}

/// Parse an integer with automatic base detection.
///
/// Accepts surrounding whitespace, an optional sign, the prefixes `0x`, `0o`
/// and `0b` (any case), and single underscores between digits. A decimal
/// number may only start with `0` if it is all zeros. Returns `None` for
/// anything else, including values outside the `i64` range.
pub fn parse_int(text: &str) -> Option<i64> {
    let s = text.trim();
    let (negative, body) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let bytes = body.as_bytes();
    let (radix, digits) = if bytes.len() > 1 && bytes[0] == b'0' {
        match bytes[1] {
            b'x' | b'X' => (16, &body[2..]),
            b'o' | b'O' => (8, &body[2..]),
            b'b' | b'B' => (2, &body[2..]),
            _ => (10, body),
        }
    } else {
        (10, body)
    };

    // A prefix may be followed by one underscore, e.g. 0x_ff.
    let digits = if radix == 10 {
        digits
    } else {
        digits.strip_prefix('_').unwrap_or(digits)
    };
    if digits.is_empty()
        || digits.starts_with('_')
        || digits.ends_with('_')
        || digits.contains("__")
    {
        return None;
    }

    let cleaned: String = digits.chars().filter(|&c| c != '_').collect();
    if !cleaned.chars().all(|c| c.is_digit(radix)) {
        return None;
    }
    if radix == 10 && cleaned.starts_with('0') && cleaned.chars().any(|c| c != '0') {
        return None;
    }

    let magnitude = i128::from_str_radix(&cleaned, radix).ok()?;
    let value = if negative { -magnitude } else { magnitude };
    i64::try_from(value).ok()
}
