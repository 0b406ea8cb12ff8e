//! Raw constructor arguments and the normalization rules applied to them.
//!
//! Callers and server snapshots hand over loosely typed values: numbers may
//! arrive as strings, text arrives percent-encoded, and the literal
//! `"default"` stands in for "use the built-in default".

use serde::{Deserialize, Serialize};

use crate::codec;

/// Placeholder meaning "substitute the field's default".
pub const PLACEHOLDER: &str = "default";

/// A raw field value as supplied by a caller or decoded from a response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Param {
    Number(f64),
    Text(String),
}

impl Param {
    /// Whether this value is the `"default"` placeholder.
    pub fn is_placeholder(&self) -> bool {
        matches!(self, Param::Text(t) if t == PLACEHOLDER)
    }

    /// Coerce to a number. Unparseable text becomes NaN.
    pub fn to_number(&self) -> f64 {
        match self {
            Param::Number(n) => *n,
            Param::Text(t) => coerce_number(t),
        }
    }

    /// Decode to text. Numbers are rendered in their shortest form.
    pub fn to_text(&self) -> String {
        match self {
            Param::Number(n) => format_number(*n),
            Param::Text(t) => codec::decode(t),
        }
    }
}

impl From<f64> for Param {
    fn from(value: f64) -> Self {
        Param::Number(value)
    }
}

impl From<i32> for Param {
    fn from(value: i32) -> Self {
        Param::Number(value as f64)
    }
}

impl From<u32> for Param {
    fn from(value: u32) -> Self {
        Param::Number(value as f64)
    }
}

impl From<&str> for Param {
    fn from(value: &str) -> Self {
        Param::Text(value.to_string())
    }
}

impl From<&String> for Param {
    fn from(value: &String) -> Self {
        Param::Text(value.clone())
    }
}

impl From<String> for Param {
    fn from(value: String) -> Self {
        Param::Text(value)
    }
}

/// The supplied value, unless it is absent or the placeholder.
pub fn provided(param: &Option<Param>) -> Option<&Param> {
    param.as_ref().filter(|p| !p.is_placeholder())
}

/// Normalize a text field: decode once, or fall back to `default`.
pub fn text(param: &Option<Param>, default: &str) -> String {
    provided(param)
        .map(Param::to_text)
        .unwrap_or_else(|| default.to_string())
}

/// Normalize a numeric field: coerce, or fall back to `default`.
pub fn number(param: &Option<Param>, default: f64) -> f64 {
    provided(param).map(Param::to_number).unwrap_or(default)
}

/// Numeric coercion with the server's rules: surrounding whitespace is
/// ignored, empty text is zero, `0x` prefixes are hexadecimal and
/// `Infinity` is accepted. Anything else that is not a decimal literal is NaN.
pub fn coerce_number(text: &str) -> f64 {
    let t = text.trim();
    if t.is_empty() {
        return 0.0;
    }
    match t {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    if let Some(hex) = t.strip_prefix("0x").or_else(|| t.strip_prefix("0X")) {
        return u64::from_str_radix(hex, 16)
            .map(|v| v as f64)
            .unwrap_or(f64::NAN);
    }
    // Rust's parser also accepts "inf" and "nan", which are not numbers here.
    if t.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') {
        return f64::NAN;
    }
    t.parse::<f64>().unwrap_or(f64::NAN)
}

/// Render a number the way the server prints it: integral values without a
/// fractional part, `NaN` and `Infinity` spelled out.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e21 {
        format!("{n:.0}")
    } else {
        format!("{n}")
    }
}
