//! Recommendation payloads and their structural equality.
//!
//! Workers recommend either a simple label (`"automate-follow-ups"`) or a
//! structured JSON payload. Options are derived by grouping reports whose
//! recommendations are structurally equal:
//!
//! - object keys compare as a set, so key order never matters
//! - numbers compare by value (`1` equals `1.0`)
//! - arrays compare element-wise in order
//! - a label equals a structured JSON string with the same text

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A worker's recommended course of action.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Recommendation {
    /// A named action
    Label(String),
    /// An arbitrary structured payload
    Structured(Value),
}

impl Recommendation {
    pub fn label(label: impl Into<String>) -> Self {
        Recommendation::Label(label.into())
    }

    pub fn structured(value: Value) -> Self {
        Recommendation::Structured(value)
    }

    /// Returns the label text if this recommendation is a plain label
    /// (or a structured JSON string).
    pub fn as_label(&self) -> Option<&str> {
        match self {
            Recommendation::Label(label) => Some(label),
            Recommendation::Structured(Value::String(s)) => Some(s),
            Recommendation::Structured(_) => None,
        }
    }

    /// Order-independent structural equality.
    pub fn structurally_equal(&self, other: &Recommendation) -> bool {
        match (self.as_label(), other.as_label()) {
            (Some(a), Some(b)) => a == b,
            (Some(_), None) | (None, Some(_)) => false,
            (None, None) => match (self, other) {
                (Recommendation::Structured(a), Recommendation::Structured(b)) => {
                    values_equal(a, b)
                }
                _ => false,
            },
        }
    }

    /// Stable key such that two recommendations share a key exactly when
    /// they are structurally equal.
    pub fn canonical_key(&self) -> String {
        let mut out = String::new();
        match self {
            Recommendation::Label(label) => write_string(label, &mut out),
            Recommendation::Structured(value) => write_canonical(value, &mut out),
        }
        out
    }

    /// Short human-readable form used in option descriptions and statements.
    pub fn summary(&self) -> String {
        match self {
            Recommendation::Label(label) => label.clone(),
            Recommendation::Structured(Value::String(s)) => s.clone(),
            Recommendation::Structured(value) => value.to_string(),
        }
    }
}

impl PartialEq for Recommendation {
    fn eq(&self, other: &Self) -> bool {
        self.structurally_equal(other)
    }
}

impl From<&str> for Recommendation {
    fn from(label: &str) -> Self {
        Recommendation::label(label)
    }
}

impl std::fmt::Display for Recommendation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.summary())
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => x == y,
        },
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(key, x)| ys.get(key).is_some_and(|y| values_equal(x, y)))
        }
        _ => a == b,
    }
}

fn write_string(s: &str, out: &mut String) {
    // serde_json escaping keeps keys unambiguous
    out.push_str(&Value::String(s.to_string()).to_string());
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => match n.as_f64() {
            // -0.0 == 0.0
            Some(f) if f == 0.0 => out.push('0'),
            Some(f) => out.push_str(&f.to_string()),
            None => out.push_str(&n.to_string()),
        },
        Value::String(s) => write_string(s, out),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_string(key, out);
                out.push(':');
                write_canonical(&map[key], out);
            }
            out.push('}');
        }
    }
}
