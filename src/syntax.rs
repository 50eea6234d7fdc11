//! Rendering and parsing of slot values as URI text.

use crate::schema::ValueKind;
use serde_json::{Number, Value};

/// Contract with the syntax formatting service.
pub trait SyntaxFormatter: Send + Sync {
    /// Canonical text of a scalar value; `None` for values with no URI form.
    fn format(&self, value: &Value) -> Option<String>;

    /// Read `text` back as a value of the given kind.
    fn parse(&self, text: &str, kind: ValueKind) -> Option<Value>;
}

/// Formats JSON scalars the way they appear in URIs: strings bare, numbers and
/// booleans in their JSON spelling.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainSyntax;

impl SyntaxFormatter for PlainSyntax {
    fn format(&self, value: &Value) -> Option<String> {
        match value {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }

    fn parse(&self, text: &str, kind: ValueKind) -> Option<Value> {
        match kind {
            ValueKind::Text => Some(Value::String(text.to_string())),
            ValueKind::Integer => text.parse::<i64>().ok().map(Value::from),
            ValueKind::Number => text
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number),
            ValueKind::Boolean => text.parse::<bool>().ok().map(Value::Bool),
        }
    }
}
