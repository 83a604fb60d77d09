//! The interpreter-facing primitive value (§3, §9 "Values as tagged variants").
//!
//! This is a strict tagged union rather than bare integers doubling as object
//! identifiers: every variant is unambiguous at the type level, so formatting
//! and arithmetic never need to ask "is this integer secretly a live id?".

use std::fmt;
use std::rc::Rc;

use crate::error::{CascadeError, Location};
use crate::heap::{HeapValue, ObjectId};
use crate::interpreter::function::Function;

#[derive(Clone)]
pub enum Value {
    Number(f64),
    Bool(bool),
    Str(Rc<str>),
    Null,
    Object(ObjectId),
    /// Function values. Held only in environment slots (§9) — never stored
    /// in a heap object field or array slot.
    Callable(Rc<Function>),
}

impl Value {
    pub fn str(s: impl Into<Rc<str>>) -> Self {
        Value::Str(s.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Truthiness used by `if`/`while` conditions and `!`.
    pub fn truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::Object(_) | Value::Callable(_) => true,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::Bool(_) => "boolean",
            Value::Str(_) => "string",
            Value::Null => "null",
            Value::Object(_) => "object",
            Value::Callable(_) => "function",
        }
    }

    /// Renders for `+`-concatenation: unlike `Display`, strings are not
    /// quoted (§6 distinguishes `print` rendering from concatenation).
    pub fn concat_str(&self) -> String {
        match self {
            Value::Str(s) => s.to_string(),
            other => other.to_string(),
        }
    }

    /// Converts into the restricted value a heap field may hold, rejecting
    /// callables (§9: object fields cannot hold callables).
    pub fn into_heap_value(self, loc: Location) -> Result<HeapValue, CascadeError> {
        match self {
            Value::Number(n) => Ok(HeapValue::Number(n)),
            Value::Bool(b) => Ok(HeapValue::Bool(b)),
            Value::Str(s) => Ok(HeapValue::Str(s)),
            Value::Null => Ok(HeapValue::Null),
            Value::Object(id) => Ok(HeapValue::Object(id)),
            Value::Callable(_) => Err(CascadeError::type_error(
                "functions cannot be stored in object fields or array slots",
                loc,
            )),
        }
    }
}

impl From<HeapValue> for Value {
    fn from(v: HeapValue) -> Self {
        match v {
            HeapValue::Number(n) => Value::Number(n),
            HeapValue::Bool(b) => Value::Bool(b),
            HeapValue::Str(s) => Value::Str(s),
            HeapValue::Null => Value::Null,
            HeapValue::Object(id) => Value::Object(id),
        }
    }
}

/// Renders a value the way `print` and string concatenation do (§6 "Value printing").
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", format_number(*n)),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Str(s) => write!(f, "{:?}", s.as_ref()),
            Value::Null => write!(f, "null"),
            Value::Object(id) => write!(f, "[Object#{}]", id.raw()),
            Value::Callable(func) => write!(f, "[Function {}]", func.name),
        }
    }
}

fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity".to_string() } else { "-Infinity".to_string() }
    } else if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}
