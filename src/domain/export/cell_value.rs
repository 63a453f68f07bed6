// ============================================================
// CELL VALUES
// ============================================================
// Tagged cell representation, decided once when a table is parsed

use serde_json::{Map, Value};
use std::fmt;

/// A plain scalar cell value
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    /// Missing value (empty CSV field, blank spreadsheet cell, JSON null)
    Empty,

    Text(String),

    Int(i64),

    Float(f64),

    Bool(bool),

    /// Spreadsheet date/time, kept as the Excel serial number
    DateTime(f64),
}

impl Scalar {
    pub fn is_empty(&self) -> bool {
        matches!(self, Scalar::Empty)
    }

    /// Convert a leaf JSON value into a scalar.
    /// Arrays and objects are kept as their JSON text.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => Scalar::Empty,
            Value::Bool(b) => Scalar::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Scalar::Int(i),
                None => n.as_f64().map(Scalar::Float).unwrap_or(Scalar::Empty),
            },
            Value::String(s) => Scalar::Text(s.clone()),
            Value::Array(_) | Value::Object(_) => Scalar::Text(value.to_string()),
        }
    }

    /// Whether this value equals the given row ordinal
    pub fn is_ordinal(&self, ordinal: usize) -> bool {
        match self {
            Scalar::Text(s) => s.trim().parse::<usize>().ok() == Some(ordinal),
            Scalar::Int(i) => usize::try_from(*i).ok() == Some(ordinal),
            Scalar::Float(f) => f.fract() == 0.0 && *f >= 0.0 && *f as usize == ordinal,
            _ => false,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Empty => Ok(()),
            Scalar::Text(s) => write!(f, "{}", s),
            Scalar::Int(i) => write!(f, "{}", i),
            Scalar::Float(v) | Scalar::DateTime(v) => fmt_float(*v, f),
            Scalar::Bool(true) => write!(f, "True"),
            Scalar::Bool(false) => write!(f, "False"),
        }
    }
}

/// Whole floats keep one decimal place so they stay distinguishable from integers
fn fmt_float(value: f64, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if value.is_nan() {
        Ok(())
    } else if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 {
        write!(f, "{:.1}", value)
    } else {
        write!(f, "{}", value)
    }
}

/// A single table cell
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Plain(Scalar),

    /// Text that looks like an HTML fragment (`<...>`)
    Markup(String),

    /// Key-value record from the nested column
    Structured(Map<String, Value>),
}

impl CellValue {
    pub fn empty() -> Self {
        CellValue::Plain(Scalar::Empty)
    }

    pub fn text(value: impl Into<String>) -> Self {
        CellValue::Plain(Scalar::Text(value.into()))
    }

    /// Classify a raw text cell.
    ///
    /// `nested` marks cells of the nested column: JSON objects there become
    /// [`CellValue::Structured`]. Anything else falls through to the normal
    /// markup / plain split.
    pub fn from_text(text: String, nested: bool) -> Self {
        if text.is_empty() {
            return CellValue::empty();
        }

        if nested {
            if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(text.trim()) {
                return CellValue::Structured(map);
            }
        }

        if Self::looks_like_markup(&text) {
            CellValue::Markup(text)
        } else {
            CellValue::Plain(Scalar::Text(text))
        }
    }

    /// Classify an already typed scalar; only text is inspected further
    pub fn from_scalar(scalar: Scalar, nested: bool) -> Self {
        match scalar {
            Scalar::Text(text) => Self::from_text(text, nested),
            other => CellValue::Plain(other),
        }
    }

    pub fn looks_like_markup(text: &str) -> bool {
        text.starts_with('<') && text.ends_with('>')
    }

    pub fn is_empty(&self) -> bool {
        self.as_scalar().is_some_and(Scalar::is_empty)
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            CellValue::Plain(scalar) => Some(scalar),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Plain(scalar) => write!(f, "{}", scalar),
            CellValue::Markup(text) => write!(f, "{}", text),
            CellValue::Structured(map) => {
                let json = serde_json::to_string(map).map_err(|_| fmt::Error)?;
                write!(f, "{}", json)
            }
        }
    }
}
