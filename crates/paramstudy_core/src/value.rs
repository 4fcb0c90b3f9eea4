//! Scalar parameter values
//!
//! Every column of a parameter study holds values of a single [`ValueKind`].
//! Values deserialize from any self-describing format (YAML, JSON) by their
//! natural scalar type: `true` is a bool, `3` an integer, `3.0` a float and
//! `"steel"` text.

use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Value type of a parameter column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ValueKind {
    Bool,
    Integer,
    Float,
    Text,
}

impl ValueKind {
    /// Name of the column dtype in persisted studies
    pub fn dtype(self) -> &'static str {
        match self {
            ValueKind::Bool => "bool",
            ValueKind::Integer => "int64",
            ValueKind::Float => "float64",
            ValueKind::Text => "str",
        }
    }

    pub fn from_dtype(dtype: &str) -> Option<Self> {
        match dtype {
            "bool" => Some(ValueKind::Bool),
            "int64" => Some(ValueKind::Integer),
            "float64" => Some(ValueKind::Float),
            "str" => Some(ValueKind::Text),
            _ => None,
        }
    }

    fn tag(self) -> u8 {
        match self {
            ValueKind::Bool => 0,
            ValueKind::Integer => 1,
            ValueKind::Float => 2,
            ValueKind::Text => 3,
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dtype())
    }
}

/// A concrete parameter value
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl ParameterValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            ParameterValue::Bool(_) => ValueKind::Bool,
            ParameterValue::Integer(_) => ValueKind::Integer,
            ParameterValue::Float(_) => ValueKind::Float,
            ParameterValue::Text(_) => ValueKind::Text,
        }
    }

    /// Numeric view of the value, `None` for bools and text
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParameterValue::Integer(i) => Some(*i as f64),
            ParameterValue::Float(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParameterValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_finite(&self) -> bool {
        match self {
            ParameterValue::Float(x) => x.is_finite(),
            _ => true,
        }
    }

    /// Equality used when deciding whether two parameter sets are the same.
    ///
    /// Floats compare by absolute difference against `tolerance`; a zero
    /// tolerance is plain `==`, so `-0.0` matches `0.0`. Other kinds compare
    /// exactly and never match across kinds.
    pub fn matches(&self, other: &ParameterValue, tolerance: f64) -> bool {
        match (self, other) {
            (ParameterValue::Float(a), ParameterValue::Float(b)) => {
                if tolerance > 0.0 {
                    (a - b).abs() <= tolerance
                } else {
                    a == b
                }
            }
            _ => self == other,
        }
    }

    /// Append a canonical byte encoding of the value to `buf`.
    ///
    /// Values that compare equal with zero tolerance encode identically.
    pub fn write_canonical(&self, buf: &mut Vec<u8>) {
        buf.push(self.kind().tag());
        match self {
            ParameterValue::Bool(b) => buf.push(u8::from(*b)),
            ParameterValue::Integer(i) => buf.extend_from_slice(&i.to_le_bytes()),
            ParameterValue::Float(x) => {
                let x = if *x == 0.0 { 0.0 } else { *x };
                buf.extend_from_slice(&x.to_bits().to_le_bytes());
            }
            ParameterValue::Text(s) => {
                buf.extend_from_slice(&(s.len() as u64).to_le_bytes());
                buf.extend_from_slice(s.as_bytes());
            }
        }
    }
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterValue::Bool(b) => write!(f, "{b}"),
            ParameterValue::Integer(i) => write!(f, "{i}"),
            ParameterValue::Float(x) => write!(f, "{x:?}"),
            ParameterValue::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<bool> for ParameterValue {
    fn from(b: bool) -> Self {
        ParameterValue::Bool(b)
    }
}

impl From<i64> for ParameterValue {
    fn from(i: i64) -> Self {
        ParameterValue::Integer(i)
    }
}

impl From<i32> for ParameterValue {
    fn from(i: i32) -> Self {
        ParameterValue::Integer(i64::from(i))
    }
}

impl From<f64> for ParameterValue {
    fn from(x: f64) -> Self {
        ParameterValue::Float(x)
    }
}

impl From<&str> for ParameterValue {
    fn from(s: &str) -> Self {
        ParameterValue::Text(s.to_string())
    }
}

impl From<String> for ParameterValue {
    fn from(s: String) -> Self {
        ParameterValue::Text(s)
    }
}

impl Serialize for ParameterValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ParameterValue::Bool(b) => serializer.serialize_bool(*b),
            ParameterValue::Integer(i) => serializer.serialize_i64(*i),
            ParameterValue::Float(x) => serializer.serialize_f64(*x),
            ParameterValue::Text(s) => serializer.serialize_str(s),
        }
    }
}

struct ParameterValueVisitor;

impl Visitor<'_> for ParameterValueVisitor {
    type Value = ParameterValue;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a bool, integer, float or string")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
        Ok(ParameterValue::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(ParameterValue::Integer(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        i64::try_from(v)
            .map(ParameterValue::Integer)
            .map_err(|_| E::custom(format!("integer {v} does not fit in i64")))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        Ok(ParameterValue::Float(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        Ok(ParameterValue::Text(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
        Ok(ParameterValue::Text(v))
    }
}

impl<'de> Deserialize<'de> for ParameterValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ParameterValueVisitor)
    }
}
