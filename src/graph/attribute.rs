//! Typed node attributes
//!
//! Attributes are a tagged union keyed by name. Typed accessors on
//! [`Node`](super::Node) fail with `WrongAttributeType` instead of coercing.

use std::fmt;

/// Attribute value stored on a node
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    /// Scalar integer
    Int(i64),
    /// Scalar float
    Float(f32),
    /// UTF-8 string
    String(String),
    /// Integer list
    Ints(Vec<i64>),
    /// Float list
    Floats(Vec<f32>),
    /// String list
    Strings(Vec<String>),
}

/// Discriminant of an [`AttributeValue`], used in error reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeKind {
    /// `Int`
    Int,
    /// `Float`
    Float,
    /// `String`
    String,
    /// `Ints`
    Ints,
    /// `Floats`
    Floats,
    /// `Strings`
    Strings,
}

impl AttributeValue {
    /// Kind of the stored value
    pub fn kind(&self) -> AttributeKind {
        match self {
            AttributeValue::Int(_) => AttributeKind::Int,
            AttributeValue::Float(_) => AttributeKind::Float,
            AttributeValue::String(_) => AttributeKind::String,
            AttributeValue::Ints(_) => AttributeKind::Ints,
            AttributeValue::Floats(_) => AttributeKind::Floats,
            AttributeValue::Strings(_) => AttributeKind::Strings,
        }
    }
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AttributeKind::Int => "int",
            AttributeKind::Float => "float",
            AttributeKind::String => "string",
            AttributeKind::Ints => "int list",
            AttributeKind::Floats => "float list",
            AttributeKind::Strings => "string list",
        };
        f.write_str(s)
    }
}

impl From<i64> for AttributeValue {
    fn from(v: i64) -> Self {
        AttributeValue::Int(v)
    }
}

impl From<f32> for AttributeValue {
    fn from(v: f32) -> Self {
        AttributeValue::Float(v)
    }
}

impl From<&str> for AttributeValue {
    fn from(v: &str) -> Self {
        AttributeValue::String(v.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(v: String) -> Self {
        AttributeValue::String(v)
    }
}

impl From<Vec<i64>> for AttributeValue {
    fn from(v: Vec<i64>) -> Self {
        AttributeValue::Ints(v)
    }
}

impl From<&[i64]> for AttributeValue {
    fn from(v: &[i64]) -> Self {
        AttributeValue::Ints(v.to_vec())
    }
}

impl From<Vec<f32>> for AttributeValue {
    fn from(v: Vec<f32>) -> Self {
        AttributeValue::Floats(v)
    }
}

impl From<Vec<String>> for AttributeValue {
    fn from(v: Vec<String>) -> Self {
        AttributeValue::Strings(v)
    }
}
