//! Validated values.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

/// The result of running a field over a document.
///
/// Fields coerce loosely-typed JSON into one of these variants. Fields that
/// perform no coercion hand back the located document value as `Json`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Parsed {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Decimal(Decimal),
    Text(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    List(Vec<Parsed>),
    Map(BTreeMap<String, Parsed>),
    Json(Value),
}

impl Parsed {
    pub fn is_null(&self) -> bool {
        match self {
            Parsed::Null | Parsed::Json(Value::Null) => true,
            _ => false,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Parsed::Bool(b) => Some(*b),
            Parsed::Json(value) => value.as_bool(),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Parsed::Int(n) => Some(*n),
            Parsed::Json(value) => value.as_i64(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Parsed::Int(n) => Some(*n as f64),
            Parsed::Float(n) => Some(*n),
            Parsed::Decimal(d) => d.to_f64(),
            Parsed::Json(value) => value.as_f64(),
            _ => None,
        }
    }

    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Parsed::Int(n) => Some(Decimal::from(*n)),
            Parsed::Float(n) => Decimal::from_f64(*n),
            Parsed::Decimal(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Parsed::Text(s) => Some(s),
            Parsed::Json(value) => value.as_str(),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Parsed]> {
        match self {
            Parsed::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Parsed>> {
        match self {
            Parsed::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Looks up `key` when this is a map.
    pub fn get(&self, key: &str) -> Option<&Parsed> {
        self.as_map().and_then(|map| map.get(key))
    }

    /// The length used by the length validators: characters of text, items of
    /// a list or entries of a map.
    pub fn len(&self) -> Option<usize> {
        match self {
            Parsed::Text(s) => Some(s.chars().count()),
            Parsed::List(items) => Some(items.len()),
            Parsed::Map(map) => Some(map.len()),
            Parsed::Json(Value::String(s)) => Some(s.chars().count()),
            Parsed::Json(Value::Array(items)) => Some(items.len()),
            Parsed::Json(Value::Object(map)) => Some(map.len()),
            _ => None,
        }
    }

    /// Orders two values of compatible kinds.
    ///
    /// Integers, floats and decimals compare with each other by numeric
    /// value. Values of unrelated kinds are unordered.
    pub fn compare(&self, other: &Parsed) -> Option<Ordering> {
        match (self, other) {
            (Parsed::Int(a), Parsed::Int(b)) => Some(a.cmp(b)),
            (Parsed::Bool(a), Parsed::Bool(b)) => Some(a.cmp(b)),
            (Parsed::Date(a), Parsed::Date(b)) => Some(a.cmp(b)),
            (Parsed::DateTime(a), Parsed::DateTime(b)) => Some(a.cmp(b)),
            _ => {
                if let (Some(a), Some(b)) = (self.as_str(), other.as_str()) {
                    return Some(a.cmp(b));
                }
                if let (Some(a), Some(b)) = (self.as_decimal(), other.as_decimal()) {
                    return Some(a.cmp(&b));
                }
                match (self.as_f64(), other.as_f64()) {
                    (Some(a), Some(b)) => a.partial_cmp(&b),
                    _ => None,
                }
            }
        }
    }

    /// Equality that treats numerically equal numbers of different kinds as
    /// equal.
    pub fn matches(&self, other: &Parsed) -> bool {
        self == other || self.compare(other) == Some(Ordering::Equal)
    }

    /// Converts into a plain JSON value, e.g. for serializing a result.
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl fmt::Display for Parsed {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Parsed::Null => write!(f, "null"),
            Parsed::Bool(b) => write!(f, "{}", b),
            Parsed::Int(n) => write!(f, "{}", n),
            Parsed::Float(n) => write!(f, "{}", n),
            Parsed::Decimal(d) => write!(f, "{}", d),
            Parsed::Text(s) => write!(f, "{}", s),
            Parsed::Date(d) => write!(f, "{}", d),
            Parsed::DateTime(dt) => write!(f, "{}", dt),
            Parsed::Json(Value::String(s)) => write!(f, "{}", s),
            other => write!(f, "{}", other.to_json()),
        }
    }
}

impl From<bool> for Parsed {
    fn from(b: bool) -> Self {
        Parsed::Bool(b)
    }
}

impl From<i32> for Parsed {
    fn from(n: i32) -> Self {
        Parsed::Int(i64::from(n))
    }
}

impl From<i64> for Parsed {
    fn from(n: i64) -> Self {
        Parsed::Int(n)
    }
}

impl From<f64> for Parsed {
    fn from(n: f64) -> Self {
        Parsed::Float(n)
    }
}

impl From<Decimal> for Parsed {
    fn from(d: Decimal) -> Self {
        Parsed::Decimal(d)
    }
}

impl From<&str> for Parsed {
    fn from(s: &str) -> Self {
        Parsed::Text(s.to_owned())
    }
}

impl From<String> for Parsed {
    fn from(s: String) -> Self {
        Parsed::Text(s)
    }
}

impl From<NaiveDate> for Parsed {
    fn from(d: NaiveDate) -> Self {
        Parsed::Date(d)
    }
}

impl From<NaiveDateTime> for Parsed {
    fn from(dt: NaiveDateTime) -> Self {
        Parsed::DateTime(dt)
    }
}

impl From<Vec<Parsed>> for Parsed {
    fn from(items: Vec<Parsed>) -> Self {
        Parsed::List(items)
    }
}

impl From<BTreeMap<String, Parsed>> for Parsed {
    fn from(map: BTreeMap<String, Parsed>) -> Self {
        Parsed::Map(map)
    }
}

impl From<Value> for Parsed {
    fn from(value: Value) -> Self {
        Parsed::Json(value)
    }
}
