// used for opaque payloads that are compared structurally
use serde_json::Value;

// used to print out readable forms of a payload
use std::fmt;

use crate::error::{KeyError, Result};

// ------------- Interval -------------
/// A closed numeric interval `[min, max]`, as carried by range filters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    min: f64,
    max: f64,
}
impl Interval {
    pub fn new(min: f64, max: f64) -> Result<Self> {
        if !min.is_finite() || !max.is_finite() || min > max {
            return Err(KeyError::InvalidInterval { min, max });
        }
        Ok(Self { min, max })
    }
    pub fn min(&self) -> f64 {
        self.min
    }
    pub fn max(&self) -> f64 {
        self.max
    }
    /// Two closed intervals overlap when neither lies entirely beyond the other.
    pub fn overlaps(&self, other: &Interval) -> bool {
        self.max >= other.min && self.min <= other.max
    }
    /// Reads a `[min, max]` pair. Anything else is `None` so the caller can
    /// report the mismatch against the filter it came from.
    pub fn from_value(value: &Value) -> Option<Result<Self>> {
        match value.as_array().map(|a| a.as_slice()) {
            Some([lo, hi]) => match (lo.as_f64(), hi.as_f64()) {
                (Some(lo), Some(hi)) => Some(Self::new(lo, hi)),
                _ => None,
            },
            _ => None,
        }
    }
}
impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}..{}", self.min, self.max)
    }
}

// ------------- Payload -------------
/// The decoded form of an encoded payload. Which variant a filter carries is
/// fixed by its kind, see [`crate::construct::FilterKind::decode`].
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Text(String),
    Number(f64),
    Color(Vec<f64>),
    Interval(Interval),
    Opaque(Value),
}
impl Payload {
    pub fn type_name(&self) -> &'static str {
        match self {
            Payload::Text(_) => "text",
            Payload::Number(_) => "number",
            Payload::Color(_) => "color",
            Payload::Interval(_) => "interval",
            Payload::Opaque(_) => "opaque",
        }
    }
    pub fn as_interval(&self) -> Option<&Interval> {
        match self {
            Payload::Interval(interval) => Some(interval),
            _ => None,
        }
    }
}
impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Payload::Text(s) => write!(f, "{}", s),
            Payload::Number(n) => write!(f, "{}", n),
            Payload::Color(c) => {
                let parts: Vec<String> = c.iter().map(|v| v.to_string()).collect();
                write!(f, "rgba({})", parts.join(","))
            }
            Payload::Interval(i) => write!(f, "[{}]", i),
            Payload::Opaque(v) => write!(f, "{}", v),
        }
    }
}

// ------------- Auxiliary -------------
/// Extra data travelling with a selection call and echoed in its notifications.
#[derive(Debug, Clone, PartialEq)]
pub enum Auxiliary {
    /// The interval a range filter is being set to.
    Interval(Interval),
    /// Anything a host wants to round-trip through the notifications.
    Opaque(Value),
}
impl Auxiliary {
    pub fn as_interval(&self) -> Option<&Interval> {
        match self {
            Auxiliary::Interval(interval) => Some(interval),
            Auxiliary::Opaque(_) => None,
        }
    }
}
