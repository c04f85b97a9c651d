//! The uniform scalar exchanged by every function call.
//!
//! A `Value` is always in exactly one of five variants; values are immutable
//! and consumed by function calls that return a fresh value. Text is stored
//! as Unicode scalar values; the byte-text functions (`LENB`, `LEFTB`, …)
//! operate on its UTF-8 byte count.

use chrono::{Duration as ChronoDur, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use std::fmt::{self, Display};
use std::hash::{Hash, Hasher};

use crate::ErrorKind;

/* ───────────────────── Excel date-serial utilities ───────────────────
Serial dates follow the OADate model: days since 1899-12-30, with the
fractional component the fraction of a 24h day. Serial 2 = 1900-01-01.
No timezone; time-of-day is wall-clock naive.
------------------------------------------------------------------- */

/// Base date for the serial system: serial 0.0 = 1899-12-30T00:00.
pub const SERIAL_EPOCH: NaiveDate = NaiveDate::from_ymd_opt(1899, 12, 30).unwrap();

/// Largest serial the grid can express (9999-12-31 plus a day of slack).
pub const SERIAL_MAX: f64 = 2_958_466.0;

pub fn date_to_serial(d: NaiveDate) -> f64 {
    (d - SERIAL_EPOCH).num_days() as f64
}

pub fn datetime_to_serial(dt: &NaiveDateTime) -> f64 {
    let days = (dt.date() - SERIAL_EPOCH).num_days() as f64;
    let secs = dt.time().num_seconds_from_midnight() as f64;
    days + secs / 86_400.0
}

/// Whole-day part of a serial as a calendar date. `None` outside the
/// representable range.
pub fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 0.0 || serial > SERIAL_MAX {
        return None;
    }
    SERIAL_EPOCH.checked_add_signed(ChronoDur::days(serial.trunc() as i64))
}

pub fn serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    let date = serial_to_date(serial)?;
    let frac_secs = (serial.fract() * 86_400.0).round() as i64;
    let time = NaiveTime::from_num_seconds_from_midnight_opt(frac_secs.rem_euclid(86_400) as u32, 0)?;
    Some(date.and_time(time))
}

/// The evaluation-time scalar: a closed sum over the five cell value kinds.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Empty,
    Number(f64),
    Text(String),
    Boolean(bool),
    Error(ErrorKind),
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Value::Empty => state.write_u8(0),
            Value::Number(n) => n.to_bits().hash(state),
            Value::Text(s) => s.hash(state),
            Value::Boolean(b) => b.hash(state),
            Value::Error(e) => e.hash(state),
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Empty => Ok(()),
            Value::Number(n) => write!(f, "{n}"),
            Value::Text(s) => write!(f, "{s}"),
            Value::Boolean(b) => f.write_str(if *b { "TRUE" } else { "FALSE" }),
            Value::Error(e) => write!(f, "{e}"),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}
impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}
impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}
impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}
impl From<ErrorKind> for Value {
    fn from(e: ErrorKind) -> Self {
        Value::Error(e)
    }
}

impl Value {
    pub fn empty() -> Self {
        Value::Empty
    }
    pub fn number(n: f64) -> Self {
        Value::Number(n)
    }
    pub fn text<S: Into<String>>(s: S) -> Self {
        Value::Text(s.into())
    }
    pub fn boolean(b: bool) -> Self {
        Value::Boolean(b)
    }
    pub fn error(kind: ErrorKind) -> Self {
        Value::Error(kind)
    }

    /* predicates */

    pub fn is_empty(&self) -> bool {
        matches!(self, Value::Empty)
    }
    pub fn is_number(&self) -> bool {
        matches!(self, Value::Number(_))
    }
    pub fn is_text(&self) -> bool {
        matches!(self, Value::Text(_))
    }
    pub fn is_boolean(&self) -> bool {
        matches!(self, Value::Boolean(_))
    }
    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }

    /// The error kind, if this value carries one.
    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            Value::Error(e) => Some(*e),
            _ => None,
        }
    }

    /* accessors */

    /// The number carried by a `Number`; no coercion.
    pub fn as_number_strict(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Excel numeric coercion: Number identity, Boolean 1/0, Empty 0, Text
    /// parsed in the invariant locale (trimmed). Non-numeric text is
    /// `#VALUE!`; errors propagate.
    pub fn as_number_coerced(&self) -> Result<f64, ErrorKind> {
        match self {
            Value::Number(n) => Ok(*n),
            Value::Boolean(b) => Ok(if *b { 1.0 } else { 0.0 }),
            Value::Empty => Ok(0.0),
            Value::Text(s) => parse_invariant_number(s).ok_or(ErrorKind::Value),
            Value::Error(e) => Err(*e),
        }
    }

    /// Excel text coercion: numbers use their shortest round-trip form,
    /// booleans render uppercase, empty is the empty string.
    pub fn as_text(&self) -> Result<String, ErrorKind> {
        match self {
            Value::Empty => Ok(String::new()),
            Value::Number(n) => Ok(format_number(*n)),
            Value::Text(s) => Ok(s.clone()),
            Value::Boolean(b) => Ok(if *b { "TRUE" } else { "FALSE" }.to_string()),
            Value::Error(e) => Err(*e),
        }
    }

    /// The boolean carried by a `Boolean`; no coercion.
    pub fn as_boolean_strict(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Excel logical coercion: numbers are `!= 0`, text must read
    /// TRUE/FALSE case-insensitively, empty is false; errors propagate.
    pub fn as_boolean_coerced(&self) -> Result<bool, ErrorKind> {
        match self {
            Value::Boolean(b) => Ok(*b),
            Value::Number(n) => Ok(*n != 0.0),
            Value::Empty => Ok(false),
            Value::Text(s) => match s.trim().to_ascii_uppercase().as_str() {
                "TRUE" => Ok(true),
                "FALSE" => Ok(false),
                _ => Err(ErrorKind::Value),
            },
            Value::Error(e) => Err(*e),
        }
    }

    /// Truthiness used by IF-style conditions.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Boolean(b) => *b,
            Value::Number(n) => *n != 0.0,
            Value::Text(s) => !s.is_empty(),
            Value::Empty | Value::Error(_) => false,
        }
    }
}

/// Shortest round-trip rendering of a number: integral values drop the
/// fraction entirely, everything else uses Rust's shortest representation.
pub fn format_number(n: f64) -> String {
    if n == n.trunc() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

/// Invariant-locale numeric text parse: trimmed, optional sign, decimal
/// point, scientific notation. Rejects the textual infinities/NaN that
/// `f64::from_str` would accept.
pub fn parse_invariant_number(s: &str) -> Option<f64> {
    let t = s.trim();
    if t.is_empty() || t.chars().any(|c| c.is_ascii_alphabetic() && !matches!(c, 'e' | 'E')) {
        return None;
    }
    let n: f64 = t.parse().ok()?;
    n.is_finite().then_some(n)
}
