//! Field converters
//!
//! Every converter takes one present raw value and returns:
//!
//! - `Ok(Some(v))` - the normalized value to store
//! - `Ok(None)`    - nothing meaningful to store, the target field is dropped
//! - `Err(_)`      - the value is malformed for this converter (fatal)
//!
//! Converters are named variants rather than closures so that document maps
//! can be loaded from configuration, printed and compared.

use chrono::{DateTime, Local, NaiveDateTime, Utc};
use serde_json::{Map, Number, Value};
use std::fmt;

use super::error::ConversionError;

/// Time zone used when rendering epoch timestamps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DateZone {
    /// Host local time (deployment default)
    Local,
    Utc,
}

/// Named value converter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Converter {
    /// Pass the value through unchanged
    Identity,
    /// Render as text; arrays and objects become compact JSON
    Str,
    /// Coerce to a 64-bit integer (floats truncate toward zero)
    Int,
    /// Coerce to a finite float
    Float,
    /// Truthiness of the value
    Bool,
    /// Epoch seconds to an ISO-8601 local date/time
    IsoDate,
    /// Epoch seconds to an ISO-8601 UTC date/time
    IsoDateUtc,
    /// Calendar year of an epoch timestamp (local time)
    Year,
    /// Calendar year of an epoch timestamp (UTC)
    YearUtc,
    /// Mapping of counts to probabilities
    NormalizeCounts,
    /// Keep only lists made entirely of strings
    ListOfStrings,
}

impl Converter {
    /// All converters, in declaration order
    pub const ALL: [Converter; 11] = [
        Converter::Identity,
        Converter::Str,
        Converter::Int,
        Converter::Float,
        Converter::Bool,
        Converter::IsoDate,
        Converter::IsoDateUtc,
        Converter::Year,
        Converter::YearUtc,
        Converter::NormalizeCounts,
        Converter::ListOfStrings,
    ];

    /// Configuration name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Identity => "identity",
            Self::Str => "string",
            Self::Int => "integer",
            Self::Float => "float",
            Self::Bool => "boolean",
            Self::IsoDate => "iso_date",
            Self::IsoDateUtc => "iso_date_utc",
            Self::Year => "year",
            Self::YearUtc => "year_utc",
            Self::NormalizeCounts => "normalize_counts",
            Self::ListOfStrings => "list_of_strings",
        }
    }

    /// Look up a converter by its configuration name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == name)
    }

    /// Apply the converter to a present value
    pub fn apply(&self, value: &Value) -> Result<Option<Value>, ConversionError> {
        match self {
            Self::Identity => Ok(Some(value.clone())),
            Self::Str => to_text(value).map(Some),
            Self::Int => to_integer(value).map(Some),
            Self::Float => to_float(value).map(Some),
            Self::Bool => Ok(Some(Value::Bool(truthy(value)))),
            Self::IsoDate => iso_date(self.as_str(), value, DateZone::Local).map(Some),
            Self::IsoDateUtc => iso_date(self.as_str(), value, DateZone::Utc).map(Some),
            Self::Year => year(self.as_str(), value, DateZone::Local).map(Some),
            Self::YearUtc => year(self.as_str(), value, DateZone::Utc).map(Some),
            Self::NormalizeCounts => normalize_counts(value),
            Self::ListOfStrings => Ok(list_of_strings(value)),
        }
    }
}

impl fmt::Display for Converter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Type casts
// ═══════════════════════════════════════════════════════════════════════════

/// Arrays and objects render as compact JSON (`{"$oid":"5a1b"}`)
fn to_text(value: &Value) -> Result<Value, ConversionError> {
    match value {
        Value::String(s) => Ok(Value::String(s.clone())),
        Value::Null => Err(ConversionError::new(
            "string",
            value,
            "null has no text form",
        )),
        other => Ok(Value::String(other.to_string())),
    }
}

fn to_integer(value: &Value) -> Result<Value, ConversionError> {
    let fail = |reason: &str| ConversionError::new("integer", value, reason);
    match value {
        Value::Number(n) => {
            if n.is_i64() || n.is_u64() {
                return Ok(Value::Number(n.clone()));
            }
            let f = n.as_f64().ok_or_else(|| fail("unrepresentable number"))?;
            float_to_i64(f)
                .map(Value::from)
                .ok_or_else(|| fail("float outside the 64-bit integer range"))
        }
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map(Value::from)
            .map_err(|e| fail(&format!("invalid integer literal ({})", e))),
        Value::Bool(b) => Ok(Value::from(i64::from(*b))),
        _ => Err(fail("expected a number, string or boolean")),
    }
}

fn float_to_i64(f: f64) -> Option<i64> {
    if !f.is_finite() {
        return None;
    }
    let t = f.trunc();
    // i64::MAX is not exactly representable; 2^63 is the first float past it
    if t < -9_223_372_036_854_775_808.0 || t >= 9_223_372_036_854_775_808.0 {
        return None;
    }
    Some(t as i64)
}

fn to_float(value: &Value) -> Result<Value, ConversionError> {
    let fail = |reason: &str| ConversionError::new("float", value, reason);
    let f = match value {
        Value::Number(n) => n.as_f64().ok_or_else(|| fail("unrepresentable number"))?,
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|e| fail(&format!("invalid float literal ({})", e)))?,
        Value::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        _ => return Err(fail("expected a number, string or boolean")),
    };
    Number::from_f64(f)
        .map(Value::Number)
        .ok_or_else(|| fail("non-finite floats cannot be indexed"))
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Timestamps
// ═══════════════════════════════════════════════════════════════════════════

/// Render epoch seconds as an ISO-8601 date/time
///
/// The epoch is rounded to milliseconds first. A whole-second result is
/// rendered with second precision (`2021-01-01T00:00:00`, 19 chars); anything
/// else gets exactly three fraction digits (`2021-01-01T00:00:00.123`, 23 chars).
pub fn epoch_to_iso(epoch: f64, zone: DateZone) -> Option<String> {
    if !epoch.is_finite() {
        return None;
    }
    let millis = (epoch * 1000.0).round();
    if millis.abs() >= 9.0e18 {
        return None;
    }
    let millis = millis as i64;
    let utc = DateTime::<Utc>::from_timestamp_millis(millis)?;
    let naive: NaiveDateTime = match zone {
        DateZone::Utc => utc.naive_utc(),
        DateZone::Local => utc.with_timezone(&Local).naive_local(),
    };

    let rendered = if millis.rem_euclid(1000) != 0 {
        naive.format("%Y-%m-%dT%H:%M:%S%.3f").to_string()
    } else {
        naive.format("%Y-%m-%dT%H:%M:%S").to_string()
    };
    // Years outside 0000..=9999 do not fit the fixed-width format
    matches!(rendered.len(), 19 | 23).then_some(rendered)
}

fn epoch_seconds(converter: &'static str, value: &Value) -> Result<f64, ConversionError> {
    match value {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| ConversionError::new(converter, value, "unrepresentable number")),
        _ => Err(ConversionError::new(
            converter,
            value,
            "expected epoch seconds as a number",
        )),
    }
}

fn iso_date(
    converter: &'static str,
    value: &Value,
    zone: DateZone,
) -> Result<Value, ConversionError> {
    let epoch = epoch_seconds(converter, value)?;
    epoch_to_iso(epoch, zone)
        .map(Value::String)
        .ok_or_else(|| ConversionError::new(converter, value, "timestamp out of range"))
}

fn year(converter: &'static str, value: &Value, zone: DateZone) -> Result<Value, ConversionError> {
    let epoch = epoch_seconds(converter, value)?;
    let iso = epoch_to_iso(epoch, zone)
        .ok_or_else(|| ConversionError::new(converter, value, "timestamp out of range"))?;
    iso[..4]
        .parse::<i64>()
        .map(Value::from)
        .map_err(|e| ConversionError::new(converter, value, e.to_string()))
}

// ═══════════════════════════════════════════════════════════════════════════
// Shape filters
// ═══════════════════════════════════════════════════════════════════════════

/// Divide every count by the total so the mapping sums to one
///
/// Non-mappings yield `None`. An empty mapping, or one whose counts sum to
/// zero, is divided by `1.0`.
fn normalize_counts(value: &Value) -> Result<Option<Value>, ConversionError> {
    let Value::Object(counts) = value else {
        return Ok(None);
    };

    let mut numeric = Vec::with_capacity(counts.len());
    for (key, count) in counts {
        let c = count.as_f64().ok_or_else(|| {
            ConversionError::new(
                "normalize_counts",
                value,
                format!("count for '{}' is not numeric", key),
            )
        })?;
        numeric.push((key, c));
    }

    let total: f64 = numeric.iter().map(|(_, c)| c).sum();
    let divisor = if total == 0.0 { 1.0 } else { total };

    let mut normalized = Map::with_capacity(numeric.len());
    for (key, c) in numeric {
        let share = Number::from_f64(c / divisor).ok_or_else(|| {
            ConversionError::new("normalize_counts", value, "non-finite share")
        })?;
        normalized.insert(key.clone(), Value::Number(share));
    }
    Ok(Some(Value::Object(normalized)))
}

fn list_of_strings(value: &Value) -> Option<Value> {
    match value {
        Value::Array(items) if items.iter().all(Value::is_string) => Some(value.clone()),
        _ => None,
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════
