//! Boundary-safe value normalization and persistable bindings.
//!
//! Every cell value leaving the engine (previews, stats, chart data,
//! snapshots) passes through [`any_value_to_json`] first, so callers never
//! see NaN/Infinity tokens, raw epoch integers for dates, or library-boxed
//! numeric types.

use chrono::DateTime;
use polars::frame::DataFrame;
use polars::prelude::{AnyValue, TimeUnit};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

/// A session binding in snapshot form.
///
/// Tables carry their full column data; everything else is reduced to plain
/// JSON. Bindings that fit neither (figures, charts, closures) are not
/// persistable and get dropped before a snapshot is written.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum PersistedValue {
    /// Scalar, array or map binding.
    Data(Value),
    /// Tabular binding.
    Table(DataFrame),
}

/// Convert a finite float to a JSON number, anything else to null.
fn finite_number(f: f64) -> Value {
    Number::from_f64(f).map_or(Value::Null, Value::Number)
}

/// Format an epoch offset as an ISO-8601 string.
///
/// Falls back to null for offsets outside the representable range.
fn epoch_to_iso(secs: i64, nanos: u32, date_only: bool) -> Value {
    match DateTime::from_timestamp(secs, nanos) {
        Some(dt) if date_only => Value::String(dt.date_naive().to_string()),
        Some(dt) => Value::String(dt.to_rfc3339()),
        None => Value::Null,
    }
}

/// Normalize a single table cell for the system boundary.
///
/// Rules, applied recursively through nested values:
/// - date/datetime values become ISO-8601 strings
/// - NaN and ±Infinity become null
/// - all numeric widths become plain JSON numbers
/// - nested list cells become plain JSON arrays
pub fn any_value_to_json(value: &AnyValue) -> Value {
    match value {
        AnyValue::Null => Value::Null,
        AnyValue::Boolean(b) => Value::Bool(*b),
        AnyValue::String(s) => Value::String((*s).to_string()),
        AnyValue::StringOwned(s) => Value::String(s.to_string()),
        AnyValue::Int8(v) => Value::Number((*v as i64).into()),
        AnyValue::Int16(v) => Value::Number((*v as i64).into()),
        AnyValue::Int32(v) => Value::Number((*v as i64).into()),
        AnyValue::Int64(v) => Value::Number((*v).into()),
        AnyValue::UInt8(v) => Value::Number((*v as u64).into()),
        AnyValue::UInt16(v) => Value::Number((*v as u64).into()),
        AnyValue::UInt32(v) => Value::Number((*v as u64).into()),
        AnyValue::UInt64(v) => Value::Number((*v).into()),
        AnyValue::Float32(v) => finite_number(*v as f64),
        AnyValue::Float64(v) => finite_number(*v),
        AnyValue::Date(days) => epoch_to_iso(*days as i64 * 86_400, 0, true),
        AnyValue::Datetime(v, unit, _) => {
            let (secs, nanos) = match unit {
                TimeUnit::Nanoseconds => (v.div_euclid(1_000_000_000), v.rem_euclid(1_000_000_000)),
                TimeUnit::Microseconds => {
                    (v.div_euclid(1_000_000), v.rem_euclid(1_000_000) * 1_000)
                }
                TimeUnit::Milliseconds => (v.div_euclid(1_000), v.rem_euclid(1_000) * 1_000_000),
            };
            epoch_to_iso(secs, nanos as u32, false)
        }
        AnyValue::List(series) => {
            Value::Array(series.iter().map(|v| any_value_to_json(&v)).collect())
        }
        other => Value::String(other.to_string()),
    }
}
