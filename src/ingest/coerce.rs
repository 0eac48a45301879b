use chrono::{DateTime, NaiveDate};
use serde::Serialize;
use serde_json::Value;

/// Textual markers that mean "unknown" rather than "bad data"
const UNKNOWN_MARKERS: &[&str] = &["", "unknown", "n/a", "na", "none", "null", "nan"];

/// A field value that could not be turned into its canonical type
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoercionWarning {
    pub field: String,
    pub raw: String,
}

/// Outcome of coercing one raw value
#[derive(Debug, Clone, PartialEq)]
pub enum Coerced<T> {
    Present(T),
    /// Absent, null or an explicit unknown marker
    Unknown,
    /// Present but unusable; carries the raw text
    Invalid(String),
}

impl<T> Coerced<T> {
    /// Collapse into an `Option`, recording a warning for invalid input
    pub fn record(self, field: &str, warnings: &mut Vec<CoercionWarning>) -> Option<T> {
        match self {
            Coerced::Present(value) => Some(value),
            Coerced::Unknown => None,
            Coerced::Invalid(raw) => {
                tracing::warn!("Could not coerce field '{}' from {}; treating as unknown", field, raw);
                warnings.push(CoercionWarning {
                    field: field.to_string(),
                    raw,
                });
                None
            }
        }
    }
}

/// Coerce a JSON value into a finite number
///
/// Strings are trimmed and stripped of `$` and `,` before parsing.
pub fn coerce_number(value: Option<&Value>) -> Coerced<f64> {
    match value {
        None | Some(Value::Null) => Coerced::Unknown,
        Some(Value::Number(n)) => match n.as_f64() {
            Some(f) if f.is_finite() => Coerced::Present(f),
            _ => Coerced::Invalid(n.to_string()),
        },
        Some(Value::String(s)) => {
            if is_unknown_marker(s) {
                return Coerced::Unknown;
            }
            let cleaned: String = s.trim().chars().filter(|c| *c != '$' && *c != ',').collect();
            match cleaned.parse::<f64>() {
                Ok(f) if f.is_finite() => Coerced::Present(f),
                _ => Coerced::Invalid(format!("{:?}", s)),
            }
        }
        Some(other) => Coerced::Invalid(other.to_string()),
    }
}

/// Coerce into a non-negative whole count (bedrooms)
pub fn coerce_count(value: Option<&Value>) -> Coerced<u32> {
    match coerce_number(value) {
        Coerced::Present(f) if f >= 0.0 && f <= u32::MAX as f64 => Coerced::Present(f.round() as u32),
        Coerced::Present(f) => Coerced::Invalid(f.to_string()),
        Coerced::Unknown => Coerced::Unknown,
        Coerced::Invalid(raw) => Coerced::Invalid(raw),
    }
}

/// Coerce into a calendar year
pub fn coerce_year(value: Option<&Value>) -> Coerced<i32> {
    match coerce_number(value) {
        Coerced::Present(f) if (0.0..=9999.0).contains(&f) => Coerced::Present(f.round() as i32),
        Coerced::Present(f) => Coerced::Invalid(f.to_string()),
        Coerced::Unknown => Coerced::Unknown,
        Coerced::Invalid(raw) => Coerced::Invalid(raw),
    }
}

/// Coerce a `YYYY-MM-DD` or RFC 3339 string into a date
pub fn coerce_date(value: Option<&Value>) -> Coerced<NaiveDate> {
    match value {
        None | Some(Value::Null) => Coerced::Unknown,
        Some(Value::String(s)) => {
            if is_unknown_marker(s) {
                return Coerced::Unknown;
            }
            let trimmed = s.trim();
            NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
                .ok()
                .or_else(|| DateTime::parse_from_rfc3339(trimmed).ok().map(|dt| dt.date_naive()))
                .map(Coerced::Present)
                .unwrap_or_else(|| Coerced::Invalid(format!("{:?}", s)))
        }
        Some(other) => Coerced::Invalid(other.to_string()),
    }
}

/// Coerce into non-empty text; numbers are rendered as-is
pub fn coerce_text(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

#[inline]
fn is_unknown_marker(s: &str) -> bool {
    let trimmed = s.trim();
    UNKNOWN_MARKERS
        .iter()
        .any(|marker| marker.eq_ignore_ascii_case(trimmed))
}
