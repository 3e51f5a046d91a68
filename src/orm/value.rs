//! Typed scalar values for comparison and coercion

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::{Number, Value};
use std::cmp::Ordering;

use crate::orm::QueryError;
use crate::schema::{FieldDef, FieldKind};

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M"];

/// A field value reduced to something comparable
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl Scalar {
    /// Interpret a stored value according to the field's kind
    ///
    /// Stored values that don't fit the kind fall back to their text form so
    /// they can still be matched with text lookups. Text fields always hold
    /// text, even when YAML read an unquoted `100` or `true` as a number or
    /// boolean.
    pub fn from_stored(kind: FieldKind, value: &Value) -> Scalar {
        match value {
            Value::Null => Scalar::Null,
            Value::String(s) if kind.is_textual() => Scalar::Text(s.clone()),
            other if kind.is_textual() => Scalar::Text(other.to_string()),
            Value::Bool(b) => Scalar::Bool(*b),
            Value::Number(n) => match kind {
                FieldKind::Float => n.as_f64().map(Scalar::Float).unwrap_or(Scalar::Null),
                _ => n
                    .as_i64()
                    .map(Scalar::Int)
                    .or_else(|| n.as_f64().map(Scalar::Float))
                    .unwrap_or(Scalar::Null),
            },
            Value::String(s) => Scalar::parse(kind, s).unwrap_or_else(|| Scalar::Text(s.clone())),
            other => Scalar::Text(other.to_string()),
        }
    }

    /// Parse text typed on the command line into a value of `kind`
    pub fn parse(kind: FieldKind, raw: &str) -> Option<Scalar> {
        match kind {
            FieldKind::Char | FieldKind::Text => Some(Scalar::Text(raw.to_string())),
            FieldKind::Integer | FieldKind::ForeignKey => raw.trim().parse().ok().map(Scalar::Int),
            FieldKind::Float => raw
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .map(Scalar::Float),
            FieldKind::Boolean => parse_bool(raw).map(Scalar::Bool),
            FieldKind::Date => NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
                .ok()
                .map(Scalar::Date),
            FieldKind::DateTime => parse_datetime(raw.trim()).map(Scalar::DateTime),
        }
    }

    /// Parse command-line text for a field, with an error naming the field
    pub fn coerce(field: &FieldDef, raw: &str) -> Result<Scalar, QueryError> {
        Scalar::parse(field.kind, raw).ok_or_else(|| QueryError::InvalidValue {
            field: field.name.clone(),
            kind: field.kind,
            value: raw.to_string(),
        })
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }

    /// Text form used by the string lookups and delimited output
    pub fn text(&self) -> String {
        match self {
            Scalar::Null => String::new(),
            Scalar::Bool(b) => b.to_string(),
            Scalar::Int(i) => i.to_string(),
            Scalar::Float(f) => f.to_string(),
            Scalar::Text(s) => s.clone(),
            Scalar::Date(d) => d.format(DATE_FORMAT).to_string(),
            Scalar::DateTime(dt) => dt.format("%Y-%m-%dT%H:%M:%S").to_string(),
        }
    }

    /// Value written back to the store
    pub fn to_value(&self) -> Value {
        match self {
            Scalar::Null => Value::Null,
            Scalar::Bool(b) => Value::Bool(*b),
            Scalar::Int(i) => Value::from(*i),
            Scalar::Float(f) => Number::from_f64(*f).map(Value::Number).unwrap_or(Value::Null),
            Scalar::Text(s) => Value::String(s.clone()),
            Scalar::Date(_) | Scalar::DateTime(_) => Value::String(self.text()),
        }
    }

    /// Ordering between comparable values; `None` across unrelated types
    pub fn compare(&self, other: &Scalar) -> Option<Ordering> {
        match (self, other) {
            (Scalar::Bool(a), Scalar::Bool(b)) => Some(a.cmp(b)),
            (Scalar::Int(a), Scalar::Int(b)) => Some(a.cmp(b)),
            (Scalar::Int(a), Scalar::Float(b)) => (*a as f64).partial_cmp(b),
            (Scalar::Float(a), Scalar::Int(b)) => a.partial_cmp(&(*b as f64)),
            (Scalar::Float(a), Scalar::Float(b)) => a.partial_cmp(b),
            (Scalar::Text(a), Scalar::Text(b)) => Some(a.cmp(b)),
            (Scalar::Date(a), Scalar::Date(b)) => Some(a.cmp(b)),
            (Scalar::DateTime(a), Scalar::DateTime(b)) => Some(a.cmp(b)),
            (Scalar::Date(a), Scalar::DateTime(b)) => a.and_hms_opt(0, 0, 0).map(|a| a.cmp(b)),
            (Scalar::DateTime(a), Scalar::Date(b)) => b.and_hms_opt(0, 0, 0).map(|b| a.cmp(&b)),
            _ => None,
        }
    }

    /// Equality as used by `exact` and `in`
    pub fn matches(&self, other: &Scalar) -> bool {
        !self.is_null() && self.compare(other) == Some(Ordering::Equal)
    }

    /// Total order for sorting; nulls first, unrelated types by text
    pub fn sort_cmp(&self, other: &Scalar) -> Ordering {
        match (self.is_null(), other.is_null()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            (false, false) => self
                .compare(other)
                .unwrap_or_else(|| self.text().cmp(&other.text())),
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "t" | "yes" | "y" | "1" => Some(true),
        "false" | "f" | "no" | "n" | "0" => Some(false),
        _ => None,
    }
}

fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, DATE_FORMAT)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_by_kind() {
        assert_eq!(Scalar::parse(FieldKind::Integer, "42"), Some(Scalar::Int(42)));
        assert_eq!(Scalar::parse(FieldKind::Integer, "4x"), None);
        assert_eq!(Scalar::parse(FieldKind::Float, "1.5"), Some(Scalar::Float(1.5)));
        assert_eq!(Scalar::parse(FieldKind::Float, "NaN"), None);
        assert_eq!(Scalar::parse(FieldKind::Boolean, "Yes"), Some(Scalar::Bool(true)));
        assert_eq!(Scalar::parse(FieldKind::Boolean, "maybe"), None);
        assert_eq!(
            Scalar::parse(FieldKind::Date, "2024-02-29"),
            NaiveDate::from_ymd_opt(2024, 2, 29).map(Scalar::Date)
        );
        assert_eq!(Scalar::parse(FieldKind::Date, "2023-02-29"), None);
    }

    #[test]
    fn test_datetime_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 5, 1)
            .and_then(|d| d.and_hms_opt(12, 30, 0))
            .map(Scalar::DateTime);
        assert_eq!(Scalar::parse(FieldKind::DateTime, "2024-05-01T12:30:00"), expected);
        assert_eq!(Scalar::parse(FieldKind::DateTime, "2024-05-01 12:30"), expected);
        assert_eq!(Scalar::parse(FieldKind::DateTime, "2024-05-01T12:30:00Z"), expected);
    }

    #[test]
    fn test_stored_values() {
        assert_eq!(Scalar::from_stored(FieldKind::Integer, &Value::from(3)), Scalar::Int(3));
        assert_eq!(Scalar::from_stored(FieldKind::Float, &Value::from(3)), Scalar::Float(3.0));
        assert_eq!(Scalar::from_stored(FieldKind::Char, &Value::Null), Scalar::Null);
        // a malformed stored integer still matches as text
        assert_eq!(
            Scalar::from_stored(FieldKind::Integer, &Value::from("n/a")),
            Scalar::Text("n/a".to_string())
        );
    }

    #[test]
    fn test_unquoted_yaml_in_text_fields() {
        assert_eq!(
            Scalar::from_stored(FieldKind::Char, &Value::from(100)),
            Scalar::Text("100".to_string())
        );
        assert_eq!(
            Scalar::from_stored(FieldKind::Text, &Value::from(1.5)),
            Scalar::Text("1.5".to_string())
        );
        assert_eq!(
            Scalar::from_stored(FieldKind::Char, &Value::Bool(true)),
            Scalar::Text("true".to_string())
        );
        let stored = Scalar::from_stored(FieldKind::Char, &Value::from(100));
        assert!(stored.matches(&Scalar::parse(FieldKind::Char, "100").unwrap()));
    }

    #[test]
    fn test_compare_mixed_numbers() {
        assert_eq!(Scalar::Int(2).compare(&Scalar::Float(2.5)), Some(Ordering::Less));
        assert_eq!(Scalar::Text("a".into()).compare(&Scalar::Int(1)), None);
        assert!(Scalar::Int(1).matches(&Scalar::Float(1.0)));
        assert!(!Scalar::Null.matches(&Scalar::Null));
    }

    #[test]
    fn test_sort_nulls_first() {
        let mut values = vec![Scalar::Int(3), Scalar::Null, Scalar::Int(1)];
        values.sort_by(|a, b| a.sort_cmp(b));
        assert_eq!(values, vec![Scalar::Null, Scalar::Int(1), Scalar::Int(3)]);
    }
}
