//! Values held by bound controls

use crate::validators::json_as_f64;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::fmt;

/// The value of a control after transport coercion
///
/// JSON `null` is never stored as `Json(Value::Null)`; conversions from
/// [`Value`] map it to [`ControlValue::Null`], the pristine empty value.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ControlValue {
	#[default]
	Null,
	Json(Value),
	Date(DateTime<Utc>),
}

impl ControlValue {
	/// Whether this is the pristine empty value
	pub fn is_null(&self) -> bool {
		matches!(self, Self::Null)
	}

	/// Whether the value counts as empty for `required` checks
	pub fn is_empty(&self) -> bool {
		match self {
			Self::Null => true,
			Self::Json(Value::String(s)) => s.is_empty(),
			Self::Json(Value::Array(items)) => items.is_empty(),
			Self::Json(Value::Null) => true,
			Self::Json(_) | Self::Date(_) => false,
		}
	}

	/// Length of string or array values, in characters for strings
	pub fn length(&self) -> Option<usize> {
		match self {
			Self::Json(Value::String(s)) => Some(s.chars().count()),
			Self::Json(Value::Array(items)) => Some(items.len()),
			_ => None,
		}
	}

	/// Numeric view of the value
	pub fn as_f64(&self) -> Option<f64> {
		match self {
			Self::Json(v) => json_as_f64(v),
			_ => None,
		}
	}

	/// Text view of the value, used by pattern rules
	pub fn as_text(&self) -> Option<String> {
		match self {
			Self::Null => None,
			Self::Json(Value::String(s)) => Some(s.clone()),
			Self::Json(Value::Number(n)) => Some(n.to_string()),
			Self::Json(Value::Bool(b)) => Some(b.to_string()),
			Self::Json(_) => None,
			Self::Date(d) => Some(format_date(d)),
		}
	}

	/// The date held by this value, if any
	pub fn as_date(&self) -> Option<&DateTime<Utc>> {
		match self {
			Self::Date(d) => Some(d),
			_ => None,
		}
	}

	/// Transport representation of the value
	///
	/// Dates are rendered as RFC 3339 strings with millisecond precision.
	pub fn to_json(&self) -> Value {
		match self {
			Self::Null => Value::Null,
			Self::Json(v) => v.clone(),
			Self::Date(d) => Value::String(format_date(d)),
		}
	}

	/// Leaf state for the form model; `None` when empty
	pub fn to_leaf_state(&self) -> Option<Value> {
		match self.to_json() {
			Value::Null => None,
			other => Some(other),
		}
	}
}

fn format_date(date: &DateTime<Utc>) -> String {
	date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl Serialize for ControlValue {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		self.to_json().serialize(serializer)
	}
}

impl From<Value> for ControlValue {
	fn from(value: Value) -> Self {
		match value {
			Value::Null => Self::Null,
			other => Self::Json(other),
		}
	}
}

impl From<Option<Value>> for ControlValue {
	fn from(value: Option<Value>) -> Self {
		value.map(Self::from).unwrap_or_default()
	}
}

impl From<DateTime<Utc>> for ControlValue {
	fn from(value: DateTime<Utc>) -> Self {
		Self::Date(value)
	}
}

impl fmt::Display for ControlValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Null => write!(f, "null"),
			Self::Json(v) => write!(f, "{}", v),
			Self::Date(d) => write!(f, "{}", format_date(d)),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::TimeZone;
	use rstest::rstest;
	use serde_json::json;

	#[rstest]
	fn test_null_json_maps_to_pristine_value() {
		assert_eq!(ControlValue::from(json!(null)), ControlValue::Null);
		assert_eq!(ControlValue::from(None), ControlValue::Null);
	}

	#[rstest]
	fn test_date_serializes_as_rfc3339() {
		// Arrange
		let date = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();

		// Act
		let json = serde_json::to_value(ControlValue::from(date)).unwrap();

		// Assert
		assert_eq!(json, json!("2024-03-01T12:30:00.000Z"));
	}

	#[rstest]
	fn test_to_leaf_state() {
		assert_eq!(ControlValue::Null.to_leaf_state(), None);
		assert_eq!(
			ControlValue::from(json!(10)).to_leaf_state(),
			Some(json!(10))
		);
	}

	#[rstest]
	#[case(json!("12"), Some(12.0))]
	#[case(json!(3.5), Some(3.5))]
	#[case(json!("abc"), None)]
	#[case(json!(true), None)]
	fn test_as_f64(#[case] input: Value, #[case] expected: Option<f64>) {
		assert_eq!(ControlValue::from(input).as_f64(), expected);
	}
}
