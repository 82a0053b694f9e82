//! Per-type coercion of transport values
//!
//! Leaf states arrive in their transport representation. Before a state
//! update is applied to a control, the value is run through the coercion
//! strategy registered for the element's type discriminator (its `alias`).
//! Discriminators without a registered strategy keep the JSON value as is.
//!
//! ```
//! use formsync_core::coercion::CoercionRegistry;
//! use formsync_core::value::ControlValue;
//! use serde_json::json;
//!
//! let registry = CoercionRegistry::with_date_aliases(["Calendar"]);
//!
//! let date = registry.coerce(Some("Calendar"), &json!("2024-03-01")).unwrap();
//! assert!(date.as_date().is_some());
//!
//! let plain = registry.coerce(Some("TextBox"), &json!("2024-03-01")).unwrap();
//! assert_eq!(plain, ControlValue::from(json!("2024-03-01")));
//! ```

use crate::value::ControlValue;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Coercion function from a transport value to a control value
pub type CoercionFn = Arc<dyn Fn(&Value) -> Result<ControlValue, CoercionError> + Send + Sync>;

/// Naive date-time formats accepted after RFC 3339, interpreted as UTC
const NAIVE_DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Date-only formats, interpreted as UTC midnight
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];

/// Error raised when a transport value cannot be coerced
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("cannot coerce {value} into {target}")]
pub struct CoercionError {
	pub target: &'static str,
	pub value: String,
}

impl CoercionError {
	pub fn new(target: &'static str, value: &Value) -> Self {
		Self {
			target,
			value: value.to_string(),
		}
	}
}

/// Mapping from type discriminator to coercion strategy
#[derive(Clone, Default)]
pub struct CoercionRegistry {
	strategies: HashMap<String, CoercionFn>,
}

impl CoercionRegistry {
	/// Create a registry without strategies
	pub fn new() -> Self {
		Self::default()
	}

	/// Create a registry coercing the given aliases to dates
	pub fn with_date_aliases<I, S>(aliases: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let mut registry = Self::new();
		for alias in aliases {
			registry.register(alias, coerce_date);
		}
		registry
	}

	/// Register a strategy, replacing any previous one for the discriminator
	pub fn register<F>(&mut self, discriminator: impl Into<String>, strategy: F)
	where
		F: Fn(&Value) -> Result<ControlValue, CoercionError> + Send + Sync + 'static,
	{
		self.strategies
			.insert(discriminator.into(), Arc::new(strategy));
	}

	/// Whether a strategy exists for the discriminator
	pub fn contains(&self, discriminator: &str) -> bool {
		self.strategies.contains_key(discriminator)
	}

	/// Coerce a non-null transport value
	pub fn coerce(&self, discriminator: Option<&str>, value: &Value) -> Result<ControlValue, CoercionError> {
		match discriminator.and_then(|d| self.strategies.get(d)) {
			Some(strategy) => strategy(value),
			None => Ok(ControlValue::from(value.clone())),
		}
	}
}

impl fmt::Debug for CoercionRegistry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut keys: Vec<_> = self.strategies.keys().collect();
		keys.sort();
		f.debug_struct("CoercionRegistry")
			.field("strategies", &keys)
			.finish()
	}
}

/// Parse a transport value into a UTC date-time
///
/// Accepts RFC 3339 strings, naive ISO date-times and dates (as UTC), and
/// integral epoch milliseconds.
pub fn coerce_date(value: &Value) -> Result<ControlValue, CoercionError> {
	match value {
		Value::String(s) => parse_date_str(s.trim())
			.map(ControlValue::Date)
			.ok_or_else(|| CoercionError::new("date", value)),
		Value::Number(n) => n
			.as_i64()
			.and_then(DateTime::from_timestamp_millis)
			.map(ControlValue::Date)
			.ok_or_else(|| CoercionError::new("date", value)),
		_ => Err(CoercionError::new("date", value)),
	}
}

fn parse_date_str(s: &str) -> Option<DateTime<Utc>> {
	if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
		return Some(dt.with_timezone(&Utc));
	}
	for format in NAIVE_DATETIME_FORMATS {
		if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
			return Some(dt.and_utc());
		}
	}
	for format in DATE_FORMATS {
		if let Ok(date) = NaiveDate::parse_from_str(s, format) {
			return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
		}
	}
	None
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::TimeZone;
	use rstest::rstest;
	use serde_json::json;

	#[rstest]
	#[case(json!("2024-03-01T10:15:00Z"), Utc.with_ymd_and_hms(2024, 3, 1, 10, 15, 0).unwrap())]
	#[case(json!("2024-03-01T10:15:00+02:00"), Utc.with_ymd_and_hms(2024, 3, 1, 8, 15, 0).unwrap())]
	#[case(json!("2024-03-01T10:15:00"), Utc.with_ymd_and_hms(2024, 3, 1, 10, 15, 0).unwrap())]
	#[case(json!("2024-03-01"), Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap())]
	#[case(json!("03/01/2024"), Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap())]
	#[case(json!(1709287200000_i64), Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap())]
	fn test_coerce_date_accepts_transport_forms(#[case] input: Value, #[case] expected: DateTime<Utc>) {
		// Act
		let coerced = coerce_date(&input).unwrap();

		// Assert
		assert_eq!(coerced, ControlValue::Date(expected));
	}

	#[rstest]
	#[case(json!("not a date"))]
	#[case(json!(true))]
	#[case(json!({"y": 2024}))]
	fn test_coerce_date_rejects_garbage(#[case] input: Value) {
		let err = coerce_date(&input).unwrap_err();
		assert_eq!(err.target, "date");
	}

	#[rstest]
	fn test_unknown_discriminator_is_identity() {
		// Arrange
		let registry = CoercionRegistry::with_date_aliases(["Calendar"]);

		// Act
		let value = registry.coerce(None, &json!(10)).unwrap();

		// Assert
		assert_eq!(value, ControlValue::from(json!(10)));
	}

	#[rstest]
	fn test_custom_strategy_is_additive() {
		// Arrange
		let mut registry = CoercionRegistry::with_date_aliases(["Calendar"]);
		registry.register("Checkbox", |v: &Value| {
			Ok(ControlValue::from(json!(v.as_str() == Some("on"))))
		});

		// Act
		let checked = registry.coerce(Some("Checkbox"), &json!("on")).unwrap();

		// Assert
		assert_eq!(checked, ControlValue::from(json!(true)));
		assert!(registry.contains("Calendar"));
	}
}
