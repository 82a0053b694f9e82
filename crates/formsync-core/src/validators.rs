//! Validator rules and validator sets
//!
//! A [`ValidatorRule`] is a named, concrete check applied to a control value.
//! A [`ValidatorSet`] is the ordered collection of rules currently active on
//! one control, keyed by rule name: inserting a rule whose name is already
//! present replaces the earlier rule. An empty set is a valid state and
//! accepts every value.
//!
//! Rules follow the usual form-control conventions: only [`RuleKind::Required`]
//! rejects empty values, every other rule treats an empty value as valid.

use crate::value::ControlValue;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$")
		.expect("EMAIL_REGEX: invalid regex pattern")
});

/// Errors raised while building validator rules
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
	#[error("invalid pattern: {0}")]
	InvalidPattern(#[from] regex::Error),

	#[error("constraint is missing the `{0}` attribute")]
	MissingAttribute(&'static str),
}

/// A single failed rule
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{rule}: {message}")]
pub struct ValidationError {
	/// Name of the failed rule
	pub rule: String,
	/// Human readable message
	pub message: String,
}

/// The check performed by a rule
#[derive(Debug, Clone)]
pub enum RuleKind {
	Required,
	MinLength(usize),
	MaxLength(usize),
	Min(f64),
	Max(f64),
	Pattern(Regex),
	Email,
}

impl PartialEq for RuleKind {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Self::Required, Self::Required) | (Self::Email, Self::Email) => true,
			(Self::MinLength(a), Self::MinLength(b)) | (Self::MaxLength(a), Self::MaxLength(b)) => {
				a == b
			}
			(Self::Min(a), Self::Min(b)) | (Self::Max(a), Self::Max(b)) => a == b,
			(Self::Pattern(a), Self::Pattern(b)) => a.as_str() == b.as_str(),
			_ => false,
		}
	}
}

/// A named validator rule
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatorRule {
	name: String,
	kind: RuleKind,
	message: Option<String>,
}

impl ValidatorRule {
	/// Create a rule with an explicit name
	pub fn new(name: impl Into<String>, kind: RuleKind) -> Self {
		Self {
			name: name.into(),
			kind,
			message: None,
		}
	}

	/// `required` rule
	///
	/// # Examples
	///
	/// ```
	/// use formsync_core::validators::ValidatorRule;
	/// use formsync_core::value::ControlValue;
	///
	/// let rule = ValidatorRule::required();
	/// assert!(rule.validate(&ControlValue::Null).is_err());
	/// assert!(rule.validate(&ControlValue::from(serde_json::json!("x"))).is_ok());
	/// ```
	pub fn required() -> Self {
		Self::new("required", RuleKind::Required)
	}

	/// `minLength` rule
	pub fn min_length(len: usize) -> Self {
		Self::new("minLength", RuleKind::MinLength(len))
	}

	/// `maxLength` rule
	pub fn max_length(len: usize) -> Self {
		Self::new("maxLength", RuleKind::MaxLength(len))
	}

	/// `min` rule
	pub fn min(min: f64) -> Self {
		Self::new("min", RuleKind::Min(min))
	}

	/// `max` rule
	///
	/// # Examples
	///
	/// ```
	/// use formsync_core::validators::ValidatorRule;
	///
	/// let rule = ValidatorRule::max(100.0).named("max100");
	/// assert_eq!(rule.name(), "max100");
	/// ```
	pub fn max(max: f64) -> Self {
		Self::new("max", RuleKind::Max(max))
	}

	/// `pattern` rule; the expression must match the whole value
	pub fn pattern(regexp: &str) -> Result<Self, RuleError> {
		let anchored = Regex::new(&format!("^(?:{})$", regexp))?;
		Ok(Self::new("pattern", RuleKind::Pattern(anchored)))
	}

	/// `email` rule
	pub fn email() -> Self {
		Self::new("email", RuleKind::Email)
	}

	/// Rename the rule
	pub fn named(mut self, name: impl Into<String>) -> Self {
		self.name = name.into();
		self
	}

	/// Override the failure message
	pub fn with_message(mut self, message: impl Into<String>) -> Self {
		self.message = Some(message.into());
		self
	}

	/// Rule name, unique within a [`ValidatorSet`]
	pub fn name(&self) -> &str {
		&self.name
	}

	/// The check performed by this rule
	pub fn kind(&self) -> &RuleKind {
		&self.kind
	}

	/// Whether this rule rejects empty values
	pub fn is_required(&self) -> bool {
		matches!(self.kind, RuleKind::Required)
	}

	/// Check a value against this rule
	pub fn validate(&self, value: &ControlValue) -> Result<(), ValidationError> {
		if value.is_empty() {
			return if self.is_required() {
				Err(self.error("This field is required"))
			} else {
				Ok(())
			};
		}

		match &self.kind {
			RuleKind::Required => Ok(()),
			RuleKind::MinLength(min) => match value.length() {
				Some(len) if len < *min => {
					Err(self.error(format!("Ensure this value has at least {} characters", min)))
				}
				_ => Ok(()),
			},
			RuleKind::MaxLength(max) => match value.length() {
				Some(len) if len > *max => {
					Err(self.error(format!("Ensure this value has at most {} characters", max)))
				}
				_ => Ok(()),
			},
			RuleKind::Min(min) => match value.as_f64() {
				Some(n) if n < *min => Err(self.error(format!(
					"Ensure this value is greater than or equal to {}",
					min
				))),
				_ => Ok(()),
			},
			RuleKind::Max(max) => match value.as_f64() {
				Some(n) if n > *max => Err(self.error(format!(
					"Ensure this value is less than or equal to {}",
					max
				))),
				_ => Ok(()),
			},
			RuleKind::Pattern(regex) => match value.as_text() {
				Some(text) if !regex.is_match(&text) => Err(self.error("Enter a valid value")),
				_ => Ok(()),
			},
			RuleKind::Email => match value.as_text() {
				Some(text) if !EMAIL_REGEX.is_match(&text) => {
					Err(self.error("Enter a valid email address"))
				}
				_ => Ok(()),
			},
		}
	}

	fn error(&self, default_message: impl Into<String>) -> ValidationError {
		ValidationError {
			rule: self.name.clone(),
			message: self
				.message
				.clone()
				.unwrap_or_else(|| default_message.into()),
		}
	}
}

/// Ordered set of rules keyed by name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidatorSet {
	rules: Vec<ValidatorRule>,
}

impl ValidatorSet {
	/// Create an empty set
	pub fn new() -> Self {
		Self::default()
	}

	/// Insert a rule, replacing any rule with the same name in place
	pub fn insert(&mut self, rule: ValidatorRule) {
		match self.rules.iter_mut().find(|r| r.name == rule.name) {
			Some(existing) => *existing = rule,
			None => self.rules.push(rule),
		}
	}

	/// Whether a rule with this name is present
	pub fn contains(&self, name: &str) -> bool {
		self.rules.iter().any(|r| r.name == name)
	}

	/// Look up a rule by name
	pub fn get(&self, name: &str) -> Option<&ValidatorRule> {
		self.rules.iter().find(|r| r.name == name)
	}

	/// Rule names in insertion order
	pub fn names(&self) -> Vec<&str> {
		self.rules.iter().map(|r| r.name.as_str()).collect()
	}

	/// Iterate over the rules
	pub fn iter(&self) -> impl Iterator<Item = &ValidatorRule> {
		self.rules.iter()
	}

	pub fn len(&self) -> usize {
		self.rules.len()
	}

	pub fn is_empty(&self) -> bool {
		self.rules.is_empty()
	}

	/// Whether any rule rejects empty values
	pub fn is_required(&self) -> bool {
		self.rules.iter().any(ValidatorRule::is_required)
	}

	/// Run every rule and collect the failures
	pub fn validate(&self, value: &ControlValue) -> Vec<ValidationError> {
		self.rules
			.iter()
			.filter_map(|rule| rule.validate(value).err())
			.collect()
	}
}

impl FromIterator<ValidatorRule> for ValidatorSet {
	fn from_iter<I: IntoIterator<Item = ValidatorRule>>(iter: I) -> Self {
		let mut set = Self::new();
		set.extend(iter);
		set
	}
}

impl Extend<ValidatorRule> for ValidatorSet {
	fn extend<I: IntoIterator<Item = ValidatorRule>>(&mut self, iter: I) {
		for rule in iter {
			self.insert(rule);
		}
	}
}

impl<'a> IntoIterator for &'a ValidatorSet {
	type Item = &'a ValidatorRule;
	type IntoIter = std::slice::Iter<'a, ValidatorRule>;

	fn into_iter(self) -> Self::IntoIter {
		self.rules.iter()
	}
}

impl fmt::Display for ValidatorSet {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{{{}}}", self.names().join(", "))
	}
}

/// Server-declared validation groups and the rules they activate
#[derive(Debug, Clone, Default)]
pub struct ValidationGroupRegistry {
	groups: HashMap<String, Vec<ValidatorRule>>,
}

impl ValidationGroupRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Declare a group; re-registering a name replaces its rules
	pub fn register<I>(&mut self, group: impl Into<String>, rules: I)
	where
		I: IntoIterator<Item = ValidatorRule>,
	{
		self.groups
			.insert(group.into(), rules.into_iter().collect());
	}

	/// Builder form of [`register`](Self::register)
	pub fn with_group<I>(mut self, group: impl Into<String>, rules: I) -> Self
	where
		I: IntoIterator<Item = ValidatorRule>,
	{
		self.register(group, rules);
		self
	}

	/// Rules declared for `group`
	pub fn resolve(&self, group: &str) -> Option<&[ValidatorRule]> {
		self.groups.get(group).map(Vec::as_slice)
	}

	pub fn contains(&self, group: &str) -> bool {
		self.groups.contains_key(group)
	}
}

/// Interpret a JSON value as a number, accepting numeric strings
pub(crate) fn json_as_f64(value: &Value) -> Option<f64> {
	match value {
		Value::Number(n) => n.as_f64(),
		Value::String(s) => s.trim().parse().ok(),
		_ => None,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;

	fn value(v: Value) -> ControlValue {
		ControlValue::from(v)
	}

	#[rstest]
	#[case(json!(null), false)]
	#[case(json!(""), false)]
	#[case(json!([]), false)]
	#[case(json!("x"), true)]
	#[case(json!(0), true)]
	fn test_required_rule(#[case] input: Value, #[case] valid: bool) {
		assert_eq!(ValidatorRule::required().validate(&value(input)).is_ok(), valid);
	}

	#[rstest]
	#[case(json!(100), true)]
	#[case(json!(101), false)]
	#[case(json!("150"), false)]
	#[case(json!(null), true)]
	fn test_max_rule(#[case] input: Value, #[case] valid: bool) {
		let rule = ValidatorRule::max(100.0).named("max100");
		assert_eq!(rule.validate(&value(input)).is_ok(), valid);
	}

	#[rstest]
	fn test_pattern_rule_matches_whole_value() {
		// Arrange
		let rule = ValidatorRule::pattern(r"\d{3}").unwrap();

		// Act & Assert
		assert!(rule.validate(&value(json!("123"))).is_ok());
		assert!(rule.validate(&value(json!("1234"))).is_err());
	}

	#[rstest]
	fn test_invalid_pattern_is_rejected() {
		assert!(matches!(
			ValidatorRule::pattern("("),
			Err(RuleError::InvalidPattern(_))
		));
	}

	#[rstest]
	fn test_length_rules_count_characters() {
		// Arrange
		let min = ValidatorRule::min_length(3);
		let max = ValidatorRule::max_length(4);

		// Act & Assert
		assert!(min.validate(&value(json!("ab"))).is_err());
		assert!(min.validate(&value(json!("äöü"))).is_ok());
		assert!(max.validate(&value(json!("abcde"))).is_err());
	}

	#[rstest]
	fn test_email_rule() {
		let rule = ValidatorRule::email();
		assert!(rule.validate(&value(json!("a@example.com"))).is_ok());
		assert!(rule.validate(&value(json!("invalid"))).is_err());
	}

	#[rstest]
	fn test_custom_message_is_reported() {
		// Arrange
		let rule = ValidatorRule::required().with_message("Quantity is mandatory");

		// Act
		let err = rule.validate(&ControlValue::Null).unwrap_err();

		// Assert
		assert_eq!(err.rule, "required");
		assert_eq!(err.message, "Quantity is mandatory");
	}

	#[rstest]
	fn test_set_insert_replaces_same_name() {
		// Arrange
		let mut set = ValidatorSet::new();
		set.insert(ValidatorRule::max(10.0));

		// Act
		set.insert(ValidatorRule::max(20.0));

		// Assert
		assert_eq!(set.len(), 1);
		assert_eq!(set.get("max").unwrap().kind(), &RuleKind::Max(20.0));
	}

	#[rstest]
	fn test_empty_set_accepts_everything() {
		let set = ValidatorSet::new();
		assert!(set.validate(&ControlValue::Null).is_empty());
		assert!(!set.is_required());
	}

	#[rstest]
	fn test_set_collects_all_failures() {
		// Arrange
		let set: ValidatorSet = [ValidatorRule::min_length(5), ValidatorRule::pattern("[a-z]+").unwrap()]
			.into_iter()
			.collect();

		// Act
		let errors = set.validate(&value(json!("AB")));

		// Assert
		let rules: Vec<_> = errors.iter().map(|e| e.rule.as_str()).collect();
		assert_eq!(rules, vec!["minLength", "pattern"]);
	}

	#[rstest]
	fn test_display_lists_names() {
		let set: ValidatorSet = [ValidatorRule::required(), ValidatorRule::max(1.0).named("max1")]
			.into_iter()
			.collect();
		assert_eq!(set.to_string(), "{required, max1}");
	}

	#[rstest]
	fn test_registry_resolve() {
		// Arrange
		let registry = ValidationGroupRegistry::new()
			.with_group("max100", [ValidatorRule::max(100.0).named("max100")]);

		// Act
		let rules = registry.resolve("max100").unwrap();

		// Assert
		assert_eq!(rules.len(), 1);
		assert!(registry.resolve("unknown").is_none());
	}
}
