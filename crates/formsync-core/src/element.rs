//! Declarative form elements
//!
//! An [`Element`] (a "param" on the server side) is a leaf node of the
//! server-defined form configuration. It is addressed by a hierarchical
//! `path`, which is unique within one form render, and carries a stable
//! `code` used to look up the control bound to it.
//!
//! The wire representation uses camelCase keys so that the model can be
//! deserialized directly from the page payload:
//!
//! ```
//! use formsync_core::element::Element;
//!
//! let element: Element = serde_json::from_value(serde_json::json!({
//!     "path": "/order/qty",
//!     "enabled": true,
//!     "leafState": 5,
//!     "config": {
//!         "code": "qty",
//!         "uiStyles": { "attributes": { "postEventOnChange": true } }
//!     }
//! }))
//! .unwrap();
//!
//! assert_eq!(element.code(), "qty");
//! assert!(element.attributes().post_event_on_change);
//! ```

use crate::validators::{RuleError, ValidatorRule};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Leaf node of the declarative form configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
	/// Hierarchical identifier, unique within a form instance
	pub path: String,

	/// Current value; `None` is the explicit "cleared" state
	#[serde(default)]
	pub leaf_state: Option<Value>,

	/// Whether the user may interact with the control
	#[serde(default = "default_enabled")]
	pub enabled: bool,

	/// Validation groups activated by the server for this element
	#[serde(default)]
	pub active_validation_groups: Vec<String>,

	/// Static configuration
	pub config: ElementConfig,
}

fn default_enabled() -> bool {
	true
}

impl Element {
	/// Create an enabled element with an empty leaf state
	///
	/// # Examples
	///
	/// ```
	/// use formsync_core::element::Element;
	///
	/// let element = Element::new("/order/qty", "qty");
	/// assert_eq!(element.path, "/order/qty");
	/// assert!(element.enabled);
	/// assert!(element.leaf_state.is_none());
	/// ```
	pub fn new(path: impl Into<String>, code: impl Into<String>) -> Self {
		Self {
			path: path.into(),
			leaf_state: None,
			enabled: true,
			active_validation_groups: Vec::new(),
			config: ElementConfig::new(code),
		}
	}

	/// Set the initial leaf state
	pub fn with_leaf_state(mut self, value: Value) -> Self {
		self.leaf_state = if value.is_null() { None } else { Some(value) };
		self
	}

	/// Set the enabled flag
	pub fn with_enabled(mut self, enabled: bool) -> Self {
		self.enabled = enabled;
		self
	}

	/// Set the active validation groups
	pub fn with_active_validation_groups<I, S>(mut self, groups: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.active_validation_groups = groups.into_iter().map(Into::into).collect();
		self
	}

	/// Replace the UI attributes
	pub fn with_attributes(mut self, attributes: UiAttributes) -> Self {
		self.config.ui_styles.attributes = attributes;
		self
	}

	/// Append a validation constraint
	pub fn with_constraint(mut self, constraint: Constraint) -> Self {
		self.config
			.validation
			.get_or_insert_with(ValidationConfig::default)
			.constraints
			.push(constraint);
		self
	}

	/// Stable code of the control bound to this element
	pub fn code(&self) -> &str {
		&self.config.code
	}

	/// UI attributes of this element
	pub fn attributes(&self) -> &UiAttributes {
		&self.config.ui_styles.attributes
	}

	/// Declared constraints, empty when the element has no validation block
	pub fn constraints(&self) -> &[Constraint] {
		self.config
			.validation
			.as_ref()
			.map(|v| v.constraints.as_slice())
			.unwrap_or(&[])
	}

	/// Constraints that apply regardless of the active validation groups
	pub fn static_constraints(&self) -> impl Iterator<Item = &Constraint> {
		self.constraints().iter().filter(|c| c.is_static())
	}

	/// Constraints declared for the given validation group
	pub fn group_constraints<'a>(&'a self, group: &'a str) -> impl Iterator<Item = &'a Constraint> {
		self.constraints().iter().filter(move |c| c.in_group(group))
	}
}

/// Static configuration of an element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementConfig {
	/// Key of the control in its form context
	pub code: String,

	/// Display attributes
	#[serde(default)]
	pub ui_styles: UiStyles,

	/// Declared validation constraints
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub validation: Option<ValidationConfig>,
}

impl ElementConfig {
	/// Create a configuration with default attributes and no constraints
	pub fn new(code: impl Into<String>) -> Self {
		Self {
			code: code.into(),
			ui_styles: UiStyles::default(),
			validation: None,
		}
	}
}

/// Wrapper matching the `uiStyles` block of the form config
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UiStyles {
	#[serde(default)]
	pub attributes: UiAttributes,
}

/// Declarative UI attributes of an element
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiAttributes {
	/// Whether the control is hidden
	#[serde(default)]
	pub hidden: bool,

	/// Inline help text
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub help: Option<String>,

	/// Whether the control is read-only
	#[serde(default)]
	pub read_only: bool,

	/// Input type hint (`text`, `number`, ...)
	#[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
	pub control_type: Option<String>,

	/// Post a state change to the server on every local change
	#[serde(default)]
	pub post_event_on_change: bool,

	/// Post the new value to this URL on every local change
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub post_button_url: Option<String>,

	/// Control type discriminator, e.g. `Calendar`
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub alias: Option<String>,
}

impl UiAttributes {
	/// Attributes with the given type discriminator
	pub fn with_alias(alias: impl Into<String>) -> Self {
		Self {
			alias: Some(alias.into()),
			..Self::default()
		}
	}
}

/// `validation` block of the form config
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationConfig {
	#[serde(default)]
	pub constraints: Vec<Constraint>,
}

/// Names of the constraints the server may declare on an element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConstraintName {
	NotNull,
	NotBlank,
	NotEmpty,
	Size,
	Min,
	Max,
	Pattern,
	Email,
}

/// Attributes of a declared constraint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConstraintAttributes {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub min: Option<f64>,

	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub max: Option<f64>,

	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub regexp: Option<String>,

	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub message: Option<String>,

	/// Validation groups this constraint belongs to; empty means static
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub groups: Vec<String>,
}

/// A validation constraint declared on an element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
	pub name: ConstraintName,

	#[serde(default, rename = "attribute")]
	pub attributes: ConstraintAttributes,
}

impl Constraint {
	/// Create a constraint without attributes
	pub fn new(name: ConstraintName) -> Self {
		Self {
			name,
			attributes: ConstraintAttributes::default(),
		}
	}

	/// `NotNull` constraint
	pub fn not_null() -> Self {
		Self::new(ConstraintName::NotNull)
	}

	/// `Size` constraint bounding the length of the value
	pub fn size(min: Option<usize>, max: Option<usize>) -> Self {
		let mut constraint = Self::new(ConstraintName::Size);
		constraint.attributes.min = min.map(|v| v as f64);
		constraint.attributes.max = max.map(|v| v as f64);
		constraint
	}

	/// `Min` constraint on a numeric value
	pub fn min(min: f64) -> Self {
		let mut constraint = Self::new(ConstraintName::Min);
		constraint.attributes.min = Some(min);
		constraint
	}

	/// `Max` constraint on a numeric value
	pub fn max(max: f64) -> Self {
		let mut constraint = Self::new(ConstraintName::Max);
		constraint.attributes.max = Some(max);
		constraint
	}

	/// `Pattern` constraint
	pub fn pattern(regexp: impl Into<String>) -> Self {
		let mut constraint = Self::new(ConstraintName::Pattern);
		constraint.attributes.regexp = Some(regexp.into());
		constraint
	}

	/// Restrict this constraint to the given validation groups
	pub fn in_groups<I, S>(mut self, groups: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.attributes.groups = groups.into_iter().map(Into::into).collect();
		self
	}

	/// Whether the constraint applies without any active group
	pub fn is_static(&self) -> bool {
		self.attributes.groups.is_empty()
	}

	/// Whether the constraint belongs to `group`
	pub fn in_group(&self, group: &str) -> bool {
		self.attributes.groups.iter().any(|g| g == group)
	}

	/// Whether the constraint makes the value mandatory
	pub fn is_required(&self) -> bool {
		matches!(
			self.name,
			ConstraintName::NotNull | ConstraintName::NotBlank | ConstraintName::NotEmpty
		)
	}

	/// Translate the constraint into concrete validator rules
	///
	/// A `Size` constraint yields one rule per declared bound; every other
	/// constraint yields exactly one rule.
	pub fn to_rules(&self) -> Result<Vec<ValidatorRule>, RuleError> {
		let attrs = &self.attributes;
		let mut rules = match self.name {
			ConstraintName::NotNull | ConstraintName::NotBlank | ConstraintName::NotEmpty => {
				vec![ValidatorRule::required()]
			}
			ConstraintName::Size => {
				let mut rules = Vec::new();
				if let Some(min) = attrs.min {
					rules.push(ValidatorRule::min_length(min as usize));
				}
				if let Some(max) = attrs.max {
					rules.push(ValidatorRule::max_length(max as usize));
				}
				rules
			}
			ConstraintName::Min => vec![ValidatorRule::min(
				attrs.min.ok_or(RuleError::MissingAttribute("min"))?,
			)],
			ConstraintName::Max => vec![ValidatorRule::max(
				attrs.max.ok_or(RuleError::MissingAttribute("max"))?,
			)],
			ConstraintName::Pattern => vec![ValidatorRule::pattern(
				attrs
					.regexp
					.as_deref()
					.ok_or(RuleError::MissingAttribute("regexp"))?,
			)?],
			ConstraintName::Email => vec![ValidatorRule::email()],
		};

		if let Some(message) = &attrs.message {
			rules = rules
				.into_iter()
				.map(|rule| rule.with_message(message.clone()))
				.collect();
		}

		Ok(rules)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;

	#[rstest]
	fn test_element_deserializes_wire_shape() {
		// Arrange
		let payload = json!({
			"path": "/order/date",
			"leafState": null,
			"activeValidationGroups": ["g1"],
			"config": {
				"code": "date",
				"uiStyles": {
					"attributes": {
						"alias": "Calendar",
						"type": "date",
						"readOnly": true,
						"postButtonUrl": "/p/order/_update"
					}
				},
				"validation": {
					"constraints": [
						{ "name": "NotNull" },
						{ "name": "Max", "attribute": { "max": 10.0, "groups": ["g1"] } }
					]
				}
			}
		});

		// Act
		let element: Element = serde_json::from_value(payload).unwrap();

		// Assert
		assert_eq!(element.code(), "date");
		assert!(element.enabled);
		assert!(element.leaf_state.is_none());
		assert_eq!(element.active_validation_groups, vec!["g1".to_string()]);
		assert_eq!(element.attributes().alias.as_deref(), Some("Calendar"));
		assert_eq!(element.attributes().control_type.as_deref(), Some("date"));
		assert!(element.attributes().read_only);
		assert_eq!(element.static_constraints().count(), 1);
		assert_eq!(element.group_constraints("g1").count(), 1);
	}

	#[rstest]
	fn test_with_leaf_state_null_clears() {
		// Arrange
		let element = Element::new("/a", "a").with_leaf_state(json!(3));

		// Act
		let cleared = element.with_leaf_state(Value::Null);

		// Assert
		assert!(cleared.leaf_state.is_none());
	}

	#[rstest]
	fn test_size_constraint_yields_both_bounds() {
		// Arrange
		let constraint = Constraint::size(Some(2), Some(8));

		// Act
		let rules = constraint.to_rules().unwrap();

		// Assert
		let names: Vec<_> = rules.iter().map(|r| r.name()).collect();
		assert_eq!(names, vec!["minLength", "maxLength"]);
	}

	#[rstest]
	fn test_max_constraint_without_bound_is_rejected() {
		// Arrange
		let constraint = Constraint::new(ConstraintName::Max);

		// Act
		let result = constraint.to_rules();

		// Assert
		assert!(matches!(result, Err(RuleError::MissingAttribute("max"))));
	}

	#[rstest]
	#[case(Constraint::not_null(), true)]
	#[case(Constraint::new(ConstraintName::NotBlank), true)]
	#[case(Constraint::max(3.0), false)]
	fn test_constraint_is_required(#[case] constraint: Constraint, #[case] expected: bool) {
		assert_eq!(constraint.is_required(), expected);
	}
}
