//! External collaborators of a bound control
//!
//! The binding layer never renders, looks up content or talks to a server
//! itself. Those concerns sit behind the traits in this module and are
//! injected through [`BindingServices`](crate::binding::BindingServices).

use crate::control::ControlHandle;
use formsync_core::element::Element;
use formsync_core::error::CollaboratorResult;
use formsync_core::event::ValidationUpdate;
use formsync_core::validators::{ValidationGroupRegistry, ValidatorSet};
use serde_json::Value;

/// Label and help text of an element
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelContent {
	pub text: String,
	pub help_text: Option<String>,
}

impl LabelContent {
	pub fn new(text: impl Into<String>) -> Self {
		Self {
			text: text.into(),
			help_text: None,
		}
	}

	pub fn with_help_text(mut self, help_text: impl Into<String>) -> Self {
		self.help_text = Some(help_text.into());
		self
	}
}

/// Looks up display content for elements
#[cfg_attr(test, mockall::automock)]
pub trait ContentLookup: Send + Sync {
	fn find_label(&self, element: &Element) -> CollaboratorResult<LabelContent>;
}

/// Turns declared constraints and validation groups into validator sets
#[cfg_attr(test, mockall::automock)]
pub trait ValidationUtils: Send + Sync {
	/// Whether the element's static constraints make it required
	fn apply_element_style(&self, element: &Element) -> CollaboratorResult<bool>;

	/// Replace the control's validators with the rules of `groups`
	///
	/// Returns whether the new set makes the control required.
	fn rebind_validations(
		&self,
		control: &ControlHandle,
		groups: &[String],
		element: &Element,
	) -> CollaboratorResult<bool>;

	/// Validator set built from the element's static constraints
	fn build_static_validations(&self, element: &Element) -> CollaboratorResult<ValidatorSet>;

	/// Reconcile the control's errors and validity after a validation update
	///
	/// Runs after the update's validators and enabled flag are applied.
	fn assess_control_validation(
		&self,
		event: &ValidationUpdate,
		control: &ControlHandle,
	) -> CollaboratorResult<()>;
}

/// Fire-and-forget server calls
#[cfg_attr(test, mockall::automock)]
pub trait Transport: Send + Sync {
	/// Notify the server that the state at `path` changed
	fn post_state_change(&self, path: &str, kind: &str, payload: &str) -> CollaboratorResult<()>;

	/// Post `payload` to an action URL
	fn post_action(
		&self,
		url: &str,
		headers: Option<http::HeaderMap>,
		payload: &Value,
		method: http::Method,
	) -> CollaboratorResult<()>;
}

/// [`ValidationUtils`] backed by element constraints and a group registry
///
/// Groups are resolved from the registry first, then from the element's
/// constraints tagged with the group. Groups found in neither are skipped.
#[derive(Debug, Clone, Default)]
pub struct ConstraintValidationUtils {
	registry: ValidationGroupRegistry,
}

impl ConstraintValidationUtils {
	pub fn new(registry: ValidationGroupRegistry) -> Self {
		Self { registry }
	}

	pub fn registry(&self) -> &ValidationGroupRegistry {
		&self.registry
	}

	/// Rules of `groups`, in group order
	pub fn resolve_groups(&self, groups: &[String], element: &Element) -> CollaboratorResult<ValidatorSet> {
		let mut validators = ValidatorSet::new();

		for group in groups {
			if let Some(rules) = self.registry.resolve(group) {
				validators.extend(rules.iter().cloned());
				continue;
			}

			let mut declared = element.group_constraints(group).peekable();
			if declared.peek().is_none() {
				tracing::warn!(
					path = %element.path,
					group = %group,
					"Unknown validation group, skipping"
				);
				continue;
			}
			for constraint in declared {
				validators.extend(constraint.to_rules()?);
			}
		}

		Ok(validators)
	}
}

impl ValidationUtils for ConstraintValidationUtils {
	fn apply_element_style(&self, element: &Element) -> CollaboratorResult<bool> {
		Ok(element.static_constraints().any(|c| c.is_required()))
	}

	fn rebind_validations(
		&self,
		control: &ControlHandle,
		groups: &[String],
		element: &Element,
	) -> CollaboratorResult<bool> {
		let validators = self.resolve_groups(groups, element)?;
		let required = validators.is_required();
		control.set_validators(validators);
		Ok(required)
	}

	fn build_static_validations(&self, element: &Element) -> CollaboratorResult<ValidatorSet> {
		let mut validators = ValidatorSet::new();
		for constraint in element.static_constraints() {
			validators.extend(constraint.to_rules()?);
		}
		Ok(validators)
	}

	fn assess_control_validation(
		&self,
		_event: &ValidationUpdate,
		control: &ControlHandle,
	) -> CollaboratorResult<()> {
		control.validate();
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::control::ControlStatus;
	use formsync_core::element::Constraint;
	use formsync_core::validators::ValidatorRule;
	use rstest::{fixture, rstest};
	use serde_json::json;

	#[fixture]
	fn utils() -> ConstraintValidationUtils {
		ConstraintValidationUtils::new(
			ValidationGroupRegistry::new()
				.with_group("required", [ValidatorRule::required()])
				.with_group("max100", [ValidatorRule::max(100.0).named("max100")]),
		)
	}

	#[fixture]
	fn element() -> Element {
		Element::new("/order/qty", "qty")
			.with_constraint(Constraint::max(1000.0))
			.with_constraint(Constraint::size(None, Some(3)).in_groups(["short"]))
	}

	#[rstest]
	fn test_rebind_replaces_with_group_rules(utils: ConstraintValidationUtils, element: Element) {
		// Arrange
		let control = ControlHandle::new(json!(150));
		control.set_validators(utils.build_static_validations(&element).unwrap());
		let groups = vec!["required".to_string(), "max100".to_string()];

		// Act
		let required = utils.rebind_validations(&control, &groups, &element).unwrap();

		// Assert
		assert!(required);
		assert_eq!(control.validators().names(), vec!["required", "max100"]);
	}

	#[rstest]
	fn test_group_falls_back_to_element_constraints(utils: ConstraintValidationUtils, element: Element) {
		// Act
		let validators = utils
			.resolve_groups(&["short".to_string()], &element)
			.unwrap();

		// Assert
		assert_eq!(validators.names(), vec!["maxLength"]);
	}

	#[rstest]
	fn test_unknown_group_is_skipped(utils: ConstraintValidationUtils, element: Element) {
		// Act
		let validators = utils
			.resolve_groups(&["nope".to_string(), "required".to_string()], &element)
			.unwrap();

		// Assert
		assert_eq!(validators.names(), vec!["required"]);
	}

	#[rstest]
	fn test_static_validations_ignore_grouped_constraints(utils: ConstraintValidationUtils, element: Element) {
		// Act
		let validators = utils.build_static_validations(&element).unwrap();

		// Assert
		assert_eq!(validators.names(), vec!["max"]);
		assert!(!utils.apply_element_style(&element).unwrap());
	}

	#[rstest]
	fn test_apply_element_style_detects_required(utils: ConstraintValidationUtils) {
		let element = Element::new("/a", "a").with_constraint(Constraint::not_null());
		assert!(utils.apply_element_style(&element).unwrap());
	}

	#[rstest]
	#[case(false, ControlStatus::Invalid)]
	#[case(true, ControlStatus::Disabled)]
	fn test_assess_revalidates_without_touching_enablement(
		utils: ConstraintValidationUtils,
		#[case] disabled: bool,
		#[case] expected: ControlStatus,
	) {
		// Arrange
		let control = ControlHandle::default();
		control.set_validators([ValidatorRule::required()].into_iter().collect());
		if disabled {
			control.disable();
		}
		let event = ValidationUpdate::new("/a", "a", disabled);

		// Act
		utils.assess_control_validation(&event, &control).unwrap();

		// Assert
		assert_eq!(control.is_disabled(), disabled);
		assert_eq!(control.status(), expected);
	}

	#[rstest]
	fn test_invalid_pattern_is_reported() {
		// Arrange
		let utils = ConstraintValidationUtils::default();
		let element = Element::new("/a", "a").with_constraint(Constraint::pattern("("));

		// Act
		let result = utils.build_static_validations(&element);

		// Assert
		assert!(matches!(
			result,
			Err(formsync_core::error::CollaboratorError::InvalidConstraint(_))
		));
	}
}
