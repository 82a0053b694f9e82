//! Effective validator set computation
//!
//! The rebinder decides between two policies:
//!
//! - dynamic: non-empty active validation groups are resolved through the
//!   validation collaborator and replace the control's validators outright
//! - static: otherwise the validators and the required flag are recomputed
//!   from the element's static constraints alone, discarding any
//!   previously applied groups
//!
//! The same policy is used on initial render (with the element's own groups)
//! and for every validation update routed to the binding. A validation update
//! also applies its `enabled` flag to the control before the validation
//! collaborator assesses it.
//!
//! When group resolution fails and the failure is swallowed, the control is
//! left with an empty validator set rather than its previous one.

use crate::collaborators::ValidationUtils;
use crate::control::ControlHandle;
use crate::error::{SyncResult, settle};
use formsync_core::element::Element;
use formsync_core::event::ValidationUpdate;
use formsync_core::settings::CollaboratorFailurePolicy;
use formsync_core::validators::ValidatorSet;
use std::sync::Arc;

/// Result of a rebind
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RebindOutcome {
	/// Whether the effective set makes the control required
	pub required: bool,
	/// The effective validator set
	pub validators: ValidatorSet,
	/// Whether the dynamic policy was used
	pub dynamic: bool,
}

/// Computes and applies effective validator sets
#[derive(Clone)]
pub struct ValidationRebinder {
	validation: Arc<dyn ValidationUtils>,
	policy: CollaboratorFailurePolicy,
}

impl ValidationRebinder {
	pub fn new(validation: Arc<dyn ValidationUtils>, policy: CollaboratorFailurePolicy) -> Self {
		Self { validation, policy }
	}

	/// Initial-render computation
	///
	/// The dynamic policy needs a control to rebind; without one the static
	/// policy is used even if the element carries groups.
	pub fn initial(&self, element: &Element, control: Option<&ControlHandle>) -> SyncResult<RebindOutcome> {
		let outcome = match control {
			Some(control) if !element.active_validation_groups.is_empty() => {
				self.rebind_dynamic(control, &element.active_validation_groups, element)?
			}
			_ => self.rebind_static(element, control)?,
		};

		if let Some(control) = control {
			control.validate();
		}
		Ok(outcome)
	}

	/// Apply a validation update to a resolved control
	pub fn apply(
		&self,
		event: &ValidationUpdate,
		element: &Element,
		control: &ControlHandle,
	) -> SyncResult<RebindOutcome> {
		let outcome = match event.dynamic_groups() {
			Some(groups) => self.rebind_dynamic(control, groups, element)?,
			None => self.rebind_static(element, Some(control))?,
		};

		if event.enabled {
			control.enable();
		} else {
			control.disable();
		}

		settle(
			self.policy,
			"assess_control_validation",
			self.validation.assess_control_validation(event, control),
		)?;

		tracing::debug!(
			path = %event.path,
			code = %event.code,
			dynamic = outcome.dynamic,
			required = outcome.required,
			validators = %outcome.validators,
			"Applied validation update"
		);
		Ok(outcome)
	}

	fn rebind_dynamic(
		&self,
		control: &ControlHandle,
		groups: &[String],
		element: &Element,
	) -> SyncResult<RebindOutcome> {
		let required = match self.validation.rebind_validations(control, groups, element) {
			Ok(required) => required,
			Err(err) => {
				settle(self.policy, "rebind_validations", Err::<bool, _>(err))?;
				// Dynamic groups replace the static set even when they cannot be resolved
				control.set_validators(ValidatorSet::new());
				false
			}
		};

		Ok(RebindOutcome {
			required,
			validators: control.validators(),
			dynamic: true,
		})
	}

	fn rebind_static(&self, element: &Element, control: Option<&ControlHandle>) -> SyncResult<RebindOutcome> {
		let required = settle(
			self.policy,
			"apply_element_style",
			self.validation.apply_element_style(element),
		)?;
		let validators = settle(
			self.policy,
			"build_static_validations",
			self.validation.build_static_validations(element),
		)?;

		if let Some(control) = control {
			control.set_validators(validators.clone());
		}

		Ok(RebindOutcome {
			required,
			validators,
			dynamic: false,
		})
	}
}
