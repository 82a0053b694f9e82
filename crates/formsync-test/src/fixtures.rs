//! rstest fixtures
//!
//! ```
//! use formsync_test::fixtures::{harness, qty_element};
//! use formsync_forms::BindingState;
//!
//! let harness = harness();
//! let (binding, _control) = harness.bind(qty_element()).unwrap();
//! assert_eq!(binding.state(), BindingState::Bound);
//! ```

use crate::recording::{RecordingTransport, StaticContentLookup};
use formsync_core::element::{Constraint, Element};
use formsync_core::settings::SyncSettings;
use formsync_core::validators::{ValidationGroupRegistry, ValidatorRule};
use formsync_forms::collaborators::{ConstraintValidationUtils, LabelContent};
use formsync_forms::{BindingServices, ControlBinding, ControlHandle, FormContext, SyncResult};
use formsync_signals::EventBus;
use rstest::fixture;
use std::sync::Arc;

/// Fresh event bus
#[fixture]
pub fn event_bus() -> EventBus {
	EventBus::new()
}

/// Registry declaring the `required` and `max100` groups
#[fixture]
pub fn group_registry() -> ValidationGroupRegistry {
	ValidationGroupRegistry::new()
		.with_group("required", [ValidatorRule::required()])
		.with_group("max100", [ValidatorRule::max(100.0).named("max100")])
}

/// `/order/qty` element with a static `min` constraint
#[fixture]
pub fn qty_element() -> Element {
	Element::new("/order/qty", "qty").with_constraint(Constraint::min(1.0))
}

/// Everything needed to bind controls against recording collaborators
pub struct SyncHarness {
	pub bus: EventBus,
	pub form: Arc<FormContext>,
	pub transport: Arc<RecordingTransport>,
	pub services: BindingServices,
}

impl SyncHarness {
	pub fn new(settings: SyncSettings) -> SyncResult<Self> {
		Self::with_transport(settings, RecordingTransport::new())
	}

	pub fn with_transport(settings: SyncSettings, transport: RecordingTransport) -> SyncResult<Self> {
		let bus = EventBus::new();
		let transport = Arc::new(transport);
		let content = StaticContentLookup::new()
			.with_label("qty", LabelContent::new("Quantity").with_help_text("Units to order"));
		let services = BindingServices::new(
			bus.clone(),
			Arc::new(content),
			Arc::new(ConstraintValidationUtils::new(group_registry())),
			transport.clone(),
		)
		.with_settings(settings)?;

		Ok(Self {
			bus,
			form: Arc::new(FormContext::new().with_coercions(services.coercions.clone())),
			transport,
			services,
		})
	}

	/// Add a control for `element` to the form and bind it
	pub fn bind(&self, element: Element) -> SyncResult<(ControlBinding, ControlHandle)> {
		let control = self.form.add_element(&element)?;
		let binding = ControlBinding::bind(element, self.services.clone(), Some(self.form.clone()))?;
		Ok((binding, control))
	}

	/// Bind `element` without a form context
	pub fn bind_degraded(&self, element: Element) -> SyncResult<ControlBinding> {
		ControlBinding::bind(element, self.services.clone(), None)
	}
}

/// Harness with default settings
#[fixture]
pub fn harness() -> SyncHarness {
	SyncHarness::new(SyncSettings::default()).expect("default settings are valid")
}
