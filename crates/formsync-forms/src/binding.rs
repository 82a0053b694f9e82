//! Per-control lifecycle management
//!
//! A [`ControlBinding`] owns one element, the control bound to it and every
//! subscription made on its behalf. Its lifecycle:
//!
//! ```text
//! Uninitialized --attach--> Initializing --+--> Bound    --detach--> Unbound
//!                                          +--> Degraded --detach--> Unbound
//! ```
//!
//! `Bound` requires a form context in which a control resolves for the
//! element's code. Without one the binding is `Degraded`: display metadata
//! and static validators are computed, but nothing is subscribed. A failure
//! during initialization leaves the binding `Unbound` with everything
//! released.
//!
//! Event handlers capture a weak reference to the binding's shared state;
//! they never keep a dropped binding alive.

use crate::collaborators::{ContentLookup, LabelContent, Transport, ValidationUtils};
use crate::control::ControlHandle;
use crate::error::{SyncError, SyncResult, settle};
use crate::form::FormContext;
use crate::propagator::{ChangePropagator, SideEffect};
use crate::rebinder::ValidationRebinder;
use crate::resolver::Registration;
use formsync_core::coercion::CoercionRegistry;
use formsync_core::element::Element;
use formsync_core::event::{Event, EventKind, StateUpdate, ValidationUpdate};
use formsync_core::settings::SyncSettings;
use formsync_core::validators::ValidatorSet;
use formsync_core::value::ControlValue;
use formsync_signals::{BoxError, EventBus, Subscription};
use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::sync::{Arc, Weak};

/// Lifecycle state of a [`ControlBinding`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingState {
	Uninitialized,
	Initializing,
	Bound,
	Degraded,
	Unbound,
}

impl BindingState {
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Uninitialized => "uninitialized",
			Self::Initializing => "initializing",
			Self::Bound => "bound",
			Self::Degraded => "degraded",
			Self::Unbound => "unbound",
		}
	}

	/// Whether the binding is attached (bound or degraded)
	pub fn is_attached(&self) -> bool {
		matches!(self, Self::Bound | Self::Degraded)
	}
}

impl fmt::Display for BindingState {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Session-scoped services shared by every binding
#[derive(Clone)]
pub struct BindingServices {
	pub bus: EventBus,
	pub content: Arc<dyn ContentLookup>,
	pub validation: Arc<dyn ValidationUtils>,
	pub transport: Arc<dyn Transport>,
	pub coercions: Arc<CoercionRegistry>,
	pub settings: Arc<SyncSettings>,
}

impl BindingServices {
	/// Services with default settings
	pub fn new(
		bus: EventBus,
		content: Arc<dyn ContentLookup>,
		validation: Arc<dyn ValidationUtils>,
		transport: Arc<dyn Transport>,
	) -> Self {
		let settings = SyncSettings::default();
		Self {
			bus,
			content,
			validation,
			transport,
			coercions: Arc::new(settings.coercion.registry()),
			settings: Arc::new(settings),
		}
	}

	/// Replace the settings, rebuilding the coercion registry from them
	pub fn with_settings(mut self, settings: SyncSettings) -> SyncResult<Self> {
		settings.validate()?;
		self.coercions = Arc::new(settings.coercion.registry());
		self.settings = Arc::new(settings);
		Ok(self)
	}

	/// Replace the coercion registry
	pub fn with_coercions(mut self, coercions: CoercionRegistry) -> Self {
		self.coercions = Arc::new(coercions);
		self
	}
}

impl fmt::Debug for BindingServices {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("BindingServices")
			.field("bus", &self.bus)
			.field("coercions", &self.coercions)
			.field("settings", &self.settings)
			.finish_non_exhaustive()
	}
}

/// Display metadata of a bound control
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayState {
	pub label: String,
	pub help_text: Option<String>,
	pub show_label: bool,
	pub disabled: bool,
	pub required: bool,
}

impl Default for DisplayState {
	fn default() -> Self {
		Self {
			label: String::new(),
			help_text: None,
			show_label: true,
			disabled: false,
			required: false,
		}
	}
}

impl DisplayState {
	/// Whether the required marker is shown
	pub fn required_css(&self) -> bool {
		self.required && !self.disabled
	}
}

/// Value slot of an in-place editor wrapping a control
///
/// Receives every local change of the control it is attached to.
#[derive(Debug, Clone, Default)]
pub struct InPlaceEditContext {
	value: Arc<RwLock<ControlValue>>,
}

impl InPlaceEditContext {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn value(&self) -> ControlValue {
		self.value.read().clone()
	}

	pub fn set_value(&self, value: ControlValue) {
		*self.value.write() = value;
	}
}

struct BindingShared {
	state: RwLock<BindingState>,
	element: RwLock<Element>,
	display: RwLock<DisplayState>,
	validators: RwLock<ValidatorSet>,
	control: RwLock<Option<ControlHandle>>,
	in_place_edit: RwLock<Option<InPlaceEditContext>>,
	form: Option<Arc<FormContext>>,
	services: BindingServices,
	rebinder: ValidationRebinder,
	propagator: ChangePropagator,
}

impl BindingShared {
	fn path(&self) -> String {
		self.element.read().path.clone()
	}

	/// Live control for `(path, code)` at this binding's path
	fn resolve(&self, kind: EventKind, path: &str, code: &str) -> Option<ControlHandle> {
		let own_path = self.path();
		if path != own_path {
			tracing::trace!(kind = %kind, path, own_path = %own_path, "Event for another path");
			return None;
		}

		let resolved = self
			.form
			.as_ref()
			.and_then(|form| form.resolver().resolve(path, code));
		if resolved.is_none() {
			tracing::trace!(kind = %kind, path, code, "No live control, dropping event");
		}
		resolved
	}

	fn on_state_update(&self, update: &StateUpdate) -> SyncResult<()> {
		let Some(control) = self.resolve(EventKind::State, &update.path, &update.code) else {
			return Ok(());
		};

		match &update.leaf_state {
			Some(raw) if !raw.is_null() => {
				let alias = update
					.alias
					.clone()
					.or_else(|| self.element.read().attributes().alias.clone());
				let value = self.services.coercions.coerce(alias.as_deref(), raw)?;
				tracing::debug!(path = %update.path, code = %update.code, value = %value, "Applying state update");
				control.set_value(value)
			}
			_ => {
				tracing::debug!(path = %update.path, code = %update.code, "Resetting control");
				control.reset()
			}
		}
	}

	fn on_validation_update(&self, update: &ValidationUpdate) -> SyncResult<()> {
		let Some(control) = self.resolve(EventKind::Validation, &update.path, &update.code) else {
			return Ok(());
		};

		let element = self.element.read().clone();
		let outcome = self.rebinder.apply(update, &element, &control)?;

		{
			let mut element = self.element.write();
			element.enabled = update.enabled;
			element.active_validation_groups = update.active_validation_groups.clone().unwrap_or_default();
		}
		{
			let mut display = self.display.write();
			display.required = outcome.required;
			display.disabled = !update.enabled;
		}
		*self.validators.write() = outcome.validators;
		Ok(())
	}

	fn on_event(&self, event: &Event) -> SyncResult<()> {
		match event {
			Event::StateUpdate(update) => self.on_state_update(update),
			Event::ValidationUpdate(update) => self.on_validation_update(update),
		}
	}

	fn sync_leaf_state(&self, value: &ControlValue) {
		self.element.write().leaf_state = value.to_leaf_state();
	}

	fn on_local_change(&self, value: &ControlValue) -> SyncResult<Option<SideEffect>> {
		let context = self.in_place_edit.read().clone();
		if let Some(context) = context {
			context.set_value(value.clone());
		}

		let element = self.element.read().clone();
		self.propagator.propagate(&element)
	}
}

/// Run `handler` against the binding if it is still alive
fn with_shared<F>(shared: &Weak<BindingShared>, handler: F) -> Result<(), BoxError>
where
	F: FnOnce(&BindingShared) -> SyncResult<()>,
{
	match shared.upgrade() {
		Some(shared) => handler(&shared).map_err(BoxError::from),
		None => Ok(()),
	}
}

/// Binding between one element and its control
///
/// # Examples
///
/// ```
/// use formsync_core::element::Element;
/// use formsync_core::event::StateUpdate;
/// use formsync_core::validators::ValidationGroupRegistry;
/// use formsync_core::error::CollaboratorResult;
/// use formsync_forms::{
///     BindingServices, BindingState, ConstraintValidationUtils, ContentLookup, ControlBinding,
///     FormContext, LabelContent, Transport,
/// };
/// use formsync_signals::EventBus;
/// use serde_json::{Value, json};
/// use std::sync::Arc;
///
/// struct Labels;
/// impl ContentLookup for Labels {
///     fn find_label(&self, element: &Element) -> CollaboratorResult<LabelContent> {
///         Ok(LabelContent::new(element.code()))
///     }
/// }
///
/// struct Offline;
/// impl Transport for Offline {
///     fn post_state_change(&self, _: &str, _: &str, _: &str) -> CollaboratorResult<()> {
///         Ok(())
///     }
///     fn post_action(
///         &self,
///         _: &str,
///         _: Option<http::HeaderMap>,
///         _: &Value,
///         _: http::Method,
///     ) -> CollaboratorResult<()> {
///         Ok(())
///     }
/// }
///
/// let bus = EventBus::new();
/// let services = BindingServices::new(
///     bus.clone(),
///     Arc::new(Labels),
///     Arc::new(ConstraintValidationUtils::new(ValidationGroupRegistry::new())),
///     Arc::new(Offline),
/// );
/// let form = Arc::new(FormContext::new());
/// let element = Element::new("/order/qty", "qty");
/// let control = form.add_element(&element).unwrap();
///
/// let binding = ControlBinding::bind(element, services, Some(form)).unwrap();
/// assert_eq!(binding.state(), BindingState::Bound);
/// assert_eq!(binding.label(), "qty");
///
/// bus.publish(StateUpdate::new("/order/qty", "qty", Some(json!(10)))).unwrap();
/// assert_eq!(control.value().to_json(), json!(10));
/// ```
pub struct ControlBinding {
	shared: Arc<BindingShared>,
	subscriptions: Mutex<Vec<Subscription>>,
	registration: Mutex<Option<Registration>>,
}

impl ControlBinding {
	/// Create an uninitialized binding
	pub fn new(element: Element, services: BindingServices, form: Option<Arc<FormContext>>) -> SyncResult<Self> {
		let rebinder = ValidationRebinder::new(services.validation.clone(), services.settings.failure_policy);
		let propagator = ChangePropagator::with_settings(services.transport.clone(), &services.settings)?;
		let display = DisplayState {
			disabled: !element.enabled,
			..DisplayState::default()
		};

		Ok(Self {
			shared: Arc::new(BindingShared {
				state: RwLock::new(BindingState::Uninitialized),
				element: RwLock::new(element),
				display: RwLock::new(display),
				validators: RwLock::new(ValidatorSet::new()),
				control: RwLock::new(None),
				in_place_edit: RwLock::new(None),
				form,
				services,
				rebinder,
				propagator,
			}),
			subscriptions: Mutex::new(Vec::new()),
			registration: Mutex::new(None),
		})
	}

	/// Create and attach a binding
	pub fn bind(element: Element, services: BindingServices, form: Option<Arc<FormContext>>) -> SyncResult<Self> {
		let binding = Self::new(element, services, form)?;
		binding.attach()?;
		Ok(binding)
	}

	/// Initialize the binding
	///
	/// Returns the resulting state, [`BindingState::Bound`] or
	/// [`BindingState::Degraded`]. Only valid from
	/// [`BindingState::Uninitialized`].
	pub fn attach(&self) -> SyncResult<BindingState> {
		self.transition(BindingState::Uninitialized, BindingState::Initializing)?;

		match self.initialize() {
			Ok(state) => {
				*self.shared.state.write() = state;
				tracing::debug!(path = %self.path(), code = %self.code(), state = %state, "Binding attached");
				Ok(state)
			}
			Err(err) => {
				self.release();
				*self.shared.state.write() = BindingState::Unbound;
				tracing::debug!(path = %self.path(), error = %err, "Binding failed to initialize");
				Err(err)
			}
		}
	}

	fn transition(&self, from: BindingState, to: BindingState) -> SyncResult<()> {
		let mut state = self.shared.state.write();
		if *state != from {
			return Err(SyncError::InvalidTransition { from: *state, to });
		}
		*state = to;
		Ok(())
	}

	fn initialize(&self) -> SyncResult<BindingState> {
		let shared = &self.shared;
		let element = shared.element.read().clone();

		let label: LabelContent = settle(
			shared.services.settings.failure_policy,
			"find_label",
			shared.services.content.find_label(&element),
		)?;

		let control = shared
			.form
			.as_ref()
			.and_then(|form| form.control(element.code()));
		let outcome = shared.rebinder.initial(&element, control.as_ref())?;

		{
			let mut display = shared.display.write();
			display.label = label.text;
			display.help_text = label.help_text;
			display.disabled = !element.enabled;
			display.required = outcome.required;
		}
		*shared.validators.write() = outcome.validators;

		let (Some(form), Some(control)) = (shared.form.as_ref(), control) else {
			tracing::debug!(path = %element.path, code = %element.code(), "No form control, binding degraded");
			return Ok(BindingState::Degraded);
		};

		let registration = form
			.resolver()
			.register(element.path.clone(), element.code(), control.clone())?;
		*self.registration.lock() = Some(registration);
		*shared.control.write() = Some(control.clone());

		let weak = Arc::downgrade(shared);
		let mut subscriptions = Vec::with_capacity(4);

		let target = weak.clone();
		subscriptions.push(control.on_value_change(move |value| {
			with_shared(&target, |shared| {
				shared.sync_leaf_state(value);
				Ok(())
			})
		}));

		let target = weak.clone();
		subscriptions.push(control.on_change(move |value| {
			with_shared(&target, |shared| shared.on_local_change(value).map(|_| ()))
		}));

		for kind in EventKind::ALL {
			let target = weak.clone();
			subscriptions.push(shared.services.bus.subscribe_path(
				kind,
				element.path.clone(),
				move |event| with_shared(&target, |shared| shared.on_event(event)),
			));
		}

		self.subscriptions.lock().extend(subscriptions);
		Ok(BindingState::Bound)
	}

	fn release(&self) {
		let subscriptions: Vec<Subscription> = self.subscriptions.lock().drain(..).collect();
		drop(subscriptions);
		if let Some(registration) = self.registration.lock().take() {
			registration.release();
		}
		*self.shared.control.write() = None;
	}

	/// Release every subscription and the path registration
	///
	/// Idempotent; returns `false` if the binding was not attached.
	pub fn detach(&self) -> bool {
		let previous = {
			let mut state = self.shared.state.write();
			let previous = *state;
			if previous == BindingState::Unbound {
				return false;
			}
			*state = BindingState::Unbound;
			previous
		};

		self.release();
		tracing::debug!(path = %self.path(), from = %previous, "Binding detached");
		previous.is_attached()
	}

	/// Handle a local change reported by the host
	///
	/// Bound controls report their changes through [`ControlHandle::input`];
	/// this entry point lets a degraded binding propagate as well.
	pub fn emit_value_changed(&self, value: &ControlValue) -> SyncResult<Option<SideEffect>> {
		self.shared.sync_leaf_state(value);
		self.shared.on_local_change(value)
	}

	/// Attach an in-place edit context; hides the label
	pub fn set_in_place_edit_context(&self, context: InPlaceEditContext) {
		self.shared.display.write().show_label = false;
		*self.shared.in_place_edit.write() = Some(context);
	}

	pub fn in_place_edit_context(&self) -> Option<InPlaceEditContext> {
		self.shared.in_place_edit.read().clone()
	}

	pub fn state(&self) -> BindingState {
		*self.shared.state.read()
	}

	/// Snapshot of the element, including the synced leaf state
	pub fn element(&self) -> Element {
		self.shared.element.read().clone()
	}

	pub fn path(&self) -> String {
		self.shared.path()
	}

	pub fn code(&self) -> String {
		self.shared.element.read().code().to_string()
	}

	/// Control bound while the binding is [`BindingState::Bound`]
	pub fn control(&self) -> Option<ControlHandle> {
		self.shared.control.read().clone()
	}

	pub fn display(&self) -> DisplayState {
		self.shared.display.read().clone()
	}

	pub fn label(&self) -> String {
		self.shared.display.read().label.clone()
	}

	pub fn help_text(&self) -> Option<String> {
		self.shared.display.read().help_text.clone()
	}

	pub fn show_label(&self) -> bool {
		self.shared.display.read().show_label
	}

	pub fn is_disabled(&self) -> bool {
		self.shared.display.read().disabled
	}

	pub fn is_required(&self) -> bool {
		self.shared.display.read().required
	}

	pub fn required_css(&self) -> bool {
		self.shared.display.read().required_css()
	}

	/// Effective validator set from the last rebind
	pub fn validators(&self) -> ValidatorSet {
		self.shared.validators.read().clone()
	}

	pub fn hidden(&self) -> bool {
		self.shared.element.read().attributes().hidden
	}

	pub fn help(&self) -> Option<String> {
		self.shared.element.read().attributes().help.clone()
	}

	pub fn read_only(&self) -> bool {
		self.shared.element.read().attributes().read_only
	}

	pub fn control_type(&self) -> Option<String> {
		self.shared.element.read().attributes().control_type.clone()
	}

	/// Live subscriptions held by this binding
	pub fn subscription_count(&self) -> usize {
		self.subscriptions
			.lock()
			.iter()
			.filter(|subscription| subscription.is_active())
			.count()
	}
}

impl Drop for ControlBinding {
	fn drop(&mut self) {
		self.detach();
	}
}

impl fmt::Debug for ControlBinding {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ControlBinding")
			.field("path", &self.path())
			.field("state", &self.state())
			.field("display", &self.display())
			.field("subscriptions", &self.subscription_count())
			.finish()
	}
}
