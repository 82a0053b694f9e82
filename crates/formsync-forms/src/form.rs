//! Form instance context

use crate::control::ControlHandle;
use crate::error::{SyncError, SyncResult};
use crate::resolver::PathResolver;
use formsync_core::coercion::CoercionRegistry;
use formsync_core::element::Element;
use formsync_core::value::ControlValue;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Controls of one form instance, keyed by code, plus its binding table
///
/// At most one control exists per code.
#[derive(Debug, Default)]
pub struct FormContext {
	controls: RwLock<HashMap<String, ControlHandle>>,
	resolver: PathResolver,
	coercions: Arc<CoercionRegistry>,
}

impl FormContext {
	pub fn new() -> Self {
		Self::default()
	}

	/// Coerce initial leaf states with `coercions`
	pub fn with_coercions(mut self, coercions: Arc<CoercionRegistry>) -> Self {
		self.coercions = coercions;
		self
	}

	/// Add a control under `code`
	pub fn add_control(&self, code: impl Into<String>, control: ControlHandle) -> SyncResult<ControlHandle> {
		let code = code.into();
		let mut controls = self.controls.write();
		if controls.contains_key(&code) {
			return Err(SyncError::DuplicateControl { code });
		}
		controls.insert(code, control.clone());
		Ok(control)
	}

	/// Create the control for an element
	///
	/// The control starts with the element's leaf state, coerced by the
	/// element's type discriminator, and is disabled when the element is.
	pub fn add_element(&self, element: &Element) -> SyncResult<ControlHandle> {
		let value = match element.leaf_state.as_ref().filter(|v| !v.is_null()) {
			Some(raw) => self
				.coercions
				.coerce(element.attributes().alias.as_deref(), raw)?,
			None => ControlValue::Null,
		};
		let control = ControlHandle::new(value);
		if !element.enabled {
			control.disable();
		}
		self.add_control(element.code(), control)
	}

	pub fn control(&self, code: &str) -> Option<ControlHandle> {
		self.controls.read().get(code).cloned()
	}

	pub fn remove_control(&self, code: &str) -> Option<ControlHandle> {
		self.controls.write().remove(code)
	}

	pub fn contains(&self, code: &str) -> bool {
		self.controls.read().contains_key(code)
	}

	pub fn len(&self) -> usize {
		self.controls.read().len()
	}

	pub fn is_empty(&self) -> bool {
		self.controls.read().is_empty()
	}

	/// Binding table of this form instance
	pub fn resolver(&self) -> &PathResolver {
		&self.resolver
	}
}
