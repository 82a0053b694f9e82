//! Locally bound value holders
//!
//! A [`ControlHandle`] is the reactive value holder for one element. It
//! tracks the value, the pristine/touched flags, the disabled flag and the
//! active [`ValidatorSet`], and exposes two notification streams:
//!
//! - value changes, emitted by every write (programmatic or user driven)
//! - local changes, emitted only by [`ControlHandle::input`]
//!
//! Handles are cheap to clone; clones share state and listeners.

use crate::error::SyncResult;
use formsync_core::validators::{ValidationError, ValidatorSet};
use formsync_core::value::ControlValue;
use formsync_signals::{BoxError, Signal, Subscription};
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

/// Validation status of a control
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlStatus {
	Valid,
	Invalid,
	/// Disabled controls are exempt from validation
	Disabled,
}

#[derive(Debug, Default)]
struct ControlState {
	value: ControlValue,
	pristine: bool,
	touched: bool,
	disabled: bool,
	validators: ValidatorSet,
	errors: Vec<ValidationError>,
}

struct ControlInner {
	state: RwLock<ControlState>,
	value_changes: Signal<ControlValue>,
	changes: Signal<ControlValue>,
}

/// Shared value holder bound to one element
#[derive(Clone)]
pub struct ControlHandle {
	inner: Arc<ControlInner>,
}

impl ControlHandle {
	/// Create an enabled, pristine control holding `value`
	///
	/// # Examples
	///
	/// ```
	/// use formsync_forms::ControlHandle;
	/// use formsync_core::value::ControlValue;
	/// use serde_json::json;
	///
	/// let control = ControlHandle::new(json!(3));
	/// assert_eq!(control.value(), ControlValue::from(json!(3)));
	/// assert!(control.is_pristine());
	/// ```
	pub fn new(value: impl Into<ControlValue>) -> Self {
		Self {
			inner: Arc::new(ControlInner {
				state: RwLock::new(ControlState {
					value: value.into(),
					pristine: true,
					..ControlState::default()
				}),
				value_changes: Signal::new("value_changes"),
				changes: Signal::new("changes"),
			}),
		}
	}

	/// Current value
	pub fn value(&self) -> ControlValue {
		self.inner.state.read().value.clone()
	}

	/// Set the value programmatically
	///
	/// Revalidates and notifies value observers. Pristine and touched flags
	/// are left untouched.
	pub fn set_value(&self, value: impl Into<ControlValue>) -> SyncResult<()> {
		let value = value.into();
		{
			let mut state = self.inner.state.write();
			state.value = value.clone();
			Self::revalidate(&mut state);
		}
		self.inner.value_changes.send(&value)?;
		Ok(())
	}

	/// Set the value as a user edit
	///
	/// Marks the control dirty and touched, revalidates, notifies value
	/// observers and then emits the local change notification. Both
	/// notifications are sent even if the first one reports failures.
	pub fn input(&self, value: impl Into<ControlValue>) -> SyncResult<()> {
		let value = value.into();
		{
			let mut state = self.inner.state.write();
			state.value = value.clone();
			state.pristine = false;
			state.touched = true;
			Self::revalidate(&mut state);
		}
		let observed = self.inner.value_changes.send(&value);
		let changed = self.inner.changes.send(&value);
		observed?;
		changed?;
		Ok(())
	}

	/// Reset to the pristine empty value
	///
	/// Clears errors and the dirty and touched flags, then notifies value
	/// observers with [`ControlValue::Null`].
	pub fn reset(&self) -> SyncResult<()> {
		{
			let mut state = self.inner.state.write();
			state.value = ControlValue::Null;
			state.pristine = true;
			state.touched = false;
			state.errors.clear();
		}
		self.inner.value_changes.send(&ControlValue::Null)?;
		Ok(())
	}

	pub fn enable(&self) {
		let mut state = self.inner.state.write();
		state.disabled = false;
		Self::revalidate(&mut state);
	}

	pub fn disable(&self) {
		let mut state = self.inner.state.write();
		state.disabled = true;
		state.errors.clear();
	}

	pub fn is_disabled(&self) -> bool {
		self.inner.state.read().disabled
	}

	/// Replace the validator set
	///
	/// Does not revalidate; call [`validate`](Self::validate) to refresh
	/// the status.
	pub fn set_validators(&self, validators: ValidatorSet) {
		self.inner.state.write().validators = validators;
	}

	pub fn validators(&self) -> ValidatorSet {
		self.inner.state.read().validators.clone()
	}

	/// Run the validator set against the current value
	pub fn validate(&self) -> ControlStatus {
		let mut state = self.inner.state.write();
		Self::revalidate(&mut state);
		Self::status_of(&state)
	}

	fn revalidate(state: &mut ControlState) {
		state.errors = if state.disabled {
			Vec::new()
		} else {
			state.validators.validate(&state.value)
		};
	}

	fn status_of(state: &ControlState) -> ControlStatus {
		if state.disabled {
			ControlStatus::Disabled
		} else if state.errors.is_empty() {
			ControlStatus::Valid
		} else {
			ControlStatus::Invalid
		}
	}

	/// Errors from the last validation run
	pub fn errors(&self) -> Vec<ValidationError> {
		self.inner.state.read().errors.clone()
	}

	pub fn status(&self) -> ControlStatus {
		Self::status_of(&self.inner.state.read())
	}

	pub fn is_valid(&self) -> bool {
		self.status() != ControlStatus::Invalid
	}

	pub fn is_pristine(&self) -> bool {
		self.inner.state.read().pristine
	}

	pub fn is_dirty(&self) -> bool {
		!self.is_pristine()
	}

	pub fn is_touched(&self) -> bool {
		self.inner.state.read().touched
	}

	/// Observe every value write
	pub fn on_value_change<F>(&self, listener: F) -> Subscription
	where
		F: Fn(&ControlValue) -> Result<(), BoxError> + Send + Sync + 'static,
	{
		self.inner.value_changes.connect(listener)
	}

	/// Observe user-driven changes
	pub fn on_change<F>(&self, listener: F) -> Subscription
	where
		F: Fn(&ControlValue) -> Result<(), BoxError> + Send + Sync + 'static,
	{
		self.inner.changes.connect(listener)
	}

	/// Live listeners across both streams
	pub fn listener_count(&self) -> usize {
		self.inner.value_changes.receiver_count() + self.inner.changes.receiver_count()
	}

	/// Whether both handles refer to the same control
	pub fn ptr_eq(&self, other: &Self) -> bool {
		Arc::ptr_eq(&self.inner, &other.inner)
	}
}

impl Default for ControlHandle {
	fn default() -> Self {
		Self::new(ControlValue::Null)
	}
}

impl fmt::Debug for ControlHandle {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let state = self.inner.state.read();
		f.debug_struct("ControlHandle")
			.field("value", &state.value)
			.field("pristine", &state.pristine)
			.field("disabled", &state.disabled)
			.field("validators", &state.validators.names())
			.finish()
	}
}
