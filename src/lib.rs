//! # formsync
//!
//! State and validation synchronization for server-defined declarative forms.
//!
//! formsync keeps independently mounted UI controls consistent with a shared
//! form model. Controls are addressed by a hierarchical path plus a stable
//! code; out-of-band state and validation events published on an
//! [`EventBus`] are routed to the matching control, validator sets are
//! recomputed at runtime, and user-driven changes fire at most one external
//! side effect.
//!
//! ## Feature Flags
//!
//! - `minimal` - core types, the event bus and control bindings
//! - `standard` - same as `minimal`
//! - `full` (default) - everything, including the test utilities
//!
//! Fine-grained flags: `core`, `signals`, `forms`, `test`.
//!
//! ## Quick Example
//!
//! ```rust
//! use formsync::prelude::*;
//! use serde_json::json;
//!
//! let harness = formsync::test::fixtures::harness();
//! let (binding, control) = harness
//!     .bind(Element::new("/order/qty", "qty"))
//!     .unwrap();
//!
//! harness
//!     .bus
//!     .publish(StateUpdate::new("/order/qty", "qty", Some(json!(10))))
//!     .unwrap();
//! harness
//!     .bus
//!     .publish(ValidationUpdate::new("/order/qty", "qty", true).with_groups(["required", "max100"]))
//!     .unwrap();
//!
//! assert_eq!(control.value(), ControlValue::from(json!(10)));
//! assert_eq!(binding.validators().names(), vec!["required", "max100"]);
//! assert_eq!(binding.state(), BindingState::Bound);
//! ```

#[cfg(feature = "core")]
pub mod core;
#[cfg(feature = "forms")]
pub mod forms;
#[cfg(feature = "signals")]
pub mod signals;
#[cfg(feature = "test")]
pub mod test;

// Re-export core types
#[cfg(feature = "core")]
pub use formsync_core::{
	CollaboratorError, CollaboratorFailurePolicy, ControlValue, Element, Event, EventKind,
	StateUpdate, SyncSettings, ValidationUpdate, ValidatorRule, ValidatorSet,
};

// Re-export the event bus
#[cfg(feature = "signals")]
pub use formsync_signals::{EventBus, Signal, SignalError, Subscription};

// Re-export bindings
#[cfg(feature = "forms")]
pub use formsync_forms::{
	BindingServices, BindingState, ChangePropagator, ControlBinding, ControlHandle, FormContext,
	PathResolver, SideEffect, SyncError, ValidationRebinder,
};

/// Re-export commonly used types
pub mod prelude {
	#[cfg(feature = "core")]
	pub use crate::{
		CollaboratorError, CollaboratorFailurePolicy, ControlValue, Element, Event, EventKind,
		StateUpdate, SyncSettings, ValidationUpdate, ValidatorRule, ValidatorSet,
	};

	#[cfg(feature = "core")]
	pub use formsync_core::element::{Constraint, UiAttributes};

	#[cfg(feature = "signals")]
	pub use crate::{EventBus, Subscription};

	#[cfg(feature = "forms")]
	pub use crate::{
		BindingServices, BindingState, ChangePropagator, ControlBinding, ControlHandle, FormContext,
		PathResolver, SideEffect, SyncError, ValidationRebinder,
	};

	#[cfg(feature = "forms")]
	pub use formsync_forms::{ContentLookup, LabelContent, Transport, ValidationUtils};
}
