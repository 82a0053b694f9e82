//! Control bindings for formsync
//!
//! This crate connects locally bound controls to a shared, server-defined
//! form model:
//!
//! - [`ControlHandle`]: reactive value holder with validators
//! - [`PathResolver`]: `(path, code)` addressing of bound controls
//! - [`ControlBinding`]: per-control lifecycle and event routing
//! - [`ValidationRebinder`]: static versus dynamic validator sets
//! - [`ChangePropagator`]: side effects of user-driven changes
//!
//! External concerns (content lookup, validation utilities, transport) are
//! injected through the traits in [`collaborators`].

pub mod binding;
pub mod collaborators;
pub mod control;
pub mod error;
pub mod form;
pub mod propagator;
pub mod rebinder;
pub mod resolver;

pub use binding::{BindingServices, BindingState, ControlBinding, DisplayState, InPlaceEditContext};
pub use collaborators::{
	ConstraintValidationUtils, ContentLookup, LabelContent, Transport, ValidationUtils,
};
pub use control::{ControlHandle, ControlStatus};
pub use error::{SyncError, SyncResult};
pub use form::FormContext;
pub use propagator::{ChangePropagator, SideEffect};
pub use rebinder::{RebindOutcome, ValidationRebinder};
pub use resolver::{PathResolver, Registration};
