//! Core types for formsync
//!
//! This crate holds the form model ([`Element`]), the out-of-band events
//! routed to bound controls, validator rules, per-type value coercion and
//! the engine settings. It has no knowledge of controls or subscriptions;
//! see `formsync-forms` for the binding layer.

pub mod coercion;
pub mod element;
pub mod error;
pub mod event;
pub mod settings;
pub mod validators;
pub mod value;

pub use coercion::{CoercionError, CoercionFn, CoercionRegistry, coerce_date};
pub use element::{
	Constraint, ConstraintAttributes, ConstraintName, Element, ElementConfig, UiAttributes,
	UiStyles, ValidationConfig,
};
pub use error::{CollaboratorError, CollaboratorResult};
pub use event::{Event, EventKind, StateUpdate, ValidationUpdate};
pub use settings::{
	CoercionSettings, CollaboratorFailurePolicy, SettingsError, SyncSettings, TransportSettings,
};
pub use validators::{
	RuleError, RuleKind, ValidationError, ValidationGroupRegistry, ValidatorRule, ValidatorSet,
};
pub use value::ControlValue;
