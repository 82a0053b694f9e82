//! Out-of-band events routed to bound controls
//!
//! Events form a closed set: a state update carries a new leaf state for one
//! element, a validation update carries the element's new active validation
//! groups and enabled flag. Both are addressed by `path` and `code`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// The two channels of the event bus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
	State,
	Validation,
}

impl EventKind {
	pub const ALL: [EventKind; 2] = [EventKind::State, EventKind::Validation];

	pub fn as_str(&self) -> &'static str {
		match self {
			Self::State => "state",
			Self::Validation => "validation",
		}
	}
}

impl fmt::Display for EventKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// New leaf state for an element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateUpdate {
	pub path: String,
	pub code: String,

	/// `None` is the explicit "cleared" signal
	#[serde(default)]
	pub leaf_state: Option<Value>,

	/// Type discriminator selecting a coercion, e.g. `Calendar`
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub alias: Option<String>,
}

impl StateUpdate {
	pub fn new(path: impl Into<String>, code: impl Into<String>, leaf_state: Option<Value>) -> Self {
		Self {
			path: path.into(),
			code: code.into(),
			leaf_state: leaf_state.filter(|v| !v.is_null()),
			alias: None,
		}
	}

	/// Set the type discriminator
	pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
		self.alias = Some(alias.into());
		self
	}
}

/// New validation state for an element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationUpdate {
	pub path: String,
	pub code: String,

	/// Groups to activate; absent or empty means "static constraints only"
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub active_validation_groups: Option<Vec<String>>,

	pub enabled: bool,
}

impl ValidationUpdate {
	pub fn new(path: impl Into<String>, code: impl Into<String>, enabled: bool) -> Self {
		Self {
			path: path.into(),
			code: code.into(),
			active_validation_groups: None,
			enabled,
		}
	}

	/// Set the groups to activate
	pub fn with_groups<I, S>(mut self, groups: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.active_validation_groups = Some(groups.into_iter().map(Into::into).collect());
		self
	}

	/// The groups to activate, `None` when absent or empty
	pub fn dynamic_groups(&self) -> Option<&[String]> {
		self.active_validation_groups
			.as_deref()
			.filter(|groups| !groups.is_empty())
	}
}

/// An event carried by the bus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Event {
	StateUpdate(StateUpdate),
	ValidationUpdate(ValidationUpdate),
}

impl Event {
	/// Channel this event is published on
	pub fn kind(&self) -> EventKind {
		match self {
			Self::StateUpdate(_) => EventKind::State,
			Self::ValidationUpdate(_) => EventKind::Validation,
		}
	}

	pub fn path(&self) -> &str {
		match self {
			Self::StateUpdate(e) => &e.path,
			Self::ValidationUpdate(e) => &e.path,
		}
	}

	pub fn code(&self) -> &str {
		match self {
			Self::StateUpdate(e) => &e.code,
			Self::ValidationUpdate(e) => &e.code,
		}
	}
}

impl From<StateUpdate> for Event {
	fn from(event: StateUpdate) -> Self {
		Self::StateUpdate(event)
	}
}

impl From<ValidationUpdate> for Event {
	fn from(event: ValidationUpdate) -> Self {
		Self::ValidationUpdate(event)
	}
}
