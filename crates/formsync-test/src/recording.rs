//! Recording collaborators
//!
//! Unlike the mocks these need no expectations up front; tests inspect what
//! was recorded afterwards.

use formsync_core::element::Element;
use formsync_core::error::{CollaboratorError, CollaboratorResult};
use formsync_forms::collaborators::{ContentLookup, LabelContent, Transport};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;

/// A call received by [`RecordingTransport`]
#[derive(Debug, Clone, PartialEq)]
pub enum TransportCall {
	StateChange {
		path: String,
		kind: String,
		payload: String,
	},
	Action {
		url: String,
		headers: Option<http::HeaderMap>,
		payload: Value,
		method: http::Method,
	},
}

/// Transport that records every call
#[derive(Debug, Default)]
pub struct RecordingTransport {
	calls: Mutex<Vec<TransportCall>>,
	failure: Option<String>,
}

impl RecordingTransport {
	pub fn new() -> Self {
		Self::default()
	}

	/// Transport that records calls and then fails them
	pub fn failing(message: impl Into<String>) -> Self {
		Self {
			calls: Mutex::new(Vec::new()),
			failure: Some(message.into()),
		}
	}

	pub fn calls(&self) -> Vec<TransportCall> {
		self.calls.lock().clone()
	}

	pub fn state_changes(&self) -> Vec<TransportCall> {
		self.calls
			.lock()
			.iter()
			.filter(|call| matches!(call, TransportCall::StateChange { .. }))
			.cloned()
			.collect()
	}

	pub fn actions(&self) -> Vec<TransportCall> {
		self.calls
			.lock()
			.iter()
			.filter(|call| matches!(call, TransportCall::Action { .. }))
			.cloned()
			.collect()
	}

	fn record(&self, call: TransportCall) -> CollaboratorResult<()> {
		self.calls.lock().push(call);
		match &self.failure {
			Some(message) => Err(CollaboratorError::Transport(message.clone())),
			None => Ok(()),
		}
	}
}

impl Transport for RecordingTransport {
	fn post_state_change(&self, path: &str, kind: &str, payload: &str) -> CollaboratorResult<()> {
		self.record(TransportCall::StateChange {
			path: path.to_string(),
			kind: kind.to_string(),
			payload: payload.to_string(),
		})
	}

	fn post_action(
		&self,
		url: &str,
		headers: Option<http::HeaderMap>,
		payload: &Value,
		method: http::Method,
	) -> CollaboratorResult<()> {
		self.record(TransportCall::Action {
			url: url.to_string(),
			headers,
			payload: payload.clone(),
			method,
		})
	}
}

/// Content lookup backed by a map of codes to labels
///
/// Unknown codes get their code as label text.
#[derive(Debug, Clone, Default)]
pub struct StaticContentLookup {
	labels: HashMap<String, LabelContent>,
}

impl StaticContentLookup {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_label(mut self, code: impl Into<String>, label: LabelContent) -> Self {
		self.labels.insert(code.into(), label);
		self
	}
}

impl ContentLookup for StaticContentLookup {
	fn find_label(&self, element: &Element) -> CollaboratorResult<LabelContent> {
		Ok(self
			.labels
			.get(element.code())
			.cloned()
			.unwrap_or_else(|| LabelContent::new(element.code())))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;

	#[rstest]
	fn test_failing_transport_still_records() {
		// Arrange
		let transport = RecordingTransport::failing("offline");

		// Act
		let result = transport.post_action("/p", None, &json!(1), http::Method::POST);

		// Assert
		assert!(matches!(result, Err(CollaboratorError::Transport(_))));
		assert_eq!(transport.actions().len(), 1);
		assert!(transport.state_changes().is_empty());
	}

	#[rstest]
	fn test_static_labels_fall_back_to_code() {
		let content = StaticContentLookup::new().with_label("qty", LabelContent::new("Quantity"));
		assert_eq!(content.find_label(&Element::new("/q", "qty")).unwrap().text, "Quantity");
		assert_eq!(content.find_label(&Element::new("/p", "price")).unwrap().text, "price");
	}
}
