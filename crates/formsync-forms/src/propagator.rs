//! Side effects of local value changes
//!
//! A user-driven change fires at most one external side effect, chosen from
//! the element's UI attributes:
//!
//! 1. `postEventOnChange` posts a state change carrying the serialized
//!    leaf state
//! 2. otherwise `postButtonUrl` posts the leaf state to that URL
//! 3. otherwise nothing happens

use crate::collaborators::Transport;
use crate::error::{SyncResult, settle};
use formsync_core::element::Element;
use formsync_core::settings::{CollaboratorFailurePolicy, SyncSettings};
use serde_json::Value;
use std::sync::Arc;

/// External side effect fired for a local change
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SideEffect {
	/// State-change notification with the JSON-serialized leaf state
	StateChange { path: String, payload: String },
	/// Action post to a URL
	Action { url: String },
}

/// Decides and fires side effects through a [`Transport`]
#[derive(Clone)]
pub struct ChangePropagator {
	transport: Arc<dyn Transport>,
	state_change_kind: String,
	action_method: http::Method,
	policy: CollaboratorFailurePolicy,
}

impl ChangePropagator {
	/// Create a propagator with default settings
	pub fn new(transport: Arc<dyn Transport>) -> Self {
		Self {
			transport,
			state_change_kind: "state".to_string(),
			action_method: http::Method::POST,
			policy: CollaboratorFailurePolicy::default(),
		}
	}

	/// Create a propagator configured by `settings`
	pub fn with_settings(transport: Arc<dyn Transport>, settings: &SyncSettings) -> SyncResult<Self> {
		Ok(Self {
			transport,
			state_change_kind: settings.transport.state_change_kind.clone(),
			action_method: settings.transport.action_method()?,
			policy: settings.failure_policy,
		})
	}

	/// Side effect for the element's current configuration and leaf state
	///
	/// # Examples
	///
	/// ```
	/// use formsync_core::element::{Element, UiAttributes};
	/// use formsync_forms::{ChangePropagator, SideEffect};
	/// use serde_json::json;
	///
	/// let element = Element::new("/order/qty", "qty")
	///     .with_leaf_state(json!(10))
	///     .with_attributes(UiAttributes {
	///         post_event_on_change: true,
	///         post_button_url: Some("/p/order/_update".to_string()),
	///         ..UiAttributes::default()
	///     });
	///
	/// assert_eq!(
	///     ChangePropagator::decide(&element),
	///     Some(SideEffect::StateChange {
	///         path: "/order/qty".to_string(),
	///         payload: "10".to_string(),
	///     })
	/// );
	/// ```
	pub fn decide(element: &Element) -> Option<SideEffect> {
		let attributes = element.attributes();
		if attributes.post_event_on_change {
			Some(SideEffect::StateChange {
				path: element.path.clone(),
				payload: serialize_leaf_state(element.leaf_state.as_ref()),
			})
		} else {
			attributes
				.post_button_url
				.as_ref()
				.filter(|url| !url.is_empty())
				.map(|url| SideEffect::Action { url: url.clone() })
		}
	}

	/// Decide and fire the side effect for a local change
	pub fn propagate(&self, element: &Element) -> SyncResult<Option<SideEffect>> {
		let Some(effect) = Self::decide(element) else {
			tracing::trace!(path = %element.path, "No side effect configured");
			return Ok(None);
		};

		match &effect {
			SideEffect::StateChange { path, payload } => {
				tracing::debug!(path = %path, kind = %self.state_change_kind, "Posting state change");
				settle(
					self.policy,
					"post_state_change",
					self.transport
						.post_state_change(path, &self.state_change_kind, payload),
				)?;
			}
			SideEffect::Action { url } => {
				tracing::debug!(path = %element.path, url = %url, method = %self.action_method, "Posting action");
				let payload = element.leaf_state.clone().unwrap_or(Value::Null);
				settle(
					self.policy,
					"post_action",
					self.transport
						.post_action(url, None, &payload, self.action_method.clone()),
				)?;
			}
		}

		Ok(Some(effect))
	}
}

fn serialize_leaf_state(leaf_state: Option<&Value>) -> String {
	leaf_state.unwrap_or(&Value::Null).to_string()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::collaborators::MockTransport;
	use crate::error::SyncError;
	use formsync_core::element::UiAttributes;
	use formsync_core::error::CollaboratorError;
	use mockall::predicate::eq;
	use rstest::rstest;
	use serde_json::json;

	fn element(post_event_on_change: bool, post_button_url: Option<&str>) -> Element {
		Element::new("/order/qty", "qty")
			.with_leaf_state(json!({"n": 10}))
			.with_attributes(UiAttributes {
				post_event_on_change,
				post_button_url: post_button_url.map(str::to_string),
				..UiAttributes::default()
			})
	}

	#[rstest]
	#[case(true, Some("/p/_update"))]
	#[case(true, None)]
	fn test_state_change_wins(#[case] on_change: bool, #[case] url: Option<&str>) {
		// Arrange
		let mut transport = MockTransport::new();
		transport
			.expect_post_state_change()
			.with(eq("/order/qty"), eq("state"), eq(r#"{"n":10}"#))
			.times(1)
			.returning(|_, _, _| Ok(()));
		transport.expect_post_action().never();
		let propagator = ChangePropagator::new(Arc::new(transport));

		// Act
		let effect = propagator.propagate(&element(on_change, url)).unwrap();

		// Assert
		assert!(matches!(effect, Some(SideEffect::StateChange { .. })));
	}

	#[rstest]
	fn test_action_posts_leaf_state() {
		// Arrange
		let mut transport = MockTransport::new();
		transport.expect_post_state_change().never();
		transport
			.expect_post_action()
			.withf(|url, headers, payload, method| {
				url == "/p/_update"
					&& headers.is_none()
					&& *payload == json!({"n": 10})
					&& *method == http::Method::POST
			})
			.times(1)
			.returning(|_, _, _, _| Ok(()));
		let propagator = ChangePropagator::new(Arc::new(transport));

		// Act
		let effect = propagator
			.propagate(&element(false, Some("/p/_update")))
			.unwrap();

		// Assert
		assert_eq!(
			effect,
			Some(SideEffect::Action {
				url: "/p/_update".to_string()
			})
		);
	}

	#[rstest]
	fn test_no_flags_no_side_effect() {
		// Arrange
		let mut transport = MockTransport::new();
		transport.expect_post_state_change().never();
		transport.expect_post_action().never();
		let propagator = ChangePropagator::new(Arc::new(transport));

		// Act
		let effect = propagator.propagate(&element(false, None)).unwrap();

		// Assert
		assert!(effect.is_none());
	}

	#[rstest]
	fn test_null_leaf_state_serializes_as_null() {
		let element = Element::new("/a", "a").with_attributes(UiAttributes {
			post_event_on_change: true,
			..UiAttributes::default()
		});
		assert_eq!(
			ChangePropagator::decide(&element),
			Some(SideEffect::StateChange {
				path: "/a".to_string(),
				payload: "null".to_string()
			})
		);
	}

	#[rstest]
	fn test_configured_kind_and_method() {
		// Arrange
		let settings = SyncSettings::from_toml_str(
			"[transport]\nstate_change_kind = \"value\"\naction_method = \"PUT\"\n",
		)
		.unwrap();
		let mut transport = MockTransport::new();
		transport
			.expect_post_action()
			.withf(|_, _, _, method| *method == http::Method::PUT)
			.times(1)
			.returning(|_, _, _, _| Ok(()));
		let propagator = ChangePropagator::with_settings(Arc::new(transport), &settings).unwrap();

		// Act & Assert
		propagator
			.propagate(&element(false, Some("/p/_update")))
			.unwrap();
	}

	#[rstest]
	fn test_transport_failure_propagates() {
		// Arrange
		let mut transport = MockTransport::new();
		transport
			.expect_post_state_change()
			.returning(|_, _, _| Err(CollaboratorError::Transport("offline".to_string())));
		let propagator = ChangePropagator::new(Arc::new(transport));

		// Act
		let result = propagator.propagate(&element(true, None));

		// Assert
		assert!(matches!(
			result,
			Err(SyncError::Collaborator(CollaboratorError::Transport(_)))
		));
	}
}
