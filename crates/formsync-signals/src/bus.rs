//! Session-scoped event bus
//!
//! The bus owns one [`Signal`] per [`EventKind`]. Publishing delivers the
//! event synchronously to every subscriber of its kind, in subscription
//! order. Nothing is buffered: a subscriber only sees events published
//! while it is connected.

use crate::error::{BoxError, SignalError};
use crate::signal::{Signal, Subscription};
use formsync_core::event::{Event, EventKind};

/// Publish/subscribe channel for state and validation updates
///
/// Cloning is cheap; clones share subscribers.
///
/// # Examples
///
/// ```
/// use formsync_core::event::{EventKind, StateUpdate};
/// use formsync_signals::EventBus;
/// use serde_json::json;
///
/// let bus = EventBus::new();
/// let subscription = bus.subscribe_path(EventKind::State, "/order/qty", |event| {
///     assert_eq!(event.code(), "qty");
///     Ok(())
/// });
///
/// let reached = bus
///     .publish(StateUpdate::new("/order/qty", "qty", Some(json!(10))))
///     .unwrap();
/// assert_eq!(reached, 1);
///
/// subscription.release();
/// assert_eq!(bus.subscriber_count(EventKind::State), 0);
/// ```
#[derive(Clone, Debug)]
pub struct EventBus {
	state: Signal<Event>,
	validation: Signal<Event>,
}

impl EventBus {
	pub fn new() -> Self {
		Self {
			state: Signal::new(EventKind::State.as_str()),
			validation: Signal::new(EventKind::Validation.as_str()),
		}
	}

	fn channel(&self, kind: EventKind) -> &Signal<Event> {
		match kind {
			EventKind::State => &self.state,
			EventKind::Validation => &self.validation,
		}
	}

	/// Publish an event on the channel of its kind
	///
	/// Returns the number of subscribers that handled the event.
	pub fn publish(&self, event: impl Into<Event>) -> Result<usize, SignalError> {
		let event = event.into();
		let kind = event.kind();
		tracing::debug!(kind = %kind, path = event.path(), code = event.code(), "Publishing event");
		self.channel(kind).send(&event)
	}

	/// Publish an event, catching subscriber panics
	pub fn publish_robust(&self, event: impl Into<Event>) -> Vec<Result<(), SignalError>> {
		let event = event.into();
		self.channel(event.kind()).send_robust(&event)
	}

	/// Subscribe to every event of `kind`
	pub fn subscribe<F>(&self, kind: EventKind, handler: F) -> Subscription
	where
		F: Fn(&Event) -> Result<(), BoxError> + Send + Sync + 'static,
	{
		self.channel(kind).connect(handler)
	}

	/// Subscribe to events of `kind` accepted by `predicate`
	pub fn subscribe_filtered<P, F>(&self, kind: EventKind, predicate: P, handler: F) -> Subscription
	where
		P: Fn(&Event) -> bool + Send + Sync + 'static,
		F: Fn(&Event) -> Result<(), BoxError> + Send + Sync + 'static,
	{
		self.channel(kind).connect_with_predicate(predicate, handler)
	}

	/// Subscribe to events of `kind` addressed to `path`
	pub fn subscribe_path<F>(&self, kind: EventKind, path: impl Into<String>, handler: F) -> Subscription
	where
		F: Fn(&Event) -> Result<(), BoxError> + Send + Sync + 'static,
	{
		let path = path.into();
		self.subscribe_filtered(kind, move |event| event.path() == path, handler)
	}

	/// Live subscriptions on the channel of `kind`
	pub fn subscriber_count(&self, kind: EventKind) -> usize {
		self.channel(kind).receiver_count()
	}

	/// Live subscriptions across both channels
	pub fn total_subscribers(&self) -> usize {
		EventKind::ALL
			.iter()
			.map(|kind| self.subscriber_count(*kind))
			.sum()
	}
}

impl Default for EventBus {
	fn default() -> Self {
		Self::new()
	}
}
