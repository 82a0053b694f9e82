//! Test logging utilities
//!
//! [`init_test_logging`] installs a global fmt subscriber writing through
//! the test harness. [`LogCapture`] is a layer that records events so tests
//! can assert on what was logged:
//!
//! ```
//! use formsync_test::logging::LogCapture;
//! use tracing_subscriber::layer::SubscriberExt as _;
//!
//! let capture = LogCapture::new();
//! let subscriber = tracing_subscriber::registry().with(capture.clone());
//!
//! tracing::subscriber::with_default(subscriber, || {
//!     tracing::warn!(path = "/order/qty", "Collaborator call failed");
//! });
//!
//! assert!(capture.contains(tracing::Level::WARN, "Collaborator call failed"));
//! ```

use parking_lot::Mutex;
use std::fmt;
use std::sync::{Arc, Once};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::{Context, Layer};

static INIT: Once = Once::new();

/// Initialize logging for tests (call once)
///
/// The filter is read from `RUST_LOG` and defaults to `formsync=debug`.
pub fn init_test_logging() {
	INIT.call_once(|| {
		let filter = EnvFilter::try_from_default_env()
			.unwrap_or_else(|_| EnvFilter::new("formsync=debug"));
		let _ = tracing_subscriber::fmt()
			.with_env_filter(filter)
			.with_test_writer()
			.try_init();
	});
}

/// One captured event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedEvent {
	pub level: Level,
	pub target: String,
	pub message: String,
	/// Structured fields other than the message, as `(name, value)`
	pub fields: Vec<(String, String)>,
}

impl CapturedEvent {
	pub fn field(&self, name: &str) -> Option<&str> {
		self.fields
			.iter()
			.find(|(field, _)| field == name)
			.map(|(_, value)| value.as_str())
	}
}

impl fmt::Display for CapturedEvent {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "[{}] {}", self.level, self.message)?;
		for (name, value) in &self.fields {
			write!(f, " {}={}", name, value)?;
		}
		Ok(())
	}
}

/// A tracing layer that records events
#[derive(Debug, Clone, Default)]
pub struct LogCapture {
	events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl LogCapture {
	pub fn new() -> Self {
		Self::default()
	}

	/// Everything captured so far
	pub fn events(&self) -> Vec<CapturedEvent> {
		self.events.lock().clone()
	}

	/// Captured events at `level`
	pub fn at_level(&self, level: Level) -> Vec<CapturedEvent> {
		self.events
			.lock()
			.iter()
			.filter(|event| event.level == level)
			.cloned()
			.collect()
	}

	/// Whether an event at `level` has a message containing `needle`
	pub fn contains(&self, level: Level, needle: &str) -> bool {
		self.events
			.lock()
			.iter()
			.any(|event| event.level == level && event.message.contains(needle))
	}

	pub fn clear(&self) {
		self.events.lock().clear();
	}
}

struct EventVisitor {
	message: String,
	fields: Vec<(String, String)>,
}

impl Visit for EventVisitor {
	fn record_str(&mut self, field: &Field, value: &str) {
		if field.name() == "message" {
			self.message = value.to_string();
		} else {
			self.fields.push((field.name().to_string(), value.to_string()));
		}
	}

	fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
		if field.name() == "message" {
			self.message = format!("{:?}", value);
		} else {
			self.fields.push((field.name().to_string(), format!("{:?}", value)));
		}
	}
}

impl<S: Subscriber> Layer<S> for LogCapture {
	fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
		let mut visitor = EventVisitor {
			message: String::new(),
			fields: Vec::new(),
		};
		event.record(&mut visitor);

		self.events.lock().push(CapturedEvent {
			level: *event.metadata().level(),
			target: event.metadata().target().to_string(),
			message: visitor.message,
			fields: visitor.fields,
		});
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use tracing_subscriber::layer::SubscriberExt as _;

	#[rstest]
	fn test_capture_records_fields() {
		// Arrange
		let capture = LogCapture::new();
		let subscriber = tracing_subscriber::registry().with(capture.clone());

		// Act
		tracing::subscriber::with_default(subscriber, || {
			tracing::debug!(path = "/a", code = "a", "Applying state update");
		});

		// Assert
		let events = capture.at_level(Level::DEBUG);
		assert_eq!(events.len(), 1);
		assert_eq!(events[0].message, "Applying state update");
		assert_eq!(events[0].field("path"), Some("/a"));
		assert_eq!(events[0].field("code"), Some("a"));
	}

	#[rstest]
	fn test_init_test_logging_is_idempotent() {
		init_test_logging();
		init_test_logging();
	}
}
