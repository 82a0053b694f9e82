//! Test utilities for formsync
//!
//! - [`fixtures`]: rstest fixtures and the [`SyncHarness`](fixtures::SyncHarness)
//! - [`mock`]: mockall mocks of the collaborator traits
//! - [`recording`]: collaborators that record calls for later inspection
//! - [`logging`]: test logging setup and the [`LogCapture`](logging::LogCapture) layer

pub mod fixtures;
pub mod logging;
pub mod mock;
pub mod recording;

pub use fixtures::{SyncHarness, event_bus, group_registry, harness, qty_element};
pub use logging::{CapturedEvent, LogCapture, init_test_logging};
pub use mock::{MockContentLookup, MockTransport, MockValidationUtils};
pub use recording::{RecordingTransport, StaticContentLookup, TransportCall};
