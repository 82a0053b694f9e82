//! Synchronous signals and the session event bus.

#[cfg(feature = "signals")]
pub use formsync_signals::*;
