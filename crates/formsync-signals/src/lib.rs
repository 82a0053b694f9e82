//! Synchronous signals and the event bus for formsync
//!
//! [`Signal`] is a generic in-process dispatcher with scoped
//! [`Subscription`]s. [`EventBus`] pairs one signal per event kind and is
//! the session-scoped channel that bound controls listen on.

pub mod bus;
pub mod error;
pub mod signal;

pub use bus::EventBus;
pub use error::{BoxError, SignalError};
pub use signal::{PredicateFn, ReceiverFn, Signal, Subscription};
