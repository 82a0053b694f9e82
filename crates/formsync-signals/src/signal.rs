//! Synchronous signal with scoped subscriptions
//!
//! Receivers are called in connection order on the sending thread. The
//! receiver list is snapshotted before delivery and no lock is held while a
//! receiver runs, so receivers may connect, disconnect or send re-entrantly.
//! A receiver connected during a send does not see that send; a receiver
//! released during a send is skipped if it has not run yet.

use crate::error::{BoxError, SignalError};
use parking_lot::RwLock;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

/// Receiver function type
pub type ReceiverFn<T> = Arc<dyn Fn(&T) -> Result<(), BoxError> + Send + Sync>;

/// Predicate deciding whether a receiver sees a payload
pub type PredicateFn<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

struct ReceiverInfo<T> {
	id: u64,
	receiver: ReceiverFn<T>,
	predicate: Option<PredicateFn<T>>,
}

impl<T> Clone for ReceiverInfo<T> {
	fn clone(&self) -> Self {
		Self {
			id: self.id,
			receiver: Arc::clone(&self.receiver),
			predicate: self.predicate.clone(),
		}
	}
}

struct SignalInner<T> {
	name: String,
	receivers: RwLock<Vec<ReceiverInfo<T>>>,
	next_id: AtomicU64,
}

/// Type-erased view used by [`Subscription`] to release its receiver
trait ReceiverRegistry: Send + Sync {
	fn remove(&self, id: u64) -> bool;
	fn is_connected(&self, id: u64) -> bool;
}

impl<T> ReceiverRegistry for SignalInner<T> {
	fn remove(&self, id: u64) -> bool {
		let mut receivers = self.receivers.write();
		let original_len = receivers.len();
		receivers.retain(|r| r.id != id);
		receivers.len() < original_len
	}

	fn is_connected(&self, id: u64) -> bool {
		self.receivers.read().iter().any(|r| r.id == id)
	}
}

/// Synchronous signal carrying payloads of type `T`
pub struct Signal<T> {
	inner: Arc<SignalInner<T>>,
}

impl<T> Clone for Signal<T> {
	fn clone(&self) -> Self {
		Self {
			inner: Arc::clone(&self.inner),
		}
	}
}

impl<T: 'static> Signal<T> {
	/// Create a signal; the name appears in logs and receiver errors
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			inner: Arc::new(SignalInner {
				name: name.into(),
				receivers: RwLock::new(Vec::new()),
				next_id: AtomicU64::new(1),
			}),
		}
	}

	pub fn name(&self) -> &str {
		&self.inner.name
	}

	/// Connect a receiver
	///
	/// # Examples
	///
	/// ```
	/// use formsync_signals::Signal;
	/// use std::sync::Arc;
	/// use std::sync::atomic::{AtomicUsize, Ordering};
	///
	/// let signal = Signal::<u32>::new("numbers");
	/// let seen = Arc::new(AtomicUsize::new(0));
	///
	/// let seen_clone = seen.clone();
	/// let subscription = signal.connect(move |n| {
	///     seen_clone.fetch_add(*n as usize, Ordering::SeqCst);
	///     Ok(())
	/// });
	///
	/// assert_eq!(signal.send(&2).unwrap(), 1);
	/// drop(subscription);
	/// assert_eq!(signal.send(&3).unwrap(), 0);
	/// assert_eq!(seen.load(Ordering::SeqCst), 2);
	/// ```
	pub fn connect<F>(&self, receiver: F) -> Subscription
	where
		F: Fn(&T) -> Result<(), BoxError> + Send + Sync + 'static,
	{
		self.insert(Arc::new(receiver), None)
	}

	/// Connect a receiver that only sees payloads accepted by `predicate`
	pub fn connect_with_predicate<P, F>(&self, predicate: P, receiver: F) -> Subscription
	where
		P: Fn(&T) -> bool + Send + Sync + 'static,
		F: Fn(&T) -> Result<(), BoxError> + Send + Sync + 'static,
	{
		self.insert(Arc::new(receiver), Some(Arc::new(predicate)))
	}

	fn insert(&self, receiver: ReceiverFn<T>, predicate: Option<PredicateFn<T>>) -> Subscription {
		let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
		self.inner.receivers.write().push(ReceiverInfo {
			id,
			receiver,
			predicate,
		});
		tracing::trace!(signal = %self.inner.name, receiver = id, "Receiver connected");

		let inner: Arc<dyn ReceiverRegistry> = self.inner.clone();
		Subscription {
			registry: Some(Arc::downgrade(&inner)),
			id,
		}
	}

	fn snapshot(&self) -> Vec<ReceiverInfo<T>> {
		self.inner.receivers.read().clone()
	}

	fn receiver_name(&self, id: u64) -> String {
		format!("{}#{}", self.inner.name, id)
	}

	/// Send a payload to every connected receiver
	///
	/// Returns the number of receivers that handled the payload. Failing
	/// receivers do not stop delivery; their errors are returned together as
	/// [`SignalError::Delivery`] once every receiver has run.
	pub fn send(&self, payload: &T) -> Result<usize, SignalError> {
		let mut delivered = 0;
		let mut failures = Vec::new();

		for info in self.snapshot() {
			if !self.inner.is_connected(info.id) {
				continue;
			}
			if let Some(predicate) = &info.predicate {
				if !predicate(payload) {
					continue;
				}
			}

			match (info.receiver)(payload) {
				Ok(()) => delivered += 1,
				Err(source) => failures.push(SignalError::Receiver {
					receiver: self.receiver_name(info.id),
					source,
				}),
			}
		}

		tracing::trace!(
			signal = %self.inner.name,
			delivered,
			failed = failures.len(),
			"Signal sent"
		);

		if failures.is_empty() {
			Ok(delivered)
		} else {
			Err(SignalError::Delivery {
				delivered,
				failures,
			})
		}
	}

	/// Send a payload, catching receiver panics
	///
	/// Returns one result per receiver that accepted the payload.
	pub fn send_robust(&self, payload: &T) -> Vec<Result<(), SignalError>> {
		let mut results = Vec::new();

		for info in self.snapshot() {
			if !self.inner.is_connected(info.id) {
				continue;
			}
			if let Some(predicate) = &info.predicate {
				if !predicate(payload) {
					continue;
				}
			}

			let outcome =
				std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| (info.receiver)(payload)));

			results.push(match outcome {
				Ok(Ok(())) => Ok(()),
				Ok(Err(source)) => Err(SignalError::Receiver {
					receiver: self.receiver_name(info.id),
					source,
				}),
				Err(_) => {
					tracing::warn!(signal = %self.inner.name, receiver = info.id, "Receiver panicked");
					Err(SignalError::ReceiverPanicked {
						receiver: self.receiver_name(info.id),
					})
				}
			});
		}

		results
	}

	/// Number of connected receivers
	pub fn receiver_count(&self) -> usize {
		self.inner.receivers.read().len()
	}

	/// Check if the signal has any receivers
	pub fn has_listeners(&self) -> bool {
		self.receiver_count() > 0
	}

	/// Disconnect every receiver, returning how many were removed
	///
	/// Outstanding [`Subscription`]s become inactive.
	pub fn disconnect_all(&self) -> usize {
		let mut receivers = self.inner.receivers.write();
		let removed = receivers.len();
		receivers.clear();
		removed
	}
}

impl<T> fmt::Debug for Signal<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Signal")
			.field("name", &self.inner.name)
			.field("receivers", &self.inner.receivers.read().len())
			.finish()
	}
}

/// Handle to a connected receiver
///
/// The receiver stays connected until the subscription is released or
/// dropped. A subscription does not keep its signal alive.
#[must_use = "dropping a Subscription disconnects its receiver"]
pub struct Subscription {
	registry: Option<Weak<dyn ReceiverRegistry>>,
	id: u64,
}

impl Subscription {
	/// Disconnect the receiver
	///
	/// Returns `false` if it was already gone (signal dropped or
	/// [`Signal::disconnect_all`] called).
	pub fn release(mut self) -> bool {
		self.release_inner()
	}

	/// Whether the receiver is still connected
	pub fn is_active(&self) -> bool {
		self.registry
			.as_ref()
			.and_then(Weak::upgrade)
			.is_some_and(|registry| registry.is_connected(self.id))
	}

	fn release_inner(&mut self) -> bool {
		match self.registry.take().and_then(|weak| weak.upgrade()) {
			Some(registry) => registry.remove(self.id),
			None => false,
		}
	}
}

impl Drop for Subscription {
	fn drop(&mut self) {
		self.release_inner();
	}
}

impl fmt::Debug for Subscription {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Subscription")
			.field("id", &self.id)
			.field("active", &self.is_active())
			.finish()
	}
}
