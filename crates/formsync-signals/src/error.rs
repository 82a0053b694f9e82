//! Signal delivery errors

use std::error::Error as StdError;

/// Boxed error returned by receivers
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Errors raised while delivering a signal
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
	/// A receiver returned an error
	#[error("Receiver {receiver} failed: {source}")]
	Receiver {
		receiver: String,
		#[source]
		source: BoxError,
	},

	/// A receiver panicked during robust delivery
	#[error("Receiver {receiver} panicked")]
	ReceiverPanicked { receiver: String },

	/// One or more receivers failed; every receiver was still called
	#[error("{} receiver(s) failed, {delivered} succeeded", .failures.len())]
	Delivery {
		delivered: usize,
		failures: Vec<SignalError>,
	},
}

impl SignalError {
	/// Wrap a receiver error
	pub fn receiver(receiver: impl Into<String>, source: impl Into<BoxError>) -> Self {
		Self::Receiver {
			receiver: receiver.into(),
			source: source.into(),
		}
	}

	/// Individual receiver failures, flattening aggregated deliveries
	pub fn failures(&self) -> Vec<&SignalError> {
		match self {
			Self::Delivery { failures, .. } => failures.iter().flat_map(|f| f.failures()).collect(),
			other => vec![other],
		}
	}

	/// First receiver error of type `E`
	///
	/// # Examples
	///
	/// ```
	/// use formsync_signals::SignalError;
	///
	/// let err = SignalError::Delivery {
	///     delivered: 1,
	///     failures: vec![SignalError::receiver("state#1", std::fmt::Error)],
	/// };
	/// assert!(err.downcast_ref::<std::fmt::Error>().is_some());
	/// ```
	pub fn downcast_ref<E: StdError + 'static>(&self) -> Option<&E> {
		self.failures().into_iter().find_map(|failure| match failure {
			Self::Receiver { source, .. } => source.downcast_ref::<E>(),
			_ => None,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_failures_flatten_nested_deliveries() {
		// Arrange
		let err = SignalError::Delivery {
			delivered: 0,
			failures: vec![
				SignalError::ReceiverPanicked {
					receiver: "a#1".to_string(),
				},
				SignalError::Delivery {
					delivered: 2,
					failures: vec![SignalError::receiver("b#2", "boom")],
				},
			],
		};

		// Act
		let failures = err.failures();

		// Assert
		assert_eq!(failures.len(), 2);
		assert_eq!(err.to_string(), "2 receiver(s) failed, 0 succeeded");
	}
}
