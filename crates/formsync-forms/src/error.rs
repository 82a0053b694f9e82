//! Errors raised by the binding layer

use crate::binding::BindingState;
use formsync_core::coercion::CoercionError;
use formsync_core::error::{CollaboratorError, CollaboratorResult};
use formsync_core::settings::{CollaboratorFailurePolicy, SettingsError};
use formsync_signals::SignalError;

/// Errors raised while binding controls and routing events
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
	#[error(transparent)]
	Collaborator(#[from] CollaboratorError),

	#[error(transparent)]
	Coercion(#[from] CoercionError),

	#[error("Signal delivery failed: {0}")]
	Signal(SignalError),

	#[error(transparent)]
	Settings(#[from] SettingsError),

	#[error("A control is already registered for code `{code}`")]
	DuplicateControl { code: String },

	#[error("Path `{path}` is already bound to control `{code}`")]
	PathAlreadyBound { path: String, code: String },

	#[error("Invalid binding transition from {from} to {to}")]
	InvalidTransition { from: BindingState, to: BindingState },
}

/// Result type for binding operations
pub type SyncResult<T> = Result<T, SyncError>;

impl From<SignalError> for SyncError {
	/// Unwraps a single receiver failure that already carries a
	/// [`SyncError`], so collaborator failures raised inside event handlers
	/// surface unchanged.
	fn from(err: SignalError) -> Self {
		match err {
			SignalError::Receiver { receiver, source } => match source.downcast::<SyncError>() {
				Ok(inner) => *inner,
				Err(source) => Self::Signal(SignalError::Receiver { receiver, source }),
			},
			SignalError::Delivery {
				delivered,
				mut failures,
			} => {
				if failures.len() == 1 {
					Self::from(failures.remove(0))
				} else {
					Self::Signal(SignalError::Delivery {
						delivered,
						failures,
					})
				}
			}
			other => Self::Signal(other),
		}
	}
}

/// Apply the failure policy to a collaborator result
///
/// Under [`CollaboratorFailurePolicy::Log`] the failure is logged and the
/// neutral value `T::default()` is returned instead.
pub(crate) fn settle<T: Default>(
	policy: CollaboratorFailurePolicy,
	operation: &'static str,
	result: CollaboratorResult<T>,
) -> SyncResult<T> {
	match (result, policy) {
		(Ok(value), _) => Ok(value),
		(Err(err), CollaboratorFailurePolicy::Propagate) => Err(err.into()),
		(Err(err), CollaboratorFailurePolicy::Log) => {
			tracing::warn!(operation, error = %err, "Collaborator call failed, continuing");
			Ok(T::default())
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use formsync_signals::BoxError;
	use rstest::rstest;

	#[rstest]
	fn test_single_failure_unwraps_to_inner_error() {
		// Arrange
		let inner: BoxError = Box::new(SyncError::from(CollaboratorError::Transport(
			"offline".to_string(),
		)));
		let err = SignalError::Delivery {
			delivered: 0,
			failures: vec![SignalError::receiver("state#1", inner)],
		};

		// Act
		let sync = SyncError::from(err);

		// Assert
		assert!(matches!(
			sync,
			SyncError::Collaborator(CollaboratorError::Transport(_))
		));
	}

	#[rstest]
	fn test_foreign_failure_stays_signal_error() {
		let err = SignalError::receiver("state#1", "boom");
		assert!(matches!(SyncError::from(err), SyncError::Signal(_)));
	}

	#[rstest]
	#[case(CollaboratorFailurePolicy::Propagate, true)]
	#[case(CollaboratorFailurePolicy::Log, false)]
	fn test_settle(#[case] policy: CollaboratorFailurePolicy, #[case] is_err: bool) {
		// Arrange
		let failure: CollaboratorResult<bool> =
			Err(CollaboratorError::Validation("down".to_string()));

		// Act
		let result = settle(policy, "apply_element_style", failure);

		// Assert
		assert_eq!(result.is_err(), is_err);
		if !is_err {
			assert!(!result.unwrap());
		}
	}
}
