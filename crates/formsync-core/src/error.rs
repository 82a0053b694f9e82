//! Errors reported by collaborators of a bound control

use crate::validators::RuleError;

/// Failure of an external collaborator (content lookup, validation
/// utilities or transport)
#[derive(Debug, thiserror::Error)]
pub enum CollaboratorError {
	#[error("Content lookup failed: {0}")]
	ContentLookup(String),

	#[error("Validation utilities failed: {0}")]
	Validation(String),

	#[error("Transport failed: {0}")]
	Transport(String),

	#[error("Invalid constraint: {0}")]
	InvalidConstraint(#[from] RuleError),
}

/// Result type for collaborator calls
pub type CollaboratorResult<T> = Result<T, CollaboratorError>;

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_invalid_pattern_converts() {
		// Arrange
		let rule_error = crate::validators::ValidatorRule::pattern("(").unwrap_err();

		// Act
		let error = CollaboratorError::from(rule_error);

		// Assert
		assert!(matches!(error, CollaboratorError::InvalidConstraint(RuleError::InvalidPattern(_))));
		assert!(error.to_string().starts_with("Invalid constraint: invalid pattern"));
	}
}
