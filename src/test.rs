//! Testing utilities: fixtures, collaborator mocks and log capture.

#[cfg(feature = "test")]
pub use formsync_test::*;
