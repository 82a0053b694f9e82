//! Control handles, bindings, validation rebinding and change propagation.
//!
//! # Examples
//!
//! ```rust
//! # #[cfg(feature = "forms")]
//! use formsync::forms::{ControlBinding, ControlHandle, PathResolver};
//! ```

#[cfg(feature = "forms")]
pub use formsync_forms::*;
