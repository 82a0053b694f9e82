//! Form model, events, validator rules, coercion and settings.
//!
//! # Examples
//!
//! ```rust
//! # #[cfg(feature = "core")]
//! use formsync::core::settings::SyncSettings;
//! # #[cfg(feature = "core")]
//! use formsync::core::validators::ValidationGroupRegistry;
//! ```

#[cfg(feature = "core")]
pub use formsync_core::*;
