//! Engine settings
//!
//! Settings can be built in code, loaded from a TOML document, and overlaid
//! with environment variables:
//!
//! ```
//! use formsync_core::settings::{CollaboratorFailurePolicy, SyncSettings};
//!
//! let settings = SyncSettings::from_toml_str(r#"
//!     failure_policy = "log"
//!
//!     [coercion]
//!     date_aliases = ["Calendar", "DateTime"]
//! "#)
//! .unwrap();
//!
//! assert_eq!(settings.failure_policy, CollaboratorFailurePolicy::Log);
//! assert_eq!(settings.transport.state_change_kind, "state");
//! ```

use crate::coercion::CoercionRegistry;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable selecting the failure policy
pub const ENV_FAILURE_POLICY: &str = "FORMSYNC_FAILURE_POLICY";
/// Environment variable listing date aliases, comma separated
pub const ENV_DATE_ALIASES: &str = "FORMSYNC_DATE_ALIASES";
/// Environment variable overriding the state-change kind
pub const ENV_STATE_CHANGE_KIND: &str = "FORMSYNC_STATE_CHANGE_KIND";

/// Errors raised while loading settings
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	#[error("TOML error: {0}")]
	Toml(#[from] toml::de::Error),

	#[error("Invalid setting: {0}")]
	Invalid(String),
}

/// What to do when a collaborator call fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollaboratorFailurePolicy {
	/// Return the failure to the caller of the triggering operation
	#[default]
	Propagate,
	/// Log the failure at `warn` and continue with a neutral result
	Log,
}

impl std::str::FromStr for CollaboratorFailurePolicy {
	type Err = SettingsError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"propagate" => Ok(Self::Propagate),
			"log" => Ok(Self::Log),
			other => Err(SettingsError::Invalid(format!(
				"unknown failure policy `{}`",
				other
			))),
		}
	}
}

/// Coercion configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoercionSettings {
	/// Type discriminators whose leaf states are parsed as dates
	#[serde(default = "default_date_aliases")]
	pub date_aliases: Vec<String>,
}

fn default_date_aliases() -> Vec<String> {
	vec!["Calendar".to_string()]
}

impl Default for CoercionSettings {
	fn default() -> Self {
		Self {
			date_aliases: default_date_aliases(),
		}
	}
}

impl CoercionSettings {
	/// Build the coercion registry described by these settings
	pub fn registry(&self) -> CoercionRegistry {
		CoercionRegistry::with_date_aliases(self.date_aliases.iter().cloned())
	}
}

/// Transport configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportSettings {
	/// Kind passed with state-change notifications
	#[serde(default = "default_state_change_kind")]
	pub state_change_kind: String,

	/// HTTP method of side-effect actions
	#[serde(default = "default_action_method")]
	pub action_method: String,
}

fn default_state_change_kind() -> String {
	"state".to_string()
}

fn default_action_method() -> String {
	"POST".to_string()
}

impl Default for TransportSettings {
	fn default() -> Self {
		Self {
			state_change_kind: default_state_change_kind(),
			action_method: default_action_method(),
		}
	}
}

impl TransportSettings {
	/// Parsed action method
	pub fn action_method(&self) -> Result<http::Method, SettingsError> {
		http::Method::from_bytes(self.action_method.as_bytes()).map_err(|_| {
			SettingsError::Invalid(format!("invalid action method `{}`", self.action_method))
		})
	}
}

/// Top-level engine settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncSettings {
	#[serde(default)]
	pub coercion: CoercionSettings,

	#[serde(default)]
	pub transport: TransportSettings,

	#[serde(default)]
	pub failure_policy: CollaboratorFailurePolicy,
}

impl SyncSettings {
	/// Create settings with defaults
	pub fn new() -> Self {
		Self::default()
	}

	/// Set the collaborator failure policy
	pub fn with_failure_policy(mut self, policy: CollaboratorFailurePolicy) -> Self {
		self.failure_policy = policy;
		self
	}

	/// Set the aliases coerced to dates
	pub fn with_date_aliases<I, S>(mut self, aliases: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.coercion.date_aliases = aliases.into_iter().map(Into::into).collect();
		self
	}

	/// Parse settings from a TOML document and validate them
	pub fn from_toml_str(source: &str) -> Result<Self, SettingsError> {
		let settings: Self = toml::from_str(source)?;
		settings.validate()?;
		Ok(settings)
	}

	/// Load settings from a TOML file
	pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
		let path = path.as_ref();
		let source = std::fs::read_to_string(path)?;
		let settings = Self::from_toml_str(&source)?;
		tracing::debug!(path = %path.display(), "Loaded formsync settings");
		Ok(settings)
	}

	/// Load default settings overlaid with environment variables
	pub fn from_env() -> Result<Self, SettingsError> {
		Self::default().with_env_overrides()
	}

	/// Overlay environment variables on these settings
	pub fn with_env_overrides(mut self) -> Result<Self, SettingsError> {
		if let Ok(policy) = std::env::var(ENV_FAILURE_POLICY) {
			self.failure_policy = policy.parse()?;
		}

		if let Ok(aliases) = std::env::var(ENV_DATE_ALIASES) {
			self.coercion.date_aliases = aliases
				.split(',')
				.map(str::trim)
				.filter(|s| !s.is_empty())
				.map(str::to_string)
				.collect();
		}

		if let Ok(kind) = std::env::var(ENV_STATE_CHANGE_KIND) {
			self.transport.state_change_kind = kind;
		}

		self.validate()?;
		Ok(self)
	}

	/// Validate settings
	pub fn validate(&self) -> Result<(), SettingsError> {
		if self.transport.state_change_kind.trim().is_empty() {
			return Err(SettingsError::Invalid(
				"transport.state_change_kind must not be empty".to_string(),
			));
		}
		self.transport.action_method()?;
		Ok(())
	}
}
