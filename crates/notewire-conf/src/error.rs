//! Settings error type

use thiserror::Error;

/// Errors raised while loading or interpreting settings.
#[derive(Debug, Error)]
pub enum SettingsError {
	#[error("failed to read settings file: {0}")]
	Io(#[from] std::io::Error),

	#[error("failed to parse settings file: {0}")]
	Parse(#[from] toml::de::Error),

	#[error("unknown database engine: {0}")]
	UnknownEngine(String),

	#[error("engine {0} is not configured")]
	NotConfigured(String),

	#[error("invalid setting: {0}")]
	Invalid(String),
}
