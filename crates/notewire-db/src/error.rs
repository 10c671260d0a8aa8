//! Failure taxonomy for the database core
//!
//! Engine-native errors are converted here, at the lowest layer that knows
//! the driver idiom. Nothing engine-specific crosses the executor boundary;
//! callers only ever see [`DatabaseError`].

use notewire_conf::EngineKind;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DatabaseError>;

/// The single failure channel every public call reports through.
#[derive(Debug, Error)]
pub enum DatabaseError {
	/// Engine unreachable, credentials rejected, or driver unavailable.
	/// Non-fatal to the process; triggers fallback to the next engine.
	#[error("connection to {engine} failed: {message}")]
	ConnectionError { engine: EngineKind, message: String },

	/// Placeholder/parameter mismatch. Fatal to the single call.
	#[error("parameter binding failed: {0}")]
	BindError(String),

	/// The engine rejected the statement.
	#[error("query failed: {message}")]
	QueryError { message: String, code: Option<String> },

	/// A recognized unique-constraint violation, distinguished from the
	/// generic query failure so callers can report it meaningfully.
	#[error("duplicate key: {0}")]
	DuplicateKey(String),

	#[error("type conversion failed: {0}")]
	TypeError(String),

	#[error("column not found: {0}")]
	ColumnNotFound(String),

	#[error("operation not supported: {0}")]
	NotSupported(String),

	#[error("configuration error: {0}")]
	ConfigError(String),
}

impl From<notewire_conf::SettingsError> for DatabaseError {
	fn from(err: notewire_conf::SettingsError) -> Self {
		DatabaseError::ConfigError(err.to_string())
	}
}

impl DatabaseError {
	/// Convert a driver error into the house taxonomy.
	pub(crate) fn from_sqlx(err: sqlx::Error) -> Self {
		match err {
			sqlx::Error::Database(db) => {
				let code = db.code().map(|c| c.to_string());
				let message = db.message().to_string();
				if is_unique_violation(code.as_deref(), &message) {
					DatabaseError::DuplicateKey(message)
				} else {
					DatabaseError::QueryError { message, code }
				}
			}
			sqlx::Error::ColumnNotFound(name) => DatabaseError::ColumnNotFound(name),
			other => DatabaseError::QueryError {
				message: other.to_string(),
				code: None,
			},
		}
	}

	/// Convert a driver dial failure, tagged with the engine being dialed.
	pub(crate) fn connect(engine: EngineKind, err: sqlx::Error) -> Self {
		DatabaseError::ConnectionError {
			engine,
			message: err.to_string(),
		}
	}
}

/// Unique-violation codes: PostgreSQL 23505, SQLite 1555/2067, MySQL 1062.
pub(crate) fn is_unique_violation(code: Option<&str>, message: &str) -> bool {
	matches!(code, Some("23505") | Some("1555") | Some("2067") | Some("1062"))
		|| message.contains("UNIQUE constraint failed")
		|| message.contains("Duplicate entry")
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case(Some("23505"), "duplicate key value violates unique constraint", true)]
	#[case(Some("2067"), "UNIQUE constraint failed: users.username", true)]
	#[case(Some("1062"), "Duplicate entry 'alice' for key 'username'", true)]
	#[case(Some("42601"), "syntax error at or near SELECT", false)]
	#[case(None, "no such table: missing", false)]
	fn recognizes_unique_violations(
		#[case] code: Option<&str>,
		#[case] message: &str,
		#[case] expected: bool,
	) {
		assert_eq!(is_unique_violation(code, message), expected);
	}

	#[test]
	fn settings_errors_become_config_errors() {
		let err: DatabaseError = notewire_conf::SettingsError::NotConfigured("mysql".into()).into();
		assert!(matches!(err, DatabaseError::ConfigError(_)));
	}
}
