//! Database engine identifiers
//!
//! The set of engines is fixed; adding one means writing a new dialect
//! backend in `notewire-db` and extending this enum.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::SettingsError;

/// The database engines Notewire can talk to.
///
/// PostgreSQL is the preferred server engine, SQLite the embedded file
/// fallback, MySQL an optional third backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
	Postgres,
	Sqlite,
	Mysql,
}

impl EngineKind {
	/// The fixed fallback order used when no explicit priority is configured.
	pub const PRIORITY: [EngineKind; 3] = [EngineKind::Postgres, EngineKind::Sqlite, EngineKind::Mysql];

	/// Stable lowercase name, used in settings files, URLs, and audit rows.
	pub fn as_str(&self) -> &'static str {
		match self {
			EngineKind::Postgres => "postgres",
			EngineKind::Sqlite => "sqlite",
			EngineKind::Mysql => "mysql",
		}
	}
}

impl fmt::Display for EngineKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for EngineKind {
	type Err = SettingsError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"postgres" | "postgresql" => Ok(EngineKind::Postgres),
			"sqlite" | "sqlite3" => Ok(EngineKind::Sqlite),
			"mysql" | "mariadb" => Ok(EngineKind::Mysql),
			other => Err(SettingsError::UnknownEngine(other.to_string())),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case("postgres", EngineKind::Postgres)]
	#[case("PostgreSQL", EngineKind::Postgres)]
	#[case("sqlite3", EngineKind::Sqlite)]
	#[case("mariadb", EngineKind::Mysql)]
	fn parses_engine_aliases(#[case] input: &str, #[case] expected: EngineKind) {
		assert_eq!(input.parse::<EngineKind>().unwrap(), expected);
	}

	#[test]
	fn rejects_unknown_engine() {
		assert!(matches!(
			"oracle".parse::<EngineKind>(),
			Err(SettingsError::UnknownEngine(_))
		));
	}

	#[test]
	fn priority_starts_with_postgres() {
		assert_eq!(EngineKind::PRIORITY[0], EngineKind::Postgres);
		assert_eq!(EngineKind::PRIORITY[1], EngineKind::Sqlite);
	}

	#[test]
	fn display_matches_as_str() {
		assert_eq!(EngineKind::Sqlite.to_string(), "sqlite");
	}
}
