//! Idempotent schema bootstrap
//!
//! Runs inside `Registry::connect` after every successful dial. Each step is
//! either critical (base tables; a failure fails the connect attempt) or
//! advisory (secondary indexes, the seed settings row; a failure is logged
//! and swallowed). All DDL is create-if-absent, so connecting twice never
//! errors on existing objects and never duplicates tables.

use notewire_conf::EngineKind;

use crate::backends::EngineBackend;
use crate::error::Result;

/// Tables the core maintains for itself, excluded from sync discovery and
/// backups unless explicitly named.
pub(crate) const BOOKKEEPING_TABLES: [&str; 3] =
	["sync_history", "backup_history", "app_settings"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Severity {
	Critical,
	Advisory,
}

struct Step {
	name: &'static str,
	severity: Severity,
	sql: String,
}

/// Run the bootstrap step list against one freshly connected backend.
pub(crate) async fn run(backend: &dyn EngineBackend) -> Result<()> {
	for step in steps(backend.kind()) {
		match backend.run(&step.sql, Vec::new()).await {
			Ok(_) => {}
			Err(err) if step.severity == Severity::Advisory => {
				tracing::warn!(
					engine = %backend.kind(),
					step = step.name,
					error = %err,
					"advisory bootstrap step failed"
				);
			}
			Err(err) => {
				tracing::error!(
					engine = %backend.kind(),
					step = step.name,
					error = %err,
					"critical bootstrap step failed"
				);
				return Err(err);
			}
		}
	}
	Ok(())
}

fn steps(kind: EngineKind) -> Vec<Step> {
	let (pk, bool_ty, ts_ty) = match kind {
		EngineKind::Postgres => ("SERIAL PRIMARY KEY", "BOOLEAN", "TIMESTAMPTZ"),
		EngineKind::Sqlite => ("INTEGER PRIMARY KEY AUTOINCREMENT", "INTEGER", "TEXT"),
		EngineKind::Mysql => ("INT AUTO_INCREMENT PRIMARY KEY", "TINYINT(1)", "DATETIME"),
	};

	let mut steps = vec![
		Step {
			name: "create users",
			severity: Severity::Critical,
			sql: format!(
				"CREATE TABLE IF NOT EXISTS users ( \
				 id {pk}, \
				 username VARCHAR(190) NOT NULL UNIQUE, \
				 password_hash TEXT NOT NULL, \
				 email VARCHAR(190) NOT NULL UNIQUE, \
				 created_at {ts_ty} NOT NULL )"
			),
		},
		Step {
			name: "create notes",
			severity: Severity::Critical,
			sql: format!(
				"CREATE TABLE IF NOT EXISTS notes ( \
				 id {pk}, \
				 user_id INTEGER NOT NULL, \
				 title TEXT NOT NULL, \
				 content TEXT NOT NULL, \
				 created_at {ts_ty} NOT NULL, \
				 updated_at {ts_ty} NOT NULL )"
			),
		},
		Step {
			name: "create sync_history",
			severity: Severity::Critical,
			sql: format!(
				"CREATE TABLE IF NOT EXISTS sync_history ( \
				 id {pk}, \
				 direction VARCHAR(64) NOT NULL, \
				 status VARCHAR(16) NOT NULL, \
				 error_message TEXT, \
				 affected_rows INTEGER NOT NULL, \
				 sync_time {ts_ty} NOT NULL )"
			),
		},
		Step {
			name: "create backup_history",
			severity: Severity::Critical,
			sql: format!(
				"CREATE TABLE IF NOT EXISTS backup_history ( \
				 id {pk}, \
				 db_type VARCHAR(16) NOT NULL, \
				 file_path TEXT NOT NULL, \
				 file_size_bytes INTEGER NOT NULL, \
				 status VARCHAR(16) NOT NULL, \
				 error_message TEXT, \
				 backup_time {ts_ty} NOT NULL )"
			),
		},
		Step {
			name: "create app_settings",
			severity: Severity::Critical,
			sql: format!(
				"CREATE TABLE IF NOT EXISTS app_settings ( \
				 id {pk}, \
				 auto_sync_enabled {bool_ty} NOT NULL, \
				 sync_interval_minutes INTEGER NOT NULL, \
				 last_sync_time {ts_ty}, \
				 next_sync_time {ts_ty} )"
			),
		},
	];

	for (index_name, table, column) in [
		("idx_notes_user_id", "notes", "user_id"),
		("idx_notes_updated_at", "notes", "updated_at"),
		("idx_sync_history_sync_time", "sync_history", "sync_time"),
	] {
		// MySQL has no CREATE INDEX IF NOT EXISTS; the duplicate-index error
		// on reconnect is advisory and swallowed.
		let sql = match kind {
			EngineKind::Mysql => format!("CREATE INDEX {index_name} ON {table} ({column})"),
			_ => format!("CREATE INDEX IF NOT EXISTS {index_name} ON {table} ({column})"),
		};
		steps.push(Step {
			name: "create index",
			severity: Severity::Advisory,
			sql,
		});
	}

	let seed = match kind {
		EngineKind::Mysql => {
			"INSERT INTO app_settings (auto_sync_enabled, sync_interval_minutes) \
			 SELECT 0, 60 FROM DUAL \
			 WHERE NOT EXISTS (SELECT 1 FROM app_settings)"
		}
		EngineKind::Postgres => {
			"INSERT INTO app_settings (auto_sync_enabled, sync_interval_minutes) \
			 SELECT FALSE, 60 \
			 WHERE NOT EXISTS (SELECT 1 FROM app_settings)"
		}
		EngineKind::Sqlite => {
			"INSERT INTO app_settings (auto_sync_enabled, sync_interval_minutes) \
			 SELECT 0, 60 \
			 WHERE NOT EXISTS (SELECT 1 FROM app_settings)"
		}
	};
	steps.push(Step {
		name: "seed app_settings",
		severity: Severity::Advisory,
		sql: seed.to_string(),
	});

	steps
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn every_engine_has_the_full_step_list() {
		for kind in EngineKind::PRIORITY {
			let steps = steps(kind);
			let critical = steps.iter().filter(|s| s.severity == Severity::Critical).count();
			// Five base tables are critical; indexes and the seed row are not.
			assert_eq!(critical, 5, "engine {kind}");
			assert!(steps.iter().all(|s| !s.sql.is_empty()));
		}
	}

	#[test]
	fn base_tables_are_create_if_absent() {
		for step in steps(EngineKind::Sqlite) {
			if step.severity == Severity::Critical {
				assert!(step.sql.starts_with("CREATE TABLE IF NOT EXISTS"));
			}
		}
	}
}
