//! Backup manager
//!
//! Dumps every user table of one engine to a timestamped `.sql` file
//! (CREATE plus batched INSERT statements with escaped literals) and
//! records the attempt in `backup_history`. A failed backup records a
//! failure row and reports the error; it is never fatal to the process.

use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::bootstrap::BOOKKEEPING_TABLES;
use crate::context::QueryContext;
use crate::error::{DatabaseError, Result};
use crate::history::{BackupRecord, HistoryStore, RecordStatus};
use crate::registry::Registry;
use crate::sync::create_table_sql;
use crate::types::QueryValue;
use notewire_conf::EngineKind;

/// Rows per INSERT statement in the dump file.
const DUMP_BATCH_SIZE: usize = 100;

/// What one successful backup produced.
#[derive(Debug, Clone)]
pub struct BackupReport {
	pub file_path: PathBuf,
	pub file_size_bytes: u64,
	pub tables: usize,
	pub rows: u64,
}

pub struct BackupManager {
	registry: Arc<Registry>,
	history: Arc<HistoryStore>,
}

impl BackupManager {
	pub fn new(registry: Arc<Registry>, history: Arc<HistoryStore>) -> Self {
		Self { registry, history }
	}

	/// Dump `kind`'s user tables into `directory`.
	pub async fn backup(
		&self,
		ctx: &QueryContext,
		kind: EngineKind,
		directory: &Path,
	) -> Result<BackupReport> {
		let started = Utc::now();
		let file_name = format!("notewire_{}_{}.sql", kind, started.format("%Y%m%d_%H%M%S"));
		let file_path = directory.join(file_name);

		match self.dump(kind, &file_path).await {
			Ok(report) => {
				let record = BackupRecord {
					db_type: kind.to_string(),
					file_path: file_path.display().to_string(),
					file_size_bytes: report.file_size_bytes,
					status: RecordStatus::Success,
					error_message: None,
					backup_time: started,
				};
				if let Err(err) = self.history.record_backup(ctx, &record).await {
					tracing::warn!(error = %err, "backup succeeded but history row failed");
				}
				Ok(report)
			}
			Err(err) => {
				let record = BackupRecord {
					db_type: kind.to_string(),
					file_path: file_path.display().to_string(),
					file_size_bytes: 0,
					status: RecordStatus::Failed,
					error_message: Some(err.to_string()),
					backup_time: started,
				};
				if let Err(history_err) = self.history.record_backup(ctx, &record).await {
					tracing::warn!(error = %history_err, "failed to record backup failure");
				}
				Err(err)
			}
		}
	}

	async fn dump(&self, kind: EngineKind, file_path: &Path) -> Result<BackupReport> {
		let backend = self.registry.get_or_reconnect(kind).await?;
		let tables: Vec<String> = backend
			.list_tables()
			.await?
			.into_iter()
			.filter(|t| !BOOKKEEPING_TABLES.contains(&t.as_str()))
			.collect();

		let mut dump = format!(
			"-- notewire backup of {} at {}\n",
			kind,
			Utc::now().to_rfc3339()
		);
		let mut total_rows = 0u64;
		for table in &tables {
			let structure = backend.table_structure(table).await?;
			dump.push_str(&create_table_sql(backend.as_ref(), table, &structure));
			dump.push_str(";\n");

			let select = format!("SELECT * FROM {}", backend.quote_identifier(table));
			let rows = backend.run(&select, Vec::new()).await?.into_rows();
			let columns = structure.column_names();
			let quoted_columns: Vec<String> =
				columns.iter().map(|c| backend.quote_identifier(c)).collect();
			for batch in rows.chunks(DUMP_BATCH_SIZE) {
				let tuples: Vec<String> = batch
					.iter()
					.map(|row| {
						let literals: Vec<String> = columns
							.iter()
							.map(|c| {
								sql_literal(row.data.get(*c).unwrap_or(&QueryValue::Null))
							})
							.collect();
						format!("({})", literals.join(", "))
					})
					.collect();
				dump.push_str(&format!(
					"INSERT INTO {} ({}) VALUES {};\n",
					backend.quote_identifier(table),
					quoted_columns.join(", "),
					tuples.join(", ")
				));
			}
			total_rows += rows.len() as u64;
		}

		tokio::fs::write(file_path, &dump)
			.await
			.map_err(|e| DatabaseError::QueryError {
				message: format!("failed to write backup file: {e}"),
				code: None,
			})?;

		Ok(BackupReport {
			file_path: file_path.to_path_buf(),
			file_size_bytes: dump.len() as u64,
			tables: tables.len(),
			rows: total_rows,
		})
	}
}

/// Render one value as a SQL literal with quotes escaped.
pub(crate) fn sql_literal(value: &QueryValue) -> String {
	match value {
		QueryValue::Null => "NULL".to_string(),
		QueryValue::Bool(b) => if *b { "1" } else { "0" }.to_string(),
		QueryValue::Int(i) => i.to_string(),
		QueryValue::Float(f) => f.to_string(),
		QueryValue::Text(s) => format!("'{}'", s.replace('\'', "''")),
		QueryValue::Bytes(b) => {
			let hex: String = b.iter().map(|byte| format!("{byte:02X}")).collect();
			format!("X'{hex}'")
		}
		QueryValue::Timestamp(dt) => format!("'{}'", dt.to_rfc3339()),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn literals_escape_quotes() {
		assert_eq!(
			sql_literal(&QueryValue::Text("it's".into())),
			"'it''s'"
		);
		assert_eq!(sql_literal(&QueryValue::Null), "NULL");
		assert_eq!(sql_literal(&QueryValue::Bool(true)), "1");
		assert_eq!(sql_literal(&QueryValue::Bytes(vec![0xAB, 0x01])), "X'AB01'");
	}
}
