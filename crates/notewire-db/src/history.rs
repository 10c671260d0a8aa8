//! Sync and backup audit history
//!
//! Append-only records written after every sync/backup attempt, plus the
//! newest-first accessors the admin surface lists them with. Records are
//! written through the dual-write coordinator so both stores stay current.

use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::context::QueryContext;
use crate::dualwrite::DualWriteCoordinator;
use crate::error::Result;
use crate::executor::Executor;
use crate::types::{Params, Row};

/// Outcome classification for audit rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordStatus {
	Success,
	Partial,
	Failed,
}

impl RecordStatus {
	pub fn as_str(&self) -> &'static str {
		match self {
			RecordStatus::Success => "success",
			RecordStatus::Partial => "partial",
			RecordStatus::Failed => "failed",
		}
	}

	fn parse(s: &str) -> Self {
		match s {
			"success" => RecordStatus::Success,
			"partial" => RecordStatus::Partial,
			_ => RecordStatus::Failed,
		}
	}
}

/// One sync attempt. Never mutated after insert.
#[derive(Debug, Clone)]
pub struct SyncRecord {
	pub direction: String,
	pub status: RecordStatus,
	pub error_message: Option<String>,
	pub affected_rows: u64,
	pub sync_time: DateTime<Utc>,
}

/// One backup attempt.
#[derive(Debug, Clone)]
pub struct BackupRecord {
	pub db_type: String,
	pub file_path: String,
	pub file_size_bytes: u64,
	pub status: RecordStatus,
	pub error_message: Option<String>,
	pub backup_time: DateTime<Utc>,
}

pub struct HistoryStore {
	executor: Arc<Executor>,
	coordinator: Arc<DualWriteCoordinator>,
}

impl HistoryStore {
	pub fn new(executor: Arc<Executor>, coordinator: Arc<DualWriteCoordinator>) -> Self {
		Self { executor, coordinator }
	}

	pub async fn record_sync(&self, ctx: &QueryContext, record: &SyncRecord) -> Result<()> {
		let params = Params::positional([
			crate::types::QueryValue::from(record.direction.as_str()),
			record.status.as_str().into(),
			record.error_message.clone().into(),
			(record.affected_rows as i64).into(),
			record.sync_time.into(),
		]);
		self.coordinator
			.execute_on_both(
				ctx,
				"INSERT INTO sync_history (direction, status, error_message, affected_rows, sync_time) \
				 VALUES (?, ?, ?, ?, ?)",
				&params,
				false,
			)
			.await?;
		Ok(())
	}

	pub async fn record_backup(&self, ctx: &QueryContext, record: &BackupRecord) -> Result<()> {
		let params = Params::positional([
			crate::types::QueryValue::from(record.db_type.as_str()),
			record.file_path.as_str().into(),
			(record.file_size_bytes as i64).into(),
			record.status.as_str().into(),
			record.error_message.clone().into(),
			record.backup_time.into(),
		]);
		self.coordinator
			.execute_on_both(
				ctx,
				"INSERT INTO backup_history (db_type, file_path, file_size_bytes, status, error_message, backup_time) \
				 VALUES (?, ?, ?, ?, ?, ?)",
				&params,
				false,
			)
			.await?;
		Ok(())
	}

	/// Most recent sync attempts, newest first.
	pub async fn recent_syncs(&self, ctx: &QueryContext, limit: u32) -> Result<Vec<SyncRecord>> {
		let params = Params::positional([limit as i64]);
		let rows = self
			.executor
			.execute(
				ctx,
				"SELECT direction, status, error_message, affected_rows, sync_time \
				 FROM sync_history ORDER BY sync_time DESC, id DESC LIMIT ?",
				&params,
				true,
			)
			.await?
			.into_rows();
		rows.iter().map(row_to_sync_record).collect()
	}

	/// Most recent backup attempts, newest first.
	pub async fn recent_backups(&self, ctx: &QueryContext, limit: u32) -> Result<Vec<BackupRecord>> {
		let params = Params::positional([limit as i64]);
		let rows = self
			.executor
			.execute(
				ctx,
				"SELECT db_type, file_path, file_size_bytes, status, error_message, backup_time \
				 FROM backup_history ORDER BY backup_time DESC, id DESC LIMIT ?",
				&params,
				true,
			)
			.await?
			.into_rows();
		rows.iter().map(row_to_backup_record).collect()
	}
}

fn row_to_sync_record(row: &Row) -> Result<SyncRecord> {
	Ok(SyncRecord {
		direction: row.get("direction")?,
		status: RecordStatus::parse(&row.get::<String>("status")?),
		error_message: row.get_opt("error_message")?,
		affected_rows: row.get::<i64>("affected_rows")? as u64,
		sync_time: row.get("sync_time")?,
	})
}

fn row_to_backup_record(row: &Row) -> Result<BackupRecord> {
	Ok(BackupRecord {
		db_type: row.get("db_type")?,
		file_path: row.get("file_path")?,
		file_size_bytes: row.get::<i64>("file_size_bytes")? as u64,
		status: RecordStatus::parse(&row.get::<String>("status")?),
		error_message: row.get_opt("error_message")?,
		backup_time: row.get("backup_time")?,
	})
}
