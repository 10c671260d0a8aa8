//! Auto-sync scheduling state
//!
//! The `app_settings` row drives periodic primary→secondary reconciliation.
//! No background task is spawned; the caller's request cycle asks
//! [`crate::Database::auto_sync_if_due`] whether a pass is due. `last_run`
//! only advances on a fully successful pass, so staleness stays visible.

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

use crate::context::QueryContext;
use crate::dualwrite::DualWriteCoordinator;
use crate::error::{DatabaseError, Result};
use crate::executor::Executor;
use crate::types::Params;

/// The persisted auto-sync settings row.
#[derive(Debug, Clone, PartialEq)]
pub struct AutoSyncSettings {
	pub enabled: bool,
	pub interval_minutes: i64,
	pub last_run: Option<DateTime<Utc>>,
	pub next_run: Option<DateTime<Utc>>,
}

impl AutoSyncSettings {
	/// Whether a pass should run at `now`. A never-scheduled enabled
	/// configuration is immediately due.
	pub fn is_due(&self, now: DateTime<Utc>) -> bool {
		self.enabled && self.next_run.is_none_or(|next| now >= next)
	}

	/// The next due time after a pass at `now`.
	pub fn next_after(&self, now: DateTime<Utc>) -> DateTime<Utc> {
		now + Duration::minutes(self.interval_minutes.max(1))
	}
}

pub struct AutoSync {
	executor: Arc<Executor>,
	coordinator: Arc<DualWriteCoordinator>,
}

impl AutoSync {
	pub fn new(executor: Arc<Executor>, coordinator: Arc<DualWriteCoordinator>) -> Self {
		Self { executor, coordinator }
	}

	/// Read the settings row from the context's engine.
	pub async fn load(&self, ctx: &QueryContext) -> Result<AutoSyncSettings> {
		let rows = self
			.executor
			.execute(
				ctx,
				"SELECT auto_sync_enabled, sync_interval_minutes, last_sync_time, next_sync_time \
				 FROM app_settings ORDER BY id LIMIT 1",
				&Params::none(),
				true,
			)
			.await?
			.into_rows();
		let row = rows
			.first()
			.ok_or_else(|| DatabaseError::QueryError {
				message: "app_settings row missing".to_string(),
				code: None,
			})?;
		Ok(AutoSyncSettings {
			enabled: row.get("auto_sync_enabled")?,
			interval_minutes: row.get("sync_interval_minutes")?,
			last_run: row.get_opt("last_sync_time")?,
			next_run: row.get_opt("next_sync_time")?,
		})
	}

	/// Update the schedule on both stores.
	pub async fn configure(
		&self,
		ctx: &QueryContext,
		enabled: bool,
		interval_minutes: i64,
	) -> Result<()> {
		let params = Params::positional([
			crate::types::QueryValue::from(enabled),
			interval_minutes.into(),
		]);
		self.coordinator
			.execute_on_both(
				ctx,
				"UPDATE app_settings SET auto_sync_enabled = ?, sync_interval_minutes = ?",
				&params,
				false,
			)
			.await?;
		Ok(())
	}

	/// Advance the schedule after a pass at `now`; `complete` gates the
	/// `last_sync_time` update.
	pub async fn mark_run(
		&self,
		ctx: &QueryContext,
		now: DateTime<Utc>,
		complete: bool,
	) -> Result<()> {
		let settings = self.load(ctx).await?;
		let next = settings.next_after(now);
		if complete {
			let params = Params::positional([
				crate::types::QueryValue::from(now),
				next.into(),
			]);
			self.coordinator
				.execute_on_both(
					ctx,
					"UPDATE app_settings SET last_sync_time = ?, next_sync_time = ?",
					&params,
					false,
				)
				.await?;
		} else {
			let params = Params::positional([crate::types::QueryValue::from(next)]);
			self.coordinator
				.execute_on_both(
					ctx,
					"UPDATE app_settings SET next_sync_time = ?",
					&params,
					false,
				)
				.await?;
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::TimeZone;

	fn settings(enabled: bool, next_run: Option<DateTime<Utc>>) -> AutoSyncSettings {
		AutoSyncSettings {
			enabled,
			interval_minutes: 30,
			last_run: None,
			next_run,
		}
	}

	#[test]
	fn disabled_is_never_due() {
		let now = Utc::now();
		assert!(!settings(false, None).is_due(now));
	}

	#[test]
	fn enabled_with_no_schedule_is_due() {
		assert!(settings(true, None).is_due(Utc::now()));
	}

	#[test]
	fn due_only_after_next_run() {
		let next = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
		let s = settings(true, Some(next));
		assert!(!s.is_due(next - Duration::minutes(1)));
		assert!(s.is_due(next));
		assert!(s.is_due(next + Duration::minutes(5)));
	}

	#[test]
	fn next_after_adds_interval() {
		let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
		let s = settings(true, None);
		assert_eq!(s.next_after(now), now + Duration::minutes(30));
	}

	#[test]
	fn zero_interval_still_advances() {
		let now = Utc::now();
		let mut s = settings(true, None);
		s.interval_minutes = 0;
		assert!(s.next_after(now) > now);
	}
}
