//! The `Database` entry type
//!
//! Ties the registry, executor, dual-write coordinator, synchronizer,
//! stores, and audit surfaces together behind the query-execution contract
//! the application flows consume.

use chrono::{DateTime, Utc};
use notewire_conf::{EngineKind, Settings};
use std::path::Path;
use std::sync::Arc;

use crate::autosync::AutoSync;
use crate::backup::{BackupManager, BackupReport};
use crate::context::QueryContext;
use crate::dualwrite::DualWriteCoordinator;
use crate::error::{DatabaseError, Result};
use crate::executor::Executor;
use crate::history::{HistoryStore, RecordStatus, SyncRecord};
use crate::registry::Registry;
use crate::store::{NoteStore, UserStore};
use crate::sync::{SyncOutcome, SyncPhase, Synchronizer};
use crate::types::{ExecOutcome, Params};

pub struct Database {
	registry: Arc<Registry>,
	executor: Arc<Executor>,
	coordinator: Arc<DualWriteCoordinator>,
	synchronizer: Synchronizer,
	history: Arc<HistoryStore>,
	autosync: AutoSync,
	backup: BackupManager,
	users: UserStore,
	notes: NoteStore,
}

impl Database {
	pub fn new(settings: Settings) -> Self {
		let registry = Arc::new(Registry::new(settings));
		let executor = Arc::new(Executor::new(registry.clone()));
		let coordinator = Arc::new(DualWriteCoordinator::new(registry.clone(), executor.clone()));
		let history = Arc::new(HistoryStore::new(executor.clone(), coordinator.clone()));
		Self {
			autosync: AutoSync::new(executor.clone(), coordinator.clone()),
			backup: BackupManager::new(registry.clone(), history.clone()),
			users: UserStore::new(executor.clone(), coordinator.clone()),
			notes: NoteStore::new(executor.clone(), coordinator.clone()),
			synchronizer: Synchronizer::new(),
			history,
			coordinator,
			executor,
			registry,
		}
	}

	/// Connect to one engine, or walk the priority list when none is named.
	/// Returns the engine that connected.
	pub async fn connect(&self, kind: Option<EngineKind>) -> Result<EngineKind> {
		match kind {
			Some(kind) => {
				self.registry.connect(kind).await?;
				Ok(kind)
			}
			None => self.registry.connect_default().await,
		}
	}

	/// Execute one logical query on the context's engine.
	pub async fn execute(
		&self,
		ctx: &QueryContext,
		sql: &str,
		params: &Params,
		fetch: bool,
	) -> Result<ExecOutcome> {
		self.executor.execute(ctx, sql, params, fetch).await
	}

	/// Execute one logical mutation on both engines (dual-write).
	pub async fn execute_on_both(
		&self,
		ctx: &QueryContext,
		sql: &str,
		params: &Params,
		fetch: bool,
	) -> Result<ExecOutcome> {
		self.coordinator.execute_on_both(ctx, sql, params, fetch).await
	}

	/// Reconcile `tables` (all user tables when empty) from `source` onto
	/// `target`, defaulting to primary → secondary. Appends a `SyncRecord`
	/// and, on a fully successful pass, advances the auto-sync timestamps.
	pub async fn sync(
		&self,
		ctx: &QueryContext,
		source: Option<EngineKind>,
		target: Option<EngineKind>,
		tables: &[String],
	) -> Result<SyncOutcome> {
		let source = source
			.or_else(|| self.registry.primary_kind())
			.ok_or_else(|| DatabaseError::ConfigError("no source engine configured".into()))?;
		let target = target
			.or_else(|| {
				let secondary = self.registry.secondary_kind();
				if secondary == Some(source) {
					self.registry.primary_kind()
				} else {
					secondary
				}
			})
			.ok_or_else(|| DatabaseError::ConfigError("no target engine configured".into()))?;
		if source == target {
			return Err(DatabaseError::ConfigError(
				"sync source and target are the same engine".into(),
			));
		}

		let now = Utc::now();
		let result = self.run_sync_pass(source, target, tables).await;

		let record = sync_record_for(source, target, now, &result);
		if let Err(err) = self.history.record_sync(ctx, &record).await {
			tracing::warn!(error = %err, "failed to append sync history record");
		}

		let outcome = result?;
		if self.registry.settings().logging {
			tracing::info!(
				%source,
				%target,
				synced = outcome.synced.len(),
				failed = outcome.failed.len(),
				rows = outcome.rows_copied,
				"sync pass finished"
			);
		}
		Ok(outcome)
	}

	/// Acquire both handles and run one reconciliation pass. Split out so a
	/// connect failure still gets a history record in [`Database::sync`].
	async fn run_sync_pass(
		&self,
		source: EngineKind,
		target: EngineKind,
		tables: &[String],
	) -> Result<SyncOutcome> {
		let source_handle = self.registry.get_or_reconnect(source).await?;
		let target_handle = self.registry.get_or_reconnect(target).await?;
		self.synchronizer
			.sync_between(source_handle.as_ref(), target_handle.as_ref(), tables)
			.await
	}

	/// Run a full primary → secondary sync when the auto-sync schedule says
	/// one is due. Returns the outcome when a pass ran.
	pub async fn auto_sync_if_due(&self, ctx: &QueryContext) -> Result<Option<SyncOutcome>> {
		let now = Utc::now();
		let schedule = self.autosync.load(ctx).await?;
		if !schedule.is_due(now) {
			return Ok(None);
		}
		let outcome = self.sync(ctx, None, None, &[]).await?;
		self.autosync.mark_run(ctx, now, outcome.is_complete()).await?;
		Ok(Some(outcome))
	}

	/// Dump one engine's user tables to a `.sql` file in `directory`.
	pub async fn backup(
		&self,
		ctx: &QueryContext,
		kind: EngineKind,
		directory: &Path,
	) -> Result<BackupReport> {
		self.backup.backup(ctx, kind, directory).await
	}

	/// True only when both primary and secondary connections are live.
	pub async fn has_dual(&self) -> bool {
		self.registry.has_dual().await
	}

	/// The engine single-target calls currently resolve to.
	pub fn current_engine(&self) -> Option<EngineKind> {
		self.registry.default_engine()
	}

	/// Where a running sync pass currently is.
	pub fn sync_phase(&self) -> SyncPhase {
		self.synchronizer.phase()
	}

	pub fn users(&self) -> &UserStore {
		&self.users
	}

	pub fn notes(&self) -> &NoteStore {
		&self.notes
	}

	pub fn history(&self) -> &HistoryStore {
		&self.history
	}

	pub fn autosync(&self) -> &AutoSync {
		&self.autosync
	}

	pub fn registry(&self) -> &Arc<Registry> {
		&self.registry
	}

	/// Idempotent teardown: closes every pool exactly once.
	pub async fn close(&self) {
		self.registry.close_all().await;
	}
}

/// The audit row for one sync attempt: a complete pass records success, a
/// pass with failed tables records partial, a pass that never ran records
/// failure.
fn sync_record_for(
	source: EngineKind,
	target: EngineKind,
	now: DateTime<Utc>,
	result: &Result<SyncOutcome>,
) -> SyncRecord {
	match result {
		Ok(outcome) => SyncRecord {
			direction: format!("{source}->{target}"),
			status: if outcome.is_complete() {
				RecordStatus::Success
			} else {
				RecordStatus::Partial
			},
			error_message: outcome.failed.first().map(|(table, err)| format!("{table}: {err}")),
			affected_rows: outcome.rows_copied,
			sync_time: now,
		},
		Err(err) => SyncRecord {
			direction: format!("{source}->{target}"),
			status: RecordStatus::Failed,
			error_message: Some(err.to_string()),
			affected_rows: 0,
			sync_time: now,
		},
	}
}
