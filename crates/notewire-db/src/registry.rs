//! Connection registry
//!
//! Owns at most one live handle per engine kind, dials engines lazily,
//! validates cached handles with a `SELECT 1` probe before reuse, and tracks
//! the default engine — the first one to connect successfully. The fallback
//! chain is one explicit loop over the configured priority list, with a
//! per-engine diagnostic report accumulated along the way.

use notewire_conf::{EngineKind, Settings};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::backends::{EngineBackend, MysqlBackend, PostgresBackend, SqliteBackend};
use crate::bootstrap;
use crate::error::{DatabaseError, Result};

/// One entry in the fallback diagnostic report.
#[derive(Debug, Clone)]
pub struct FallbackAttempt {
	pub engine: EngineKind,
	pub error: Option<String>,
}

/// What happened while walking the priority list.
#[derive(Debug, Clone, Default)]
pub struct FallbackReport {
	pub attempts: Vec<FallbackAttempt>,
	pub selected: Option<EngineKind>,
}

impl FallbackReport {
	fn describe(&self) -> String {
		self.attempts
			.iter()
			.map(|a| match &a.error {
				Some(err) => format!("{}: {}", a.engine, err),
				None => format!("{}: ok", a.engine),
			})
			.collect::<Vec<_>>()
			.join("; ")
	}
}

/// Process-wide connection owner. Handles are borrowed by the executor for
/// the duration of one call and never retained.
pub struct Registry {
	settings: Settings,
	handles: RwLock<HashMap<EngineKind, Arc<dyn EngineBackend>>>,
	default_engine: parking_lot::RwLock<Option<EngineKind>>,
}

impl Registry {
	pub fn new(settings: Settings) -> Self {
		Self {
			settings,
			handles: RwLock::new(HashMap::new()),
			default_engine: parking_lot::RwLock::new(None),
		}
	}

	pub fn settings(&self) -> &Settings {
		&self.settings
	}

	/// The engine single-target calls resolve to when the context names none.
	pub fn default_engine(&self) -> Option<EngineKind> {
		*self.default_engine.read()
	}

	/// First configured engine in priority order.
	pub fn primary_kind(&self) -> Option<EngineKind> {
		self.settings.configured_priority().first().copied()
	}

	/// Second configured engine in priority order.
	pub fn secondary_kind(&self) -> Option<EngineKind> {
		self.settings.configured_priority().get(1).copied()
	}

	/// Dial one engine, run schema bootstrap, and publish the handle.
	///
	/// Replaces (and closes) any previous handle for the same kind, so at
	/// most one handle per kind exists at a time.
	pub async fn connect(&self, kind: EngineKind) -> Result<Arc<dyn EngineBackend>> {
		let handle = self.dial(kind).await?;
		let connection_id = Uuid::new_v4();

		if let Err(err) = bootstrap::run(handle.as_ref()).await {
			handle.close().await;
			return Err(err);
		}

		let replaced = self.handles.write().await.insert(kind, handle.clone());
		if let Some(old) = replaced {
			old.close().await;
		}

		let mut default = self.default_engine.write();
		if default.is_none() {
			*default = Some(kind);
		}
		drop(default);

		if self.settings.logging {
			tracing::info!(engine = %kind, %connection_id, "engine connected");
		}
		Ok(handle)
	}

	async fn dial(&self, kind: EngineKind) -> Result<Arc<dyn EngineBackend>> {
		match kind {
			EngineKind::Postgres => {
				let url = self.settings.url(kind)?;
				Ok(Arc::new(PostgresBackend::connect(&url, &self.settings.pool).await?))
			}
			EngineKind::Sqlite => {
				let path = self
					.settings
					.sqlite_path()
					.ok_or_else(|| DatabaseError::ConfigError("sqlite path not configured".into()))?;
				Ok(Arc::new(SqliteBackend::connect(path, &self.settings.pool).await?))
			}
			EngineKind::Mysql => {
				let url = self.settings.url(kind)?;
				Ok(Arc::new(MysqlBackend::connect(&url, &self.settings.pool).await?))
			}
		}
	}

	/// Walk the priority list until one engine connects.
	pub async fn connect_with_report(&self) -> FallbackReport {
		let mut report = FallbackReport::default();
		for kind in self.settings.configured_priority() {
			match self.connect(kind).await {
				Ok(_) => {
					report.attempts.push(FallbackAttempt { engine: kind, error: None });
					report.selected = Some(kind);
					break;
				}
				Err(err) => {
					tracing::warn!(engine = %kind, error = %err, "engine unavailable, trying next");
					report.attempts.push(FallbackAttempt {
						engine: kind,
						error: Some(err.to_string()),
					});
				}
			}
		}
		report
	}

	/// First-success-wins connect over the priority list.
	pub async fn connect_default(&self) -> Result<EngineKind> {
		let report = self.connect_with_report().await;
		report.selected.ok_or_else(|| DatabaseError::ConnectionError {
			engine: self.primary_kind().unwrap_or(EngineKind::Sqlite),
			message: format!("no engine available ({})", report.describe()),
		})
	}

	/// The cached handle for `kind`, if one is live.
	pub async fn handle(&self, kind: EngineKind) -> Option<Arc<dyn EngineBackend>> {
		self.handles.read().await.get(&kind).cloned()
	}

	/// Cached handle, validated with a liveness probe; on probe failure the
	/// handle is evicted and one transparent reconnect is attempted.
	pub async fn get_or_reconnect(&self, kind: EngineKind) -> Result<Arc<dyn EngineBackend>> {
		let cached = self.handles.read().await.get(&kind).cloned();
		if let Some(handle) = cached {
			match handle.ping().await {
				Ok(()) => return Ok(handle),
				Err(err) => {
					tracing::warn!(engine = %kind, error = %err, "liveness probe failed, reconnecting");
					self.evict(kind).await;
				}
			}
		}
		match self.connect(kind).await {
			Ok(handle) => Ok(handle),
			Err(err) => {
				self.repoint_default(kind).await;
				Err(err)
			}
		}
	}

	async fn evict(&self, kind: EngineKind) {
		if let Some(old) = self.handles.write().await.remove(&kind) {
			old.close().await;
		}
	}

	/// Keep the default engine pointing at a live handle after `kind` went
	/// away and could not be re-dialed.
	async fn repoint_default(&self, kind: EngineKind) {
		let fallback = {
			let handles = self.handles.read().await;
			self.settings
				.configured_priority()
				.into_iter()
				.find(|k| handles.contains_key(k))
		};
		let mut default = self.default_engine.write();
		if *default == Some(kind) {
			*default = fallback;
		}
	}

	/// Connect primary and secondary independently. Overall success is "at
	/// least one connected".
	pub async fn initialize_dual(&self) -> bool {
		let mut any = false;
		for kind in [self.primary_kind(), self.secondary_kind()].into_iter().flatten() {
			match self.get_or_reconnect(kind).await {
				Ok(_) => any = true,
				Err(err) => {
					tracing::warn!(engine = %kind, error = %err, "dual initialization leg failed");
				}
			}
		}
		any
	}

	/// True only when both primary and secondary handles are live.
	pub async fn has_dual(&self) -> bool {
		let (Some(primary), Some(secondary)) = (self.primary_kind(), self.secondary_kind()) else {
			return false;
		};
		let handles = self.handles.read().await;
		handles.contains_key(&primary) && handles.contains_key(&secondary)
	}

	/// Close every pool exactly once and clear the registry.
	pub async fn close_all(&self) {
		let drained: Vec<_> = self.handles.write().await.drain().collect();
		for (kind, handle) in drained {
			handle.close().await;
			if self.settings.logging {
				tracing::info!(engine = %kind, "engine closed");
			}
		}
		*self.default_engine.write() = None;
	}
}
