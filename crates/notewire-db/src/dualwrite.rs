//! Dual-write coordinator
//!
//! Runs the same logical mutation against primary and secondary engines,
//! each leg independent: one failing never aborts the other. The caller's
//! context is untouched — each leg gets its own derived context — so the
//! pre-call engine selection survives every exit path.
//!
//! A partial failure (one leg succeeded, one didn't) is logged and left for
//! a later `sync()` to repair; it is deliberately not surfaced as an error
//! to the immediate caller.

use std::sync::Arc;
use tokio::sync::OnceCell;

use crate::context::QueryContext;
use crate::error::{DatabaseError, Result};
use crate::executor::Executor;
use crate::registry::Registry;
use crate::types::{ExecOutcome, Params};

pub struct DualWriteCoordinator {
	registry: Arc<Registry>,
	executor: Arc<Executor>,
	initialized: OnceCell<bool>,
}

impl DualWriteCoordinator {
	pub fn new(registry: Arc<Registry>, executor: Arc<Executor>) -> Self {
		Self {
			registry,
			executor,
			initialized: OnceCell::new(),
		}
	}

	/// Lazily bring up both engines, once per coordinator.
	async fn ensure_dual(&self) -> bool {
		*self
			.initialized
			.get_or_init(|| async { self.registry.initialize_dual().await })
			.await
	}

	/// Execute on primary first, then secondary. The result is primary's if
	/// its leg succeeded, else secondary's, else primary's error.
	pub async fn execute_on_both(
		&self,
		ctx: &QueryContext,
		sql: &str,
		params: &Params,
		fetch: bool,
	) -> Result<ExecOutcome> {
		if !self.ensure_dual().await {
			return Err(DatabaseError::ConfigError(
				"no engine available for dual-write".to_string(),
			));
		}

		let mut results: Vec<Result<ExecOutcome>> = Vec::with_capacity(2);
		let legs = [self.registry.primary_kind(), self.registry.secondary_kind()];
		for kind in legs.into_iter().flatten() {
			let leg_ctx = ctx.with_engine(kind);
			results.push(self.executor.execute(&leg_ctx, sql, params, fetch).await);
		}

		let succeeded = results.iter().filter(|r| r.is_ok()).count();
		if succeeded > 0 && succeeded < results.len() {
			// Divergence is repaired by a later sync pass, not raised here.
			let failures: Vec<String> = results
				.iter()
				.filter_map(|r| r.as_ref().err().map(|e| e.to_string()))
				.collect();
			tracing::warn!(failures = ?failures, "dual-write leg failed, stores may diverge");
		}

		let mut first_err: Option<DatabaseError> = None;
		for result in results {
			match result {
				Ok(outcome) => return Ok(outcome),
				Err(err) => {
					if first_err.is_none() {
						first_err = Some(err);
					}
				}
			}
		}
		Err(first_err.unwrap_or_else(|| {
			DatabaseError::ConfigError("dual-write executed no legs".to_string())
		}))
	}
}
