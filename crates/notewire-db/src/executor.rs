//! Query executor
//!
//! Executes one logical query against the engine the context resolves to:
//! explicit context engine, else the registry default, else whatever the
//! fallback chain can reach. Rewrite and run are delegated to the engine's
//! backend; only [`crate::DatabaseError`] ever reaches the caller.

use std::sync::Arc;

use crate::backends::rewrite;
use crate::context::QueryContext;
use crate::error::Result;
use crate::registry::Registry;
use crate::types::{ExecOutcome, Params};

pub struct Executor {
	registry: Arc<Registry>,
}

impl Executor {
	pub fn new(registry: Arc<Registry>) -> Self {
		Self { registry }
	}

	pub fn registry(&self) -> &Arc<Registry> {
		&self.registry
	}

	/// Execute `sql` with `params` on the context's engine.
	///
	/// With `fetch` set, a result-producing statement yields
	/// [`ExecOutcome::Rows`] (possibly empty) and a pure statement yields
	/// [`ExecOutcome::Done`]. Without `fetch`, any successful execution
	/// yields `Done` regardless of row impact.
	pub async fn execute(
		&self,
		ctx: &QueryContext,
		sql: &str,
		params: &Params,
		fetch: bool,
	) -> Result<ExecOutcome> {
		let kind = match ctx.engine().or_else(|| self.registry.default_engine()) {
			Some(kind) => kind,
			None => self.registry.connect_default().await?,
		};
		let backend = self.registry.get_or_reconnect(kind).await?;
		let (engine_sql, values) = rewrite::rewrite(sql, params, |i| backend.placeholder(i))?;
		let outcome = backend.run(&engine_sql, values).await?;
		if fetch {
			Ok(outcome)
		} else {
			Ok(ExecOutcome::Done(outcome.rows_affected()))
		}
	}
}
