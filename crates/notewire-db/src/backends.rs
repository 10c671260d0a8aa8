//! Engine backends (dialect adapters)
//!
//! One [`EngineBackend`] implementation per engine translates the abstract
//! query surface into driver calls: placeholder style, bind-type coercion,
//! row normalization, liveness probing, and catalog introspection. Every
//! driver error is converted to [`crate::DatabaseError`] here; nothing
//! engine-native crosses this boundary.

pub mod mysql;
pub mod postgres;
pub mod rewrite;
pub mod sqlite;

pub use mysql::MysqlBackend;
pub use postgres::PostgresBackend;
pub use sqlite::SqliteBackend;

use async_trait::async_trait;
use notewire_conf::EngineKind;

use crate::error::Result;
use crate::sync::typemap::TableStructure;
use crate::types::{ExecOutcome, QueryValue};

/// The per-engine dialect seam.
#[async_trait]
pub trait EngineBackend: Send + Sync {
	fn kind(&self) -> EngineKind;

	/// The engine's bind marker for the 1-based parameter `index`.
	fn placeholder(&self, index: usize) -> String;

	fn quote_identifier(&self, name: &str) -> String;

	/// Run one rewritten statement with bound values.
	///
	/// Returns [`ExecOutcome::Rows`] for result-producing statements and
	/// [`ExecOutcome::Done`] with the affected-row count otherwise, so
	/// callers can tell "no rows" apart from "no result set".
	async fn run(&self, sql: &str, params: Vec<QueryValue>) -> Result<ExecOutcome>;

	/// Trivial liveness probe, issued before a cached handle is reused.
	async fn ping(&self) -> Result<()>;

	/// Names of user tables, via engine-specific catalog introspection.
	async fn list_tables(&self) -> Result<Vec<String>>;

	/// Ordered column structure for one table.
	async fn table_structure(&self, table: &str) -> Result<TableStructure>;

	/// Close the underlying pool. Safe to call once per handle.
	async fn close(&self);
}

/// Whether a statement produces a result set.
///
/// Decides between `fetch_all` and `execute` in the backends; RETURNING
/// clauses count as row-producing.
pub(crate) fn produces_rows(sql: &str) -> bool {
	let trimmed = strip_leading_comments(sql);
	let keyword = trimmed
		.split_whitespace()
		.next()
		.map(str::to_ascii_uppercase)
		.unwrap_or_default();
	matches!(
		keyword.as_str(),
		"SELECT" | "WITH" | "VALUES" | "SHOW" | "PRAGMA" | "EXPLAIN" | "DESCRIBE"
	) || has_returning_clause(sql)
}

fn strip_leading_comments(sql: &str) -> &str {
	let mut rest = sql.trim_start();
	loop {
		if let Some(stripped) = rest.strip_prefix("--") {
			rest = match stripped.find('\n') {
				Some(pos) => stripped[pos + 1..].trim_start(),
				None => "",
			};
		} else if let Some(stripped) = rest.strip_prefix("/*") {
			rest = match stripped.find("*/") {
				Some(pos) => stripped[pos + 2..].trim_start(),
				None => "",
			};
		} else {
			return rest;
		}
	}
}

fn has_returning_clause(sql: &str) -> bool {
	let upper = sql.to_ascii_uppercase();
	upper
		.split(|c: char| !c.is_ascii_alphanumeric() && c != '_')
		.any(|word| word == "RETURNING")
}
