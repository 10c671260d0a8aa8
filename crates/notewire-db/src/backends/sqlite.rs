//! SQLite backend (embedded file fallback)

use async_trait::async_trait;
use notewire_conf::{EngineKind, PoolSettings};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Column, Row as SqlxRow, ValueRef};
use std::path::Path;
use std::time::Duration;

use super::{EngineBackend, produces_rows};
use crate::error::{DatabaseError, Result};
use crate::sync::typemap::{ColumnStructure, ColumnType, TableStructure};
use crate::types::{ExecOutcome, QueryValue, Row};

/// The embedded file engine. Creates the database file on first use.
pub struct SqliteBackend {
	pool: SqlitePool,
}

impl SqliteBackend {
	pub async fn connect(path: &Path, pool: &PoolSettings) -> Result<Self> {
		let options = SqliteConnectOptions::new()
			.filename(path)
			.create_if_missing(true)
			// A busy timeout keeps concurrent dual-write legs from failing
			// immediately on a locked file.
			.busy_timeout(Duration::from_secs(5));
		let pool = SqlitePoolOptions::new()
			.max_connections(pool.max_connections)
			.acquire_timeout(Duration::from_secs(pool.acquire_timeout_secs))
			.connect_with(options)
			.await
			.map_err(|e| DatabaseError::connect(EngineKind::Sqlite, e))?;
		Ok(Self { pool })
	}

	pub fn pool(&self) -> &SqlitePool {
		&self.pool
	}

	fn bind_value<'q>(
		query: sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>>,
		value: QueryValue,
	) -> sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>> {
		match value {
			QueryValue::Null => query.bind(None::<String>),
			// Booleans land in INTEGER columns as 0/1.
			QueryValue::Bool(b) => query.bind(b as i64),
			QueryValue::Int(i) => query.bind(i),
			QueryValue::Float(f) => query.bind(f),
			QueryValue::Text(s) => query.bind(s),
			QueryValue::Bytes(b) => query.bind(b),
			// Timestamps land in TEXT columns as RFC 3339.
			QueryValue::Timestamp(dt) => query.bind(dt.to_rfc3339()),
		}
	}

	fn convert_row(sqlite_row: &SqliteRow) -> Result<Row> {
		let mut row = Row::new();
		for column in sqlite_row.columns() {
			let name = column.name();
			let raw = sqlite_row.try_get_raw(name).map_err(DatabaseError::from_sqlx)?;
			if raw.is_null() {
				row.insert(name.to_string(), QueryValue::Null);
				continue;
			}
			let value = if let Ok(v) = sqlite_row.try_get::<i64, _>(name) {
				QueryValue::Int(v)
			} else if let Ok(v) = sqlite_row.try_get::<f64, _>(name) {
				QueryValue::Float(v)
			} else if let Ok(v) = sqlite_row.try_get::<String, _>(name) {
				QueryValue::Text(v)
			} else if let Ok(v) = sqlite_row.try_get::<Vec<u8>, _>(name) {
				QueryValue::Bytes(v)
			} else {
				QueryValue::Null
			};
			row.insert(name.to_string(), value);
		}
		Ok(row)
	}
}

#[async_trait]
impl EngineBackend for SqliteBackend {
	fn kind(&self) -> EngineKind {
		EngineKind::Sqlite
	}

	fn placeholder(&self, _index: usize) -> String {
		"?".to_string()
	}

	fn quote_identifier(&self, name: &str) -> String {
		format!("\"{}\"", name.replace('"', "\"\""))
	}

	async fn run(&self, sql: &str, params: Vec<QueryValue>) -> Result<ExecOutcome> {
		let mut query = sqlx::query(sql);
		for param in params {
			query = Self::bind_value(query, param);
		}
		if produces_rows(sql) {
			let rows = query
				.fetch_all(&self.pool)
				.await
				.map_err(DatabaseError::from_sqlx)?;
			let rows = rows.iter().map(Self::convert_row).collect::<Result<Vec<_>>>()?;
			Ok(ExecOutcome::Rows(rows))
		} else {
			let result = query
				.execute(&self.pool)
				.await
				.map_err(DatabaseError::from_sqlx)?;
			Ok(ExecOutcome::Done(result.rows_affected()))
		}
	}

	async fn ping(&self) -> Result<()> {
		sqlx::query("SELECT 1")
			.execute(&self.pool)
			.await
			.map(|_| ())
			.map_err(DatabaseError::from_sqlx)
	}

	async fn list_tables(&self) -> Result<Vec<String>> {
		let rows = sqlx::query(
			"SELECT name FROM sqlite_master \
			 WHERE type = 'table' AND name NOT LIKE 'sqlite_%' \
			 ORDER BY name",
		)
		.fetch_all(&self.pool)
		.await
		.map_err(DatabaseError::from_sqlx)?;
		rows.iter()
			.map(|row| row.try_get::<String, _>("name").map_err(DatabaseError::from_sqlx))
			.collect()
	}

	async fn table_structure(&self, table: &str) -> Result<TableStructure> {
		// PRAGMA arguments cannot be bound; the identifier is quoted instead.
		let sql = format!("PRAGMA table_info({})", self.quote_identifier(table));
		let rows = sqlx::query(&sql)
			.fetch_all(&self.pool)
			.await
			.map_err(DatabaseError::from_sqlx)?;

		let mut columns = Vec::with_capacity(rows.len());
		for row in &rows {
			let name: String = row.try_get("name").map_err(DatabaseError::from_sqlx)?;
			let declared: String = row.try_get("type").map_err(DatabaseError::from_sqlx)?;
			let notnull: i64 = row.try_get("notnull").map_err(DatabaseError::from_sqlx)?;
			let default: Option<String> =
				row.try_get("dflt_value").map_err(DatabaseError::from_sqlx)?;
			columns.push(ColumnStructure {
				name,
				column_type: ColumnType::parse(&declared),
				nullable: notnull == 0,
				default,
			});
		}
		Ok(TableStructure { columns })
	}

	async fn close(&self) {
		self.pool.close().await;
	}
}
