//! PostgreSQL backend

use async_trait::async_trait;
use notewire_conf::{EngineKind, PoolSettings};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{Column, Row as SqlxRow, ValueRef};
use std::time::Duration;

use super::{EngineBackend, produces_rows};
use crate::error::{DatabaseError, Result};
use crate::sync::typemap::{ColumnStructure, ColumnType, TableStructure};
use crate::types::{ExecOutcome, QueryValue, Row};

/// The primary server engine.
pub struct PostgresBackend {
	pool: PgPool,
}

impl PostgresBackend {
	/// Dial the server and build the pool. Failures degrade to
	/// [`DatabaseError::ConnectionError`], never a raw driver error.
	pub async fn connect(url: &str, pool: &PoolSettings) -> Result<Self> {
		let pool = PgPoolOptions::new()
			.max_connections(pool.max_connections)
			.acquire_timeout(Duration::from_secs(pool.acquire_timeout_secs))
			.connect(url)
			.await
			.map_err(|e| DatabaseError::connect(EngineKind::Postgres, e))?;
		Ok(Self { pool })
	}

	pub fn pool(&self) -> &PgPool {
		&self.pool
	}

	fn bind_value<'q>(
		query: sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments>,
		value: QueryValue,
	) -> sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments> {
		match value {
			QueryValue::Null => query.bind(None::<String>),
			QueryValue::Bool(b) => query.bind(b),
			QueryValue::Int(i) => query.bind(i),
			QueryValue::Float(f) => query.bind(f),
			QueryValue::Text(s) => query.bind(s),
			QueryValue::Bytes(b) => query.bind(b),
			QueryValue::Timestamp(dt) => query.bind(dt),
		}
	}

	fn convert_row(pg_row: &PgRow) -> Result<Row> {
		let mut row = Row::new();
		for column in pg_row.columns() {
			let name = column.name();
			let raw = pg_row.try_get_raw(name).map_err(DatabaseError::from_sqlx)?;
			if raw.is_null() {
				row.insert(name.to_string(), QueryValue::Null);
				continue;
			}
			let value = if let Ok(v) = pg_row.try_get::<bool, _>(name) {
				QueryValue::Bool(v)
			} else if let Ok(v) = pg_row.try_get::<i64, _>(name) {
				QueryValue::Int(v)
			} else if let Ok(v) = pg_row.try_get::<i32, _>(name) {
				QueryValue::Int(v as i64)
			} else if let Ok(v) = pg_row.try_get::<i16, _>(name) {
				QueryValue::Int(v as i64)
			} else if let Ok(v) = pg_row.try_get::<f64, _>(name) {
				QueryValue::Float(v)
			} else if let Ok(v) = pg_row.try_get::<chrono::DateTime<chrono::Utc>, _>(name) {
				QueryValue::Timestamp(v)
			} else if let Ok(v) = pg_row.try_get::<chrono::NaiveDateTime, _>(name) {
				QueryValue::Timestamp(chrono::DateTime::from_naive_utc_and_offset(v, chrono::Utc))
			} else if let Ok(v) = pg_row.try_get::<String, _>(name) {
				QueryValue::Text(v)
			} else if let Ok(v) = pg_row.try_get::<Vec<u8>, _>(name) {
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
impl EngineBackend for PostgresBackend {
	fn kind(&self) -> EngineKind {
		EngineKind::Postgres
	}

	fn placeholder(&self, index: usize) -> String {
		format!("${index}")
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
			"SELECT tablename FROM pg_catalog.pg_tables \
			 WHERE schemaname NOT IN ('pg_catalog', 'information_schema') \
			 ORDER BY tablename",
		)
		.fetch_all(&self.pool)
		.await
		.map_err(DatabaseError::from_sqlx)?;
		rows.iter()
			.map(|row| row.try_get::<String, _>("tablename").map_err(DatabaseError::from_sqlx))
			.collect()
	}

	async fn table_structure(&self, table: &str) -> Result<TableStructure> {
		let rows = sqlx::query(
			"SELECT column_name, data_type, is_nullable, column_default \
			 FROM information_schema.columns \
			 WHERE table_name = $1 AND table_schema = 'public' \
			 ORDER BY ordinal_position",
		)
		.bind(table)
		.fetch_all(&self.pool)
		.await
		.map_err(DatabaseError::from_sqlx)?;

		let mut columns = Vec::with_capacity(rows.len());
		for row in &rows {
			let name: String = row.try_get("column_name").map_err(DatabaseError::from_sqlx)?;
			let data_type: String = row.try_get("data_type").map_err(DatabaseError::from_sqlx)?;
			let is_nullable: String =
				row.try_get("is_nullable").map_err(DatabaseError::from_sqlx)?;
			let default: Option<String> =
				row.try_get("column_default").map_err(DatabaseError::from_sqlx)?;
			columns.push(ColumnStructure {
				name,
				column_type: ColumnType::parse(&data_type),
				nullable: is_nullable.eq_ignore_ascii_case("YES"),
				default,
			});
		}
		Ok(TableStructure { columns })
	}

	async fn close(&self) {
		self.pool.close().await;
	}
}
