//! MySQL backend (optional third engine)

use async_trait::async_trait;
use notewire_conf::{EngineKind, PoolSettings};
use sqlx::mysql::{MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::{Column, Row as SqlxRow, ValueRef};
use std::time::Duration;

use super::{EngineBackend, produces_rows};
use crate::error::{DatabaseError, Result};
use crate::sync::typemap::{ColumnStructure, ColumnType, TableStructure};
use crate::types::{ExecOutcome, QueryValue, Row};

pub struct MysqlBackend {
	pool: MySqlPool,
}

impl MysqlBackend {
	pub async fn connect(url: &str, pool: &PoolSettings) -> Result<Self> {
		let pool = MySqlPoolOptions::new()
			.max_connections(pool.max_connections)
			.acquire_timeout(Duration::from_secs(pool.acquire_timeout_secs))
			.connect(url)
			.await
			.map_err(|e| DatabaseError::connect(EngineKind::Mysql, e))?;
		Ok(Self { pool })
	}

	pub fn pool(&self) -> &MySqlPool {
		&self.pool
	}

	fn bind_value<'q>(
		query: sqlx::query::Query<'q, sqlx::MySql, sqlx::mysql::MySqlArguments>,
		value: QueryValue,
	) -> sqlx::query::Query<'q, sqlx::MySql, sqlx::mysql::MySqlArguments> {
		match value {
			QueryValue::Null => query.bind(None::<String>),
			QueryValue::Bool(b) => query.bind(b),
			QueryValue::Int(i) => query.bind(i),
			QueryValue::Float(f) => query.bind(f),
			QueryValue::Text(s) => query.bind(s),
			QueryValue::Bytes(b) => query.bind(b),
			// DATETIME columns carry no offset; store naive UTC.
			QueryValue::Timestamp(dt) => query.bind(dt.naive_utc()),
		}
	}

	fn convert_row(mysql_row: &MySqlRow) -> Result<Row> {
		let mut row = Row::new();
		for column in mysql_row.columns() {
			let name = column.name();
			let raw = mysql_row.try_get_raw(name).map_err(DatabaseError::from_sqlx)?;
			if raw.is_null() {
				row.insert(name.to_string(), QueryValue::Null);
				continue;
			}
			let value = if let Ok(v) = mysql_row.try_get::<bool, _>(name) {
				QueryValue::Bool(v)
			} else if let Ok(v) = mysql_row.try_get::<i64, _>(name) {
				QueryValue::Int(v)
			} else if let Ok(v) = mysql_row.try_get::<u64, _>(name) {
				QueryValue::Int(v as i64)
			} else if let Ok(v) = mysql_row.try_get::<f64, _>(name) {
				QueryValue::Float(v)
			} else if let Ok(v) = mysql_row.try_get::<chrono::DateTime<chrono::Utc>, _>(name) {
				QueryValue::Timestamp(v)
			} else if let Ok(v) = mysql_row.try_get::<chrono::NaiveDateTime, _>(name) {
				QueryValue::Timestamp(chrono::DateTime::from_naive_utc_and_offset(v, chrono::Utc))
			} else if let Ok(v) = mysql_row.try_get::<String, _>(name) {
				QueryValue::Text(v)
			} else if let Ok(v) = mysql_row.try_get::<Vec<u8>, _>(name) {
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
impl EngineBackend for MysqlBackend {
	fn kind(&self) -> EngineKind {
		EngineKind::Mysql
	}

	fn placeholder(&self, _index: usize) -> String {
		"?".to_string()
	}

	fn quote_identifier(&self, name: &str) -> String {
		format!("`{}`", name.replace('`', "``"))
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
			"SELECT table_name AS name FROM information_schema.tables \
			 WHERE table_schema = DATABASE() AND table_type = 'BASE TABLE' \
			 ORDER BY table_name",
		)
		.fetch_all(&self.pool)
		.await
		.map_err(DatabaseError::from_sqlx)?;
		rows.iter()
			.map(|row| row.try_get::<String, _>("name").map_err(DatabaseError::from_sqlx))
			.collect()
	}

	async fn table_structure(&self, table: &str) -> Result<TableStructure> {
		let rows = sqlx::query(
			// Aliases pin the result names to lowercase; the data-dictionary
			// views otherwise report them uppercase.
			"SELECT column_name AS column_name, column_type AS column_type, \
			        is_nullable AS is_nullable, column_default AS column_default \
			 FROM information_schema.columns \
			 WHERE table_schema = DATABASE() AND table_name = ? \
			 ORDER BY ordinal_position",
		)
		.bind(table)
		.fetch_all(&self.pool)
		.await
		.map_err(DatabaseError::from_sqlx)?;

		let mut columns = Vec::with_capacity(rows.len());
		for row in &rows {
			let name: String = row.try_get("column_name").map_err(DatabaseError::from_sqlx)?;
			let declared: String = row.try_get("column_type").map_err(DatabaseError::from_sqlx)?;
			let is_nullable: String =
				row.try_get("is_nullable").map_err(DatabaseError::from_sqlx)?;
			let default: Option<String> =
				row.try_get("column_default").map_err(DatabaseError::from_sqlx)?;
			columns.push(ColumnStructure {
				name,
				column_type: ColumnType::parse(&declared),
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
