//! Abstract column types and the cross-dialect translation table
//!
//! Introspected engine-native declarations are parsed into a small abstract
//! set, then rendered back as DDL for the target dialect. The mapping is
//! lossy: precision, character lengths, and constraints are not
//! round-tripped. Unrecognized source declarations fall back to `Text`.

use notewire_conf::EngineKind;

/// The abstract column types the synchronizer can carry across engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
	Integer,
	BigInt,
	Boolean,
	Real,
	Text,
	Timestamp,
	Bytes,
}

impl ColumnType {
	/// Parse an engine-native type declaration into the abstract type.
	pub fn parse(declaration: &str) -> Self {
		let decl = declaration.trim().to_ascii_uppercase();
		let base = decl.split(['(', ' ']).next().unwrap_or("");
		match base {
			"TINYINT" if decl.starts_with("TINYINT(1)") => ColumnType::Boolean,
			"BOOL" | "BOOLEAN" => ColumnType::Boolean,
			"BIGINT" | "BIGSERIAL" | "INT8" => ColumnType::BigInt,
			"INT" | "INTEGER" | "SMALLINT" | "TINYINT" | "MEDIUMINT" | "SERIAL" | "INT2"
			| "INT4" => ColumnType::Integer,
			"REAL" | "FLOAT" | "DOUBLE" | "NUMERIC" | "DECIMAL" | "FLOAT4" | "FLOAT8" => {
				ColumnType::Real
			}
			"TIMESTAMP" | "TIMESTAMPTZ" | "DATETIME" | "DATE" | "TIME" => ColumnType::Timestamp,
			"BLOB" | "BYTEA" | "BINARY" | "VARBINARY" | "LONGBLOB" | "MEDIUMBLOB" => {
				ColumnType::Bytes
			}
			_ => ColumnType::Text,
		}
	}

	/// Render the column type for a target dialect.
	pub fn ddl(&self, target: EngineKind) -> &'static str {
		match (self, target) {
			(ColumnType::Integer, EngineKind::Sqlite) => "INTEGER",
			(ColumnType::Integer, EngineKind::Postgres) => "INTEGER",
			(ColumnType::Integer, EngineKind::Mysql) => "INT",
			(ColumnType::BigInt, EngineKind::Sqlite) => "INTEGER",
			(ColumnType::BigInt, EngineKind::Postgres) => "BIGINT",
			(ColumnType::BigInt, EngineKind::Mysql) => "BIGINT",
			(ColumnType::Boolean, EngineKind::Sqlite) => "INTEGER",
			(ColumnType::Boolean, EngineKind::Postgres) => "BOOLEAN",
			(ColumnType::Boolean, EngineKind::Mysql) => "TINYINT(1)",
			(ColumnType::Real, EngineKind::Sqlite) => "REAL",
			(ColumnType::Real, EngineKind::Postgres) => "DOUBLE PRECISION",
			(ColumnType::Real, EngineKind::Mysql) => "DOUBLE",
			(ColumnType::Text, _) => "TEXT",
			(ColumnType::Timestamp, EngineKind::Sqlite) => "TEXT",
			(ColumnType::Timestamp, EngineKind::Postgres) => "TIMESTAMPTZ",
			(ColumnType::Timestamp, EngineKind::Mysql) => "DATETIME",
			(ColumnType::Bytes, EngineKind::Sqlite) => "BLOB",
			(ColumnType::Bytes, EngineKind::Postgres) => "BYTEA",
			(ColumnType::Bytes, EngineKind::Mysql) => "BLOB",
		}
	}
}

/// One introspected column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnStructure {
	pub name: String,
	pub column_type: ColumnType,
	pub nullable: bool,
	pub default: Option<String>,
}

/// Ordered column list for one table, as introspected from a source engine.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TableStructure {
	pub columns: Vec<ColumnStructure>,
}

impl TableStructure {
	pub fn column_names(&self) -> Vec<&str> {
		self.columns.iter().map(|c| c.name.as_str()).collect()
	}
}
