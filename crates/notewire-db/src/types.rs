//! Common value and result types for the engine abstraction

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value as JsonValue;
use std::collections::HashMap;

use crate::error::DatabaseError;

/// A bind value, normalized across engines.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryValue {
	Null,
	Bool(bool),
	Int(i64),
	Float(f64),
	Text(String),
	Bytes(Vec<u8>),
	Timestamp(DateTime<Utc>),
}

impl From<&str> for QueryValue {
	fn from(s: &str) -> Self {
		QueryValue::Text(s.to_string())
	}
}

impl From<String> for QueryValue {
	fn from(s: String) -> Self {
		QueryValue::Text(s)
	}
}

impl From<i64> for QueryValue {
	fn from(i: i64) -> Self {
		QueryValue::Int(i)
	}
}

impl From<i32> for QueryValue {
	fn from(i: i32) -> Self {
		QueryValue::Int(i as i64)
	}
}

impl From<f64> for QueryValue {
	fn from(f: f64) -> Self {
		QueryValue::Float(f)
	}
}

impl From<bool> for QueryValue {
	fn from(b: bool) -> Self {
		QueryValue::Bool(b)
	}
}

impl From<DateTime<Utc>> for QueryValue {
	fn from(dt: DateTime<Utc>) -> Self {
		QueryValue::Timestamp(dt)
	}
}

impl From<Vec<u8>> for QueryValue {
	fn from(b: Vec<u8>) -> Self {
		QueryValue::Bytes(b)
	}
}

impl<T> From<Option<T>> for QueryValue
where
	T: Into<QueryValue>,
{
	fn from(opt: Option<T>) -> Self {
		match opt {
			Some(v) => v.into(),
			None => QueryValue::Null,
		}
	}
}

/// Lossy conversion from JSON; unknown shapes coerce to text.
impl From<JsonValue> for QueryValue {
	fn from(value: JsonValue) -> Self {
		match value {
			JsonValue::Null => QueryValue::Null,
			JsonValue::Bool(b) => QueryValue::Bool(b),
			JsonValue::Number(n) => {
				if let Some(i) = n.as_i64() {
					QueryValue::Int(i)
				} else if let Some(f) = n.as_f64() {
					QueryValue::Float(f)
				} else {
					QueryValue::Text(n.to_string())
				}
			}
			JsonValue::String(s) => QueryValue::Text(s),
			other => QueryValue::Text(other.to_string()),
		}
	}
}

/// One result row: column name to normalized value.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
	pub data: HashMap<String, QueryValue>,
}

impl Row {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn insert(&mut self, column: String, value: QueryValue) {
		self.data.insert(column, value);
	}

	/// Typed access to a column. Fails on a missing column or an
	/// unconvertible value.
	pub fn get<T: TryFrom<QueryValue, Error = DatabaseError>>(
		&self,
		column: &str,
	) -> Result<T, DatabaseError> {
		self.data
			.get(column)
			.cloned()
			.ok_or_else(|| DatabaseError::ColumnNotFound(column.to_string()))
			.and_then(T::try_from)
	}

	/// Like [`Row::get`], but maps SQL NULL to `None`.
	pub fn get_opt<T: TryFrom<QueryValue, Error = DatabaseError>>(
		&self,
		column: &str,
	) -> Result<Option<T>, DatabaseError> {
		match self.data.get(column) {
			None => Err(DatabaseError::ColumnNotFound(column.to_string())),
			Some(QueryValue::Null) => Ok(None),
			Some(value) => T::try_from(value.clone()).map(Some),
		}
	}
}

/// Normalized tabular result, independent of source engine.
pub type RowSet = Vec<Row>;

/// Outcome of one statement execution.
///
/// An empty `Rows` is distinct from `Done`: the former means a
/// result-producing statement returned no rows, the latter that the
/// statement produces no result set at all (pure DDL/DML).
#[derive(Debug, Clone, PartialEq)]
pub enum ExecOutcome {
	Rows(RowSet),
	Done(u64),
}

impl ExecOutcome {
	/// The rows, or empty for a non-row-producing statement.
	pub fn into_rows(self) -> RowSet {
		match self {
			ExecOutcome::Rows(rows) => rows,
			ExecOutcome::Done(_) => Vec::new(),
		}
	}

	/// Affected-row count for mutations; row count for fetches.
	pub fn rows_affected(&self) -> u64 {
		match self {
			ExecOutcome::Rows(rows) => rows.len() as u64,
			ExecOutcome::Done(n) => *n,
		}
	}

	pub fn is_rows(&self) -> bool {
		matches!(self, ExecOutcome::Rows(_))
	}
}

/// Parameters for a logical query: positional for `?` placeholders, named
/// for `:name` placeholders. Immutable input to the executor.
#[derive(Debug, Clone)]
pub enum Params {
	Positional(Vec<QueryValue>),
	Named(HashMap<String, QueryValue>),
}

impl Params {
	pub fn none() -> Self {
		Params::Positional(Vec::new())
	}

	pub fn positional<I, V>(values: I) -> Self
	where
		I: IntoIterator<Item = V>,
		V: Into<QueryValue>,
	{
		Params::Positional(values.into_iter().map(Into::into).collect())
	}

	pub fn named<I, K, V>(pairs: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<QueryValue>,
	{
		Params::Named(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
	}

	pub fn is_empty(&self) -> bool {
		match self {
			Params::Positional(values) => values.is_empty(),
			Params::Named(map) => map.is_empty(),
		}
	}
}

impl Default for Params {
	fn default() -> Self {
		Params::none()
	}
}

impl TryFrom<QueryValue> for i64 {
	type Error = DatabaseError;

	fn try_from(value: QueryValue) -> Result<Self, Self::Error> {
		match value {
			QueryValue::Int(i) => Ok(i),
			QueryValue::Bool(b) => Ok(b as i64),
			other => Err(DatabaseError::TypeError(format!("cannot convert {other:?} to i64"))),
		}
	}
}

impl TryFrom<QueryValue> for String {
	type Error = DatabaseError;

	fn try_from(value: QueryValue) -> Result<Self, Self::Error> {
		match value {
			QueryValue::Text(s) => Ok(s),
			other => Err(DatabaseError::TypeError(format!(
				"cannot convert {other:?} to String"
			))),
		}
	}
}

impl TryFrom<QueryValue> for bool {
	type Error = DatabaseError;

	fn try_from(value: QueryValue) -> Result<Self, Self::Error> {
		match value {
			QueryValue::Bool(b) => Ok(b),
			// SQLite and MySQL store booleans as 0/1 integers.
			QueryValue::Int(i) => Ok(i != 0),
			other => Err(DatabaseError::TypeError(format!("cannot convert {other:?} to bool"))),
		}
	}
}

impl TryFrom<QueryValue> for f64 {
	type Error = DatabaseError;

	fn try_from(value: QueryValue) -> Result<Self, Self::Error> {
		match value {
			QueryValue::Float(f) => Ok(f),
			QueryValue::Int(i) => Ok(i as f64),
			other => Err(DatabaseError::TypeError(format!("cannot convert {other:?} to f64"))),
		}
	}
}

impl TryFrom<QueryValue> for DateTime<Utc> {
	type Error = DatabaseError;

	fn try_from(value: QueryValue) -> Result<Self, Self::Error> {
		match value {
			QueryValue::Timestamp(dt) => Ok(dt),
			// SQLite keeps timestamps as TEXT; accept the common encodings.
			QueryValue::Text(s) => parse_timestamp_text(&s)
				.ok_or_else(|| DatabaseError::TypeError(format!("cannot parse timestamp: {s}"))),
			other => Err(DatabaseError::TypeError(format!(
				"cannot convert {other:?} to DateTime<Utc>"
			))),
		}
	}
}

fn parse_timestamp_text(s: &str) -> Option<DateTime<Utc>> {
	if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
		return Some(dt.with_timezone(&Utc));
	}
	for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"] {
		if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
			return Some(DateTime::from_naive_utc_and_offset(naive, Utc));
		}
	}
	None
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn row_typed_access() {
		let mut row = Row::new();
		row.insert("id".into(), QueryValue::Int(7));
		row.insert("title".into(), QueryValue::Text("draft".into()));
		row.insert("deleted_at".into(), QueryValue::Null);

		assert_eq!(row.get::<i64>("id").unwrap(), 7);
		assert_eq!(row.get::<String>("title").unwrap(), "draft");
		assert_eq!(row.get_opt::<String>("deleted_at").unwrap(), None);
		assert!(matches!(
			row.get::<i64>("missing"),
			Err(DatabaseError::ColumnNotFound(_))
		));
	}

	#[test]
	fn empty_rows_is_not_done() {
		let rows = ExecOutcome::Rows(Vec::new());
		let done = ExecOutcome::Done(0);
		assert!(rows.is_rows());
		assert!(!done.is_rows());
		assert_ne!(rows, done);
	}

	#[test]
	fn timestamp_text_fallback() {
		let parsed: DateTime<Utc> =
			QueryValue::Text("2026-03-01 12:30:00".into()).try_into().unwrap();
		assert_eq!(parsed.to_rfc3339(), "2026-03-01T12:30:00+00:00");
	}

	#[test]
	fn json_values_coerce_lossily() {
		assert_eq!(QueryValue::from(JsonValue::Bool(true)), QueryValue::Bool(true));
		assert_eq!(
			QueryValue::from(serde_json::json!([1, 2])),
			QueryValue::Text("[1,2]".into())
		);
	}
}
