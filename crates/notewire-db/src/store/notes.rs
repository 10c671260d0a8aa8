//! Note repository

use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::context::QueryContext;
use crate::dualwrite::DualWriteCoordinator;
use crate::error::{DatabaseError, Result};
use crate::executor::Executor;
use crate::types::{Params, Row};

#[derive(Debug, Clone, PartialEq)]
pub struct Note {
	pub id: i64,
	pub user_id: i64,
	pub title: String,
	pub content: String,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

pub struct NoteStore {
	executor: Arc<Executor>,
	coordinator: Arc<DualWriteCoordinator>,
}

impl NoteStore {
	pub fn new(executor: Arc<Executor>, coordinator: Arc<DualWriteCoordinator>) -> Self {
		Self { executor, coordinator }
	}

	/// Save a new note to both stores and return it from the active engine.
	pub async fn create(
		&self,
		ctx: &QueryContext,
		user_id: i64,
		title: &str,
		content: &str,
	) -> Result<Note> {
		let now = Utc::now();
		let params = Params::positional([
			crate::types::QueryValue::from(user_id),
			title.into(),
			content.into(),
			now.into(),
			now.into(),
		]);
		self.coordinator
			.execute_on_both(
				ctx,
				"INSERT INTO notes (user_id, title, content, created_at, updated_at) \
				 VALUES (?, ?, ?, ?, ?)",
				&params,
				false,
			)
			.await?;
		let rows = self
			.executor
			.execute(
				ctx,
				"SELECT id, user_id, title, content, created_at, updated_at FROM notes \
				 WHERE user_id = ? ORDER BY id DESC LIMIT 1",
				&Params::positional([user_id]),
				true,
			)
			.await?
			.into_rows();
		rows.first().map(row_to_note).transpose()?.ok_or_else(|| {
			DatabaseError::QueryError {
				message: "note missing after insert".to_string(),
				code: None,
			}
		})
	}

	/// Update title and content, refreshing `updated_at`, on both stores.
	pub async fn update(
		&self,
		ctx: &QueryContext,
		id: i64,
		title: &str,
		content: &str,
	) -> Result<bool> {
		let params = Params::positional([
			crate::types::QueryValue::from(title),
			content.into(),
			Utc::now().into(),
			id.into(),
		]);
		let outcome = self
			.coordinator
			.execute_on_both(
				ctx,
				"UPDATE notes SET title = ?, content = ?, updated_at = ? WHERE id = ?",
				&params,
				false,
			)
			.await?;
		Ok(outcome.rows_affected() > 0)
	}

	/// Delete from both stores.
	pub async fn delete(&self, ctx: &QueryContext, id: i64) -> Result<bool> {
		let params = Params::positional([id]);
		let outcome = self
			.coordinator
			.execute_on_both(ctx, "DELETE FROM notes WHERE id = ?", &params, false)
			.await?;
		Ok(outcome.rows_affected() > 0)
	}

	pub async fn by_id(&self, ctx: &QueryContext, id: i64) -> Result<Option<Note>> {
		let params = Params::positional([id]);
		let rows = self
			.executor
			.execute(
				ctx,
				"SELECT id, user_id, title, content, created_at, updated_at \
				 FROM notes WHERE id = ?",
				&params,
				true,
			)
			.await?
			.into_rows();
		rows.first().map(row_to_note).transpose()
	}

	/// A user's notes, most recently updated first.
	pub async fn list_for_user(&self, ctx: &QueryContext, user_id: i64) -> Result<Vec<Note>> {
		let params = Params::positional([user_id]);
		let rows = self
			.executor
			.execute(
				ctx,
				"SELECT id, user_id, title, content, created_at, updated_at \
				 FROM notes WHERE user_id = ? ORDER BY updated_at DESC, id DESC",
				&params,
				true,
			)
			.await?
			.into_rows();
		rows.iter().map(row_to_note).collect()
	}
}

fn row_to_note(row: &Row) -> Result<Note> {
	Ok(Note {
		id: row.get("id")?,
		user_id: row.get("user_id")?,
		title: row.get("title")?,
		content: row.get("content")?,
		created_at: row.get("created_at")?,
		updated_at: row.get("updated_at")?,
	})
}
