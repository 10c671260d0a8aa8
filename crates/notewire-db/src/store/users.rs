//! User repository

use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::context::QueryContext;
use crate::dualwrite::DualWriteCoordinator;
use crate::error::{DatabaseError, Result};
use crate::executor::Executor;
use crate::types::{Params, Row};

#[derive(Debug, Clone, PartialEq)]
pub struct User {
	pub id: i64,
	pub username: String,
	pub password_hash: String,
	pub email: String,
	pub created_at: DateTime<Utc>,
}

pub struct UserStore {
	executor: Arc<Executor>,
	coordinator: Arc<DualWriteCoordinator>,
}

impl UserStore {
	pub fn new(executor: Arc<Executor>, coordinator: Arc<DualWriteCoordinator>) -> Self {
		Self { executor, coordinator }
	}

	/// Register a user on both stores and return the row from the active
	/// engine. A taken username or email surfaces as
	/// [`DatabaseError::DuplicateKey`].
	pub async fn create(
		&self,
		ctx: &QueryContext,
		username: &str,
		password_hash: &str,
		email: &str,
	) -> Result<User> {
		let params = Params::named([
			("username", crate::types::QueryValue::from(username)),
			("password_hash", password_hash.into()),
			("email", email.into()),
			("created_at", Utc::now().into()),
		]);
		self.coordinator
			.execute_on_both(
				ctx,
				"INSERT INTO users (username, password_hash, email, created_at) \
				 VALUES (:username, :password_hash, :email, :created_at)",
				&params,
				false,
			)
			.await?;
		self.by_username(ctx, username).await?.ok_or_else(|| DatabaseError::QueryError {
			message: format!("user {username} missing after insert"),
			code: None,
		})
	}

	pub async fn by_username(&self, ctx: &QueryContext, username: &str) -> Result<Option<User>> {
		let params = Params::positional([username]);
		let rows = self
			.executor
			.execute(
				ctx,
				"SELECT id, username, password_hash, email, created_at \
				 FROM users WHERE username = ?",
				&params,
				true,
			)
			.await?
			.into_rows();
		rows.first().map(row_to_user).transpose()
	}

	pub async fn by_id(&self, ctx: &QueryContext, id: i64) -> Result<Option<User>> {
		let params = Params::positional([id]);
		let rows = self
			.executor
			.execute(
				ctx,
				"SELECT id, username, password_hash, email, created_at FROM users WHERE id = ?",
				&params,
				true,
			)
			.await?
			.into_rows();
		rows.first().map(row_to_user).transpose()
	}
}

fn row_to_user(row: &Row) -> Result<User> {
	Ok(User {
		id: row.get("id")?,
		username: row.get("username")?,
		password_hash: row.get("password_hash")?,
		email: row.get("email")?,
		created_at: row.get("created_at")?,
	})
}
