//! End-to-end tests against the embedded engine, plus fallback behavior
//! with an unreachable primary. No external servers required.

use notewire_conf::{EngineKind, PoolSettings, ServerSettings, Settings, SqliteSettings};
use notewire_db::{Database, DatabaseError, ExecOutcome, Params, QueryContext, RecordStatus};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Collects formatted log output so tests can assert on emitted warnings.
#[derive(Clone, Default)]
struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
	fn contents(&self) -> String {
		String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
	}
}

impl std::io::Write for LogCapture {
	fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
		self.0.lock().unwrap().extend_from_slice(buf);
		Ok(buf.len())
	}

	fn flush(&mut self) -> std::io::Result<()> {
		Ok(())
	}
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for LogCapture {
	type Writer = LogCapture;

	fn make_writer(&'a self) -> Self::Writer {
		self.clone()
	}
}

fn sqlite_only_settings(dir: &Path) -> Settings {
	Settings {
		priority: vec![EngineKind::Postgres, EngineKind::Sqlite, EngineKind::Mysql],
		logging: false,
		pool: PoolSettings {
			max_connections: 5,
			acquire_timeout_secs: 5,
		},
		postgres: None,
		sqlite: Some(SqliteSettings::new(dir.join("notes.db"))),
		mysql: None,
	}
}

/// Primary configured but unreachable; secondary is the embedded engine.
fn dead_primary_settings(dir: &Path) -> Settings {
	let mut settings = sqlite_only_settings(dir);
	settings.postgres = Some(ServerSettings {
		host: "127.0.0.1".into(),
		// Nothing listens on the discard port; the dial fails fast.
		port: 9,
		database: "notewire".into(),
		user: "nobody".into(),
		password: "wrong".into(),
	});
	settings.pool.acquire_timeout_secs = 2;
	settings
}

#[tokio::test]
async fn connect_falls_back_to_embedded_engine() {
	let dir = TempDir::new().unwrap();
	let db = Database::new(dead_primary_settings(dir.path()));

	let engine = db.connect(None).await.unwrap();
	assert_eq!(engine, EngineKind::Sqlite);
	assert_eq!(db.current_engine(), Some(EngineKind::Sqlite));
	assert!(!db.has_dual().await);
	db.close().await;
}

#[tokio::test]
async fn bootstrap_is_idempotent() {
	let dir = TempDir::new().unwrap();
	let db = Database::new(sqlite_only_settings(dir.path()));

	db.connect(Some(EngineKind::Sqlite)).await.unwrap();
	db.connect(Some(EngineKind::Sqlite)).await.unwrap();

	let ctx = QueryContext::new();
	let rows = db
		.execute(
			&ctx,
			"SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?",
			&Params::positional(["users"]),
			true,
		)
		.await
		.unwrap()
		.into_rows();
	assert_eq!(rows.len(), 1, "users table exists exactly once");
	db.close().await;
}

#[tokio::test]
async fn fetch_semantics_distinguish_rows_from_done() {
	let dir = TempDir::new().unwrap();
	let db = Database::new(sqlite_only_settings(dir.path()));
	db.connect(None).await.unwrap();
	let ctx = QueryContext::new();

	// Row-producing statement with no rows: empty Rows, not Done.
	let outcome = db
		.execute(&ctx, "SELECT * FROM notes", &Params::none(), true)
		.await
		.unwrap();
	assert_eq!(outcome, ExecOutcome::Rows(vec![]));

	// Pure DDL with fetch requested: Done, not an empty row set.
	let outcome = db
		.execute(
			&ctx,
			"CREATE TABLE IF NOT EXISTS scratch (id INTEGER)",
			&Params::none(),
			true,
		)
		.await
		.unwrap();
	assert!(matches!(outcome, ExecOutcome::Done(_)));

	// fetch = false reports success even with zero rows affected.
	let outcome = db
		.execute(
			&ctx,
			"DELETE FROM notes WHERE id = ?",
			&Params::positional([123456i64]),
			false,
		)
		.await
		.unwrap();
	assert_eq!(outcome, ExecOutcome::Done(0));
	db.close().await;
}

#[tokio::test]
async fn duplicate_username_is_a_distinguished_error() {
	let dir = TempDir::new().unwrap();
	let db = Database::new(sqlite_only_settings(dir.path()));
	db.connect(None).await.unwrap();
	let ctx = QueryContext::new();

	db.users().create(&ctx, "alice", "hash-1", "alice@example.com").await.unwrap();
	let err = db
		.users()
		.create(&ctx, "alice", "hash-2", "other@example.com")
		.await
		.unwrap_err();
	assert!(matches!(err, DatabaseError::DuplicateKey(_)), "got {err:?}");
	db.close().await;
}

#[tokio::test]
async fn note_store_round_trip() {
	let dir = TempDir::new().unwrap();
	let db = Database::new(sqlite_only_settings(dir.path()));
	db.connect(None).await.unwrap();
	let ctx = QueryContext::new();

	let user = db.users().create(&ctx, "bob", "hash", "bob@example.com").await.unwrap();
	let fetched = db.users().by_id(&ctx, user.id).await.unwrap().unwrap();
	assert_eq!(fetched.username, "bob");

	let note = db
		.notes()
		.create(&ctx, user.id, "first", "# hello")
		.await
		.unwrap();
	assert_eq!(note.title, "first");

	assert!(db.notes().update(&ctx, note.id, "renamed", "# hi").await.unwrap());
	let updated = db.notes().by_id(&ctx, note.id).await.unwrap().unwrap();
	assert_eq!(updated.title, "renamed");
	assert!(updated.updated_at >= updated.created_at);

	let listed = db.notes().list_for_user(&ctx, user.id).await.unwrap();
	assert_eq!(listed.len(), 1);

	assert!(db.notes().delete(&ctx, note.id).await.unwrap());
	assert!(db.notes().by_id(&ctx, note.id).await.unwrap().is_none());
	db.close().await;
}

#[tokio::test]
async fn dual_write_survives_a_dead_primary_leg() {
	let dir = TempDir::new().unwrap();
	let db = Database::new(dead_primary_settings(dir.path()));
	db.connect(None).await.unwrap();
	let ctx = QueryContext::new();

	let engine_before = db.current_engine();
	let user = db
		.users()
		.create(&ctx, "carol", "hash", "carol@example.com")
		.await
		.expect("dual-write succeeds when only the secondary leg is alive");
	assert_eq!(user.username, "carol");

	// The caller's engine selection survives the dual-write.
	assert_eq!(db.current_engine(), engine_before);
	db.close().await;
}

#[tokio::test]
async fn partial_dual_write_warns_about_divergence() {
	let dir = TempDir::new().unwrap();
	let db = Database::new(dead_primary_settings(dir.path()));
	db.connect(None).await.unwrap();
	let ctx = QueryContext::new();

	let logs = LogCapture::default();
	let subscriber = tracing_subscriber::fmt()
		.with_writer(logs.clone())
		.with_max_level(tracing::Level::WARN)
		.finish();
	let _guard = tracing::subscriber::set_default(subscriber);

	db.users().create(&ctx, "erin", "hash", "erin@example.com").await.unwrap();

	let output = logs.contents();
	assert!(
		output.contains("dual-write leg failed"),
		"divergence warning missing from logs: {output}"
	);
	db.close().await;
}

#[tokio::test]
async fn failed_sync_appends_a_failed_history_record() {
	let dir = TempDir::new().unwrap();
	let db = Database::new(dead_primary_settings(dir.path()));
	db.connect(None).await.unwrap();
	let ctx = QueryContext::new();

	// Primary is unreachable, so a primary -> secondary pass cannot start.
	let err = db.sync(&ctx, None, None, &[]).await.unwrap_err();
	assert!(matches!(err, DatabaseError::ConnectionError { .. }));

	let records = db.history().recent_syncs(&ctx, 10).await.unwrap();
	assert_eq!(records.len(), 1);
	assert_eq!(records[0].status, RecordStatus::Failed);
	assert_eq!(records[0].direction, "postgres->sqlite");
	assert!(records[0].error_message.is_some());
	db.close().await;
}

#[tokio::test]
async fn autosync_configuration_round_trip() {
	let dir = TempDir::new().unwrap();
	let db = Database::new(sqlite_only_settings(dir.path()));
	db.connect(None).await.unwrap();
	let ctx = QueryContext::new();

	let initial = db.autosync().load(&ctx).await.unwrap();
	assert!(!initial.enabled, "seeded disabled");
	assert_eq!(initial.interval_minutes, 60);
	assert_eq!(initial.last_run, None);

	db.autosync().configure(&ctx, true, 15).await.unwrap();
	let updated = db.autosync().load(&ctx).await.unwrap();
	assert!(updated.enabled);
	assert_eq!(updated.interval_minutes, 15);

	// Disabled schedule never triggers a pass.
	db.autosync().configure(&ctx, false, 15).await.unwrap();
	assert!(db.auto_sync_if_due(&ctx).await.unwrap().is_none());
	db.close().await;
}

#[tokio::test]
async fn backup_writes_dump_and_history_row() {
	let dir = TempDir::new().unwrap();
	let db = Database::new(sqlite_only_settings(dir.path()));
	db.connect(None).await.unwrap();
	let ctx = QueryContext::new();

	let user = db.users().create(&ctx, "dave", "hash", "dave@example.com").await.unwrap();
	db.notes().create(&ctx, user.id, "kept", "body with 'quotes'").await.unwrap();

	let backup_dir = TempDir::new().unwrap();
	let report = db
		.backup(&ctx, EngineKind::Sqlite, backup_dir.path())
		.await
		.unwrap();
	assert!(report.file_path.exists());
	assert!(report.file_size_bytes > 0);
	assert!(report.rows >= 2, "users and notes rows dumped");

	let dump = std::fs::read_to_string(&report.file_path).unwrap();
	assert!(dump.contains("CREATE TABLE IF NOT EXISTS"));
	assert!(dump.contains("body with ''quotes''"));
	// Bookkeeping tables stay out of backups.
	assert!(!dump.contains("INSERT INTO \"app_settings\""));

	let records = db.history().recent_backups(&ctx, 5).await.unwrap();
	assert_eq!(records.len(), 1);
	assert_eq!(records[0].status, RecordStatus::Success);
	assert_eq!(records[0].db_type, "sqlite");
	db.close().await;
}

#[tokio::test]
async fn explicit_engine_context_overrides_default() {
	let dir = TempDir::new().unwrap();
	let db = Database::new(sqlite_only_settings(dir.path()));
	db.connect(None).await.unwrap();

	let pinned = QueryContext::new().with_engine(EngineKind::Sqlite);
	let outcome = db
		.execute(&pinned, "SELECT 1 AS one", &Params::none(), true)
		.await
		.unwrap();
	assert_eq!(outcome.into_rows().len(), 1);

	// Pinning a dead engine fails the call without touching the default.
	let dead = QueryContext::new().with_engine(EngineKind::Mysql);
	let err = db.execute(&dead, "SELECT 1", &Params::none(), true).await.unwrap_err();
	assert!(matches!(
		err,
		DatabaseError::ConfigError(_) | DatabaseError::ConnectionError { .. }
	));
	assert_eq!(db.current_engine(), Some(EngineKind::Sqlite));
	db.close().await;
}
