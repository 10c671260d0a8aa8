//! Synchronizer tests against two live embedded backends (two temp files),
//! covering the dual-store reconciliation paths without external servers.

use notewire_conf::PoolSettings;
use notewire_db::backends::{EngineBackend, SqliteBackend};
use notewire_db::{QueryValue, SyncPhase, Synchronizer};
use tempfile::TempDir;

async fn backend(dir: &TempDir, name: &str) -> SqliteBackend {
	let pool = PoolSettings {
		max_connections: 5,
		acquire_timeout_secs: 5,
	};
	SqliteBackend::connect(&dir.path().join(name), &pool).await.unwrap()
}

async fn seed_notes(backend: &SqliteBackend) {
	backend
		.run(
			"CREATE TABLE notes ( \
			 id INTEGER PRIMARY KEY, \
			 user_id INTEGER NOT NULL, \
			 title TEXT NOT NULL, \
			 pinned INTEGER NOT NULL, \
			 score REAL )",
			Vec::new(),
		)
		.await
		.unwrap();
	backend
		.run(
			"INSERT INTO notes (id, user_id, title, pinned, score) VALUES \
			 (1, 5, 'first', 1, 0.5), (2, 7, 'second', 0, NULL)",
			Vec::new(),
		)
		.await
		.unwrap();
}

#[tokio::test]
async fn sync_round_trip_copies_structure_and_rows() {
	let dir = TempDir::new().unwrap();
	let source = backend(&dir, "source.db").await;
	let target = backend(&dir, "target.db").await;
	seed_notes(&source).await;

	let synchronizer = Synchronizer::new();
	let outcome = synchronizer
		.sync_between(&source, &target, &["notes".to_string()])
		.await
		.unwrap();

	assert!(outcome.is_complete());
	assert_eq!(outcome.synced, vec!["notes"]);
	assert_eq!(outcome.rows_copied, 2);

	let rows = target
		.run("SELECT * FROM notes ORDER BY id", Vec::new())
		.await
		.unwrap()
		.into_rows();
	assert_eq!(rows.len(), 2);
	assert_eq!(rows[0].get::<i64>("id").unwrap(), 1);
	assert_eq!(rows[0].get::<String>("title").unwrap(), "first");
	assert_eq!(rows[0].get::<i64>("pinned").unwrap(), 1);
	assert_eq!(rows[1].get::<i64>("user_id").unwrap(), 7);
	assert_eq!(rows[1].data.get("score"), Some(&QueryValue::Null));
}

#[tokio::test]
async fn sync_replaces_existing_target_rows() {
	let dir = TempDir::new().unwrap();
	let source = backend(&dir, "source.db").await;
	let target = backend(&dir, "target.db").await;
	seed_notes(&source).await;

	// Stale target data from an earlier divergent write.
	target
		.run(
			"CREATE TABLE notes ( \
			 id INTEGER, user_id INTEGER, title TEXT, pinned INTEGER, score REAL )",
			Vec::new(),
		)
		.await
		.unwrap();
	target
		.run(
			"INSERT INTO notes (id, user_id, title, pinned, score) \
			 VALUES (99, 1, 'stale', 0, 0.0)",
			Vec::new(),
		)
		.await
		.unwrap();

	let outcome = Synchronizer::new()
		.sync_between(&source, &target, &["notes".to_string()])
		.await
		.unwrap();
	assert!(outcome.is_complete());

	let rows = target
		.run("SELECT id FROM notes ORDER BY id", Vec::new())
		.await
		.unwrap()
		.into_rows();
	let ids: Vec<i64> = rows.iter().map(|r| r.get::<i64>("id").unwrap()).collect();
	assert_eq!(ids, vec![1, 2], "stale row replaced by source rows");
}

#[tokio::test]
async fn one_broken_table_does_not_stop_the_pass() {
	let dir = TempDir::new().unwrap();
	let source = backend(&dir, "source.db").await;
	let target = backend(&dir, "target.db").await;

	source
		.run("CREATE TABLE alpha (id INTEGER, label TEXT)", Vec::new())
		.await
		.unwrap();
	source
		.run("INSERT INTO alpha (id, label) VALUES (1, 'a'), (2, 'b')", Vec::new())
		.await
		.unwrap();
	source
		.run("CREATE TABLE broken (id INTEGER, extra TEXT)", Vec::new())
		.await
		.unwrap();
	source
		.run("INSERT INTO broken (id, extra) VALUES (1, 'x')", Vec::new())
		.await
		.unwrap();
	// The target already has a conflicting shape for `broken`; the
	// create-if-absent no-ops and the copy fails on the missing column.
	target
		.run("CREATE TABLE broken (other TEXT)", Vec::new())
		.await
		.unwrap();

	let outcome = Synchronizer::new().sync_between(&source, &target, &[]).await.unwrap();

	assert!(!outcome.is_complete());
	assert_eq!(outcome.synced, vec!["alpha"]);
	assert_eq!(outcome.failed.len(), 1);
	assert_eq!(outcome.failed[0].0, "broken");

	let rows = target
		.run("SELECT * FROM alpha ORDER BY id", Vec::new())
		.await
		.unwrap()
		.into_rows();
	assert_eq!(rows.len(), 2, "healthy table synced despite the broken one");
}

#[tokio::test]
async fn discovery_skips_bookkeeping_tables() {
	let dir = TempDir::new().unwrap();
	let source = backend(&dir, "source.db").await;
	let target = backend(&dir, "target.db").await;

	source
		.run("CREATE TABLE sync_history (id INTEGER, status TEXT)", Vec::new())
		.await
		.unwrap();
	source
		.run("CREATE TABLE journal (id INTEGER, body TEXT)", Vec::new())
		.await
		.unwrap();

	let outcome = Synchronizer::new().sync_between(&source, &target, &[]).await.unwrap();
	assert_eq!(outcome.synced, vec!["journal"]);

	let tables = target.list_tables().await.unwrap();
	assert!(!tables.contains(&"sync_history".to_string()));
}

#[tokio::test]
async fn explicitly_named_bookkeeping_table_still_syncs() {
	let dir = TempDir::new().unwrap();
	let source = backend(&dir, "source.db").await;
	let target = backend(&dir, "target.db").await;

	source
		.run("CREATE TABLE sync_history (id INTEGER, status TEXT)", Vec::new())
		.await
		.unwrap();
	source
		.run("INSERT INTO sync_history (id, status) VALUES (1, 'success')", Vec::new())
		.await
		.unwrap();

	let outcome = Synchronizer::new()
		.sync_between(&source, &target, &["sync_history".to_string()])
		.await
		.unwrap();
	assert_eq!(outcome.synced, vec!["sync_history"]);
	assert_eq!(outcome.rows_copied, 1);
}

#[tokio::test]
async fn phase_returns_to_idle_after_every_pass() {
	let dir = TempDir::new().unwrap();
	let source = backend(&dir, "source.db").await;
	let target = backend(&dir, "target.db").await;
	seed_notes(&source).await;

	let synchronizer = Synchronizer::new();
	assert_eq!(synchronizer.phase(), SyncPhase::Idle);
	synchronizer
		.sync_between(&source, &target, &["notes".to_string()])
		.await
		.unwrap();
	assert_eq!(synchronizer.phase(), SyncPhase::Idle);

	// A pass with a failing table also lands back on idle.
	let outcome = synchronizer
		.sync_between(&source, &target, &["no_such_table".to_string()])
		.await
		.unwrap();
	assert!(!outcome.is_complete());
	assert_eq!(synchronizer.phase(), SyncPhase::Idle);
}

#[tokio::test]
async fn copies_more_than_one_batch() {
	let dir = TempDir::new().unwrap();
	let source = backend(&dir, "source.db").await;
	let target = backend(&dir, "target.db").await;

	source
		.run("CREATE TABLE bulk (id INTEGER, body TEXT)", Vec::new())
		.await
		.unwrap();
	for chunk in (0..250).collect::<Vec<i64>>().chunks(50) {
		let tuples: Vec<String> =
			chunk.iter().map(|i| format!("({i}, 'row-{i}')")).collect();
		let sql = format!("INSERT INTO bulk (id, body) VALUES {}", tuples.join(", "));
		source.run(&sql, Vec::new()).await.unwrap();
	}

	let outcome = Synchronizer::new()
		.sync_between(&source, &target, &["bulk".to_string()])
		.await
		.unwrap();
	assert_eq!(outcome.rows_copied, 250);

	let rows = target
		.run("SELECT COUNT(*) AS n FROM bulk", Vec::new())
		.await
		.unwrap()
		.into_rows();
	assert_eq!(rows[0].get::<i64>("n").unwrap(), 250);
}
