//! # Notewire Database Core
//!
//! The dual-engine database abstraction and synchronization layer behind
//! the Notewire note service: one query interface over heterogeneous
//! engines, opportunistic dual-write against a primary and a secondary
//! store, and best-effort schema/data reconciliation between them.
//!
//! ## Layers
//!
//! - [`backends`]: one dialect adapter per engine (placeholder rewriting,
//!   bind coercion, row normalization, catalog introspection)
//! - [`registry`]: lazy connection ownership, liveness probing, and the
//!   explicit first-success-wins fallback chain
//! - [`executor`]: logical query execution against the context's engine
//! - [`dualwrite`]: the same mutation on both engines, legs independent
//! - [`sync`]: table structure and data reconciliation across engines
//! - [`store`], [`history`], [`backup`], [`autosync`]: the application
//!   surfaces built on top
//!
//! Synchronization is advisory and last-writer-wins; there are no ACID
//! cross-engine transactions. A partial dual-write leaves the stores
//! diverged until the next sync pass repairs them.
//!
//! ## Example
//!
//! ```rust,no_run
//! use notewire_conf::Settings;
//! use notewire_db::{Database, Params, QueryContext};
//!
//! # async fn run() -> Result<(), notewire_db::DatabaseError> {
//! let db = Database::new(Settings::default());
//! let ctx = QueryContext::new();
//!
//! let engine = db.connect(None).await?;
//! println!("connected to {engine}");
//!
//! db.execute_on_both(
//! 	&ctx,
//! 	"INSERT INTO notes (user_id, title, content, created_at, updated_at) \
//! 	 VALUES (?, ?, ?, ?, ?)",
//! 	&Params::positional([
//! 		notewire_db::QueryValue::Int(1),
//! 		"title".into(),
//! 		"body".into(),
//! 		chrono::Utc::now().into(),
//! 		chrono::Utc::now().into(),
//! 	]),
//! 	false,
//! )
//! .await?;
//! # Ok(())
//! # }
//! ```

pub mod autosync;
pub mod backends;
pub mod backup;
mod bootstrap;
pub mod context;
pub mod database;
pub mod dualwrite;
pub mod error;
pub mod executor;
pub mod history;
pub mod registry;
pub mod store;
pub mod sync;
pub mod types;

pub use autosync::{AutoSync, AutoSyncSettings};
pub use backends::EngineBackend;
pub use backup::{BackupManager, BackupReport};
pub use context::QueryContext;
pub use database::Database;
pub use dualwrite::DualWriteCoordinator;
pub use error::{DatabaseError, Result};
pub use executor::Executor;
pub use history::{BackupRecord, HistoryStore, RecordStatus, SyncRecord};
pub use notewire_conf::{EngineKind, Settings};
pub use registry::{FallbackAttempt, FallbackReport, Registry};
pub use store::{Note, NoteStore, User, UserStore};
pub use sync::typemap::{ColumnStructure, ColumnType, TableStructure};
pub use sync::{SyncOutcome, SyncPhase, Synchronizer};
pub use types::{ExecOutcome, Params, QueryValue, Row, RowSet};
