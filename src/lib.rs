//! # Notewire
//!
//! Facade crate for the Notewire dual-engine database core: a connection
//! manager that unifies heterogeneous database engines behind one query
//! interface, keeps a primary and a secondary store consistent through
//! opportunistic dual-write, and falls back gracefully when one engine is
//! unavailable.
//!
//! The member crates:
//!
//! - [`conf`] (`notewire-conf`): typed settings, engine priority, env overrides
//! - [`db`] (`notewire-db`): backends, registry, executor, dual-write,
//!   synchronizer, stores, and the audit surfaces
//!
//! ```rust,no_run
//! use notewire::prelude::*;
//!
//! # async fn run() -> Result<(), notewire::db::DatabaseError> {
//! let settings = Settings::load("notewire.toml")?;
//! let db = Database::new(settings);
//! let engine = db.connect(None).await?;
//! println!("active engine: {engine}");
//! # Ok(())
//! # }
//! ```

pub use notewire_conf as conf;
pub use notewire_db as db;

pub mod prelude {
	pub use notewire_conf::{EngineKind, Settings};
	pub use notewire_db::{
		Database, ExecOutcome, Params, QueryContext, QueryValue, SyncOutcome,
	};
}
