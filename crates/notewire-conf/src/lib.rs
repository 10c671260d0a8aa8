//! # Notewire Configuration
//!
//! Settings for the dual-engine database core: per-engine connection
//! parameters, the fixed engine priority list, pool sizing, and the logging
//! switch.
//!
//! Settings are loaded from a TOML file and can be overridden through
//! `NOTEWIRE_*` environment variables:
//!
//! ```rust
//! use notewire_conf::Settings;
//!
//! let settings = Settings::from_toml_str(
//!     r#"
//!     logging = true
//!
//!     [sqlite]
//!     path = "notes.db"
//!     "#,
//! )
//! .unwrap();
//!
//! assert!(settings.logging);
//! ```

pub mod engine;
pub mod env;
pub mod error;
pub mod settings;

pub use engine::EngineKind;
pub use error::SettingsError;
pub use settings::{PoolSettings, ServerSettings, Settings, SqliteSettings};
