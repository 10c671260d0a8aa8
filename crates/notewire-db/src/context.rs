//! Call-scoped query context
//!
//! The active engine rides on an explicit context value instead of shared
//! mutable state. Dual-write and sync derive per-leg contexts with
//! [`QueryContext::with_engine`]; the caller's context is never mutated, so
//! the pre-call engine selection survives every exit path by construction.

use notewire_conf::EngineKind;

/// Selects which engine a call operates against.
///
/// An empty context resolves to the registry's default engine (the first
/// engine that connected successfully).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryContext {
	engine: Option<EngineKind>,
}

impl QueryContext {
	pub fn new() -> Self {
		Self::default()
	}

	/// A copy of this context pinned to `kind` for the duration of one call.
	pub fn with_engine(self, kind: EngineKind) -> Self {
		Self { engine: Some(kind) }
	}

	pub fn engine(&self) -> Option<EngineKind> {
		self.engine
	}
}
