//! Typed repositories for the application flows
//!
//! Reads go to the active engine; mutations go through the dual-write
//! coordinator so both stores stay current. Password hashing happens in the
//! auth layer; the user store persists the hash it is handed.

pub mod notes;
pub mod users;

pub use notes::{Note, NoteStore};
pub use users::{User, UserStore};
