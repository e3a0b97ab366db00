//! SQLite record store shared by the media and activity subsystems.
//!
//! The store holds the structured half of a flashcard collection: facts and
//! their field values, the media registry (one row per managed media file,
//! with an opaque drift signal), the append-only event log consumed by sync,
//! and serialized activity criteria.
//!
//! # Architecture
//! - **Facts** are keyed by an opaque id and own an unordered set of
//!   `(key, value)` fields. Media references live *inside* field values
//!   (`src="..."`); the store itself does not interpret them.
//! - **Media entries** are keyed by a forward-slash relative filename. The
//!   store never deletes them on fact edits; only explicit orphan
//!   reclamation does.
//! - **Log entries** are appended through the [`EventLog`] trait so callers
//!   can substitute their own sink.

mod db;
pub mod error;
mod log;
mod models;
mod repo;

pub use crate::db::Database;
pub use crate::log::{EventLog, LogHandle};
pub use crate::models::{Fact, LogEntry, LogEvent, MediaEntry, StoredCriterion};
pub use crate::repo::Repository;
