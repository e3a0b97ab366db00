//! Media consistency engine.
//!
//! Facts reference media files through `src="..."` markers inside their field
//! values; the files themselves live in a media directory next to the store.
//! Nothing stops users (or other tools) from editing, adding or deleting files
//! in that directory behind our back, so this crate keeps the two sides in
//! step:
//!
//! - [`MediaEngine::ingest`] copies newly referenced files into the media
//!   directory, rewrites references to relative forward-slash paths and
//!   registers them.
//! - [`MediaEngine::detect_edited_media_files`] compares a cheap drift signal
//!   (modification time) against the registry to spot external edits.
//! - [`MediaEngine::reclaim_orphaned_media`] deletes files no fact references.
//!   Ingestion never tracks which fact owns which file, so this is the only
//!   way media gets deleted, and it only runs when explicitly asked to.
//!
//! Every operation reports what it did through an
//! [`EventLog`](recall_store::EventLog) so sync can replay it elsewhere.

mod context;
mod dir;
mod engine;
pub mod error;
mod hooks;
mod path;
mod refs;

pub use crate::context::Context;
pub use crate::dir::{MediaDir, RESERVED_PREFIX};
pub use crate::engine::{Ingest, MediaEngine, MediaFailure, Reclaim};
pub use crate::hooks::{HookHandle, HookKind, HookRegistry, MediaHook, Registry, RegistryHandle};
pub use crate::path::{to_unix, validate as validate_path};
pub use crate::refs::{contains_references, references};
