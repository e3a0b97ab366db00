mod drift;
mod ingest;
mod reclaim;

pub use self::ingest::Ingest;
pub use self::reclaim::Reclaim;

use crate::dir::MediaDir;
use crate::error::{Error, ErrorKind, Result};
use crate::hooks::{Registry, RegistryHandle};
use crate::refs::contains_references;
use exn::ResultExt;
use recall_config::Config;
use recall_store::{Fact, LogHandle, Repository};
use std::path::Path;
use std::sync::Arc;

/// A media file (or reference) that could not be processed. The rest of the
/// batch went ahead without it.
#[derive(Debug)]
pub struct MediaFailure {
    /// The reference or media filename as it was found.
    pub path: String,
    pub error: Error,
}

/// Keeps one store's media directory and media registry consistent.
///
/// Every operation awaits its steps one after another; run one operation at
/// a time per store.
#[derive(Clone)]
pub struct MediaEngine {
    dir: MediaDir,
    store: Repository,
    log: LogHandle,
    hooks: RegistryHandle,
}
impl MediaEngine {
    /// Engine for the media directory derived from `config`, creating the
    /// directory if needed. Events go to the store's own log table and no
    /// hooks are registered.
    pub fn new(config: &Config, store: Repository) -> Result<Self> {
        let root = config.media_dir().or_raise(|| ErrorKind::Config)?;
        Ok(Self::with_dir(MediaDir::new(root)?, store))
    }

    pub fn with_dir(dir: MediaDir, store: Repository) -> Self {
        let log: LogHandle = Arc::new(store.clone());
        Self { dir, store, log, hooks: Arc::new(Registry::default()) }
    }

    /// Send events somewhere other than the store's log table.
    pub fn with_log(mut self, log: LogHandle) -> Self {
        self.log = log;
        self
    }

    pub fn with_hooks(mut self, hooks: RegistryHandle) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn media_dir(&self) -> &Path {
        self.dir.root()
    }

    pub fn dir(&self) -> &MediaDir {
        &self.dir
    }

    /// Cheap check for whether [`ingest`](Self::ingest) has anything to do.
    pub fn fact_references_media(&self, fact: &Fact) -> bool {
        fact.fields.values().any(|value| contains_references(value))
    }

    /// See [`MediaDir::drift_signal`].
    pub async fn drift_signal(&self, filename: impl AsRef<Path>) -> Result<String> {
        self.dir.drift_signal(filename).await
    }
}
