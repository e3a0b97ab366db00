use crate::context::Context;
use crate::engine::{MediaEngine, MediaFailure};
use crate::error::{ErrorKind, Result};
use crate::path::{normalize_separators, to_unix, validate as validate_path};
use crate::refs::{is_remote, references, rewrite};
use exn::ResultExt;
use recall_store::{Fact, MediaEntry};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::instrument;

/// Outcome of [`MediaEngine::ingest`].
#[derive(Debug)]
pub struct Ingest {
    /// The fact with every resolved reference rewritten.
    pub fact: Fact,
    /// Filenames registered by this call.
    pub added: Vec<String>,
    pub failures: Vec<MediaFailure>,
}

impl MediaEngine {
    /// Bring every file referenced by `fact` under management.
    ///
    /// - Absolute references are copied into the media directory.
    /// - Relative references get forward slashes.
    /// - Remote references (`https://...`) are left alone.
    ///
    /// Rewritten fields are written back to the store, so the fact must
    /// already be stored. Files not yet in the media registry are registered
    /// and, outside of a sync session, reported as added.
    ///
    /// Ingesting the same fact twice is a no-op the second time. A reference
    /// that cannot be resolved (missing source, unreadable file) ends up in
    /// [`Ingest::failures`]; the other references still go ahead. A failed
    /// absolute reference is left untouched in the fact, while a relative one
    /// still gets its separators normalized since that needs no file.
    #[instrument(skip_all, fields(fact = %fact.id))]
    pub async fn ingest(&self, fact: &Fact, ctx: &Context) -> Result<Ingest> {
        let mut failures = Vec::new();
        // Original reference -> final filename.
        let mut resolved: BTreeMap<String, String> = BTreeMap::new();
        for reference in fact.fields.values().flat_map(|value| references(value)) {
            if resolved.contains_key(reference) || failures.iter().any(|f: &MediaFailure| f.path == reference) {
                continue;
            }
            if is_remote(reference) {
                tracing::debug!(reference, "Skipping remote media reference");
                continue;
            }
            match self.resolve(reference).await {
                Ok(filename) => {
                    resolved.insert(reference.to_string(), filename);
                },
                Err(error) => {
                    tracing::warn!(reference, %error, "Could not ingest media reference");
                    failures.push(MediaFailure { path: reference.to_string(), error });
                },
            }
        }

        // Registration needs the file in place; references whose file is
        // missing are treated like failed copies.
        let mut added = Vec::new();
        let mut rewrites = BTreeMap::new();
        for (reference, filename) in resolved {
            match self.register(&filename, ctx).await {
                Ok(true) => added.push(filename.clone()),
                Ok(false) => {},
                Err(error) if matches!(&*error, ErrorKind::Store) => return Err(error),
                Err(error) => {
                    tracing::warn!(reference, %error, "Could not register media file");
                    failures.push(MediaFailure { path: reference.clone(), error });
                    if Path::new(&reference).is_absolute() {
                        continue;
                    }
                },
            }
            rewrites.insert(reference, filename);
        }

        let mut updated = fact.clone();
        for (key, value) in updated.fields.iter_mut() {
            let rewritten = rewrite(value, |reference| {
                rewrites.get(reference).filter(|filename| filename.as_str() != reference).cloned()
            });
            if rewritten != value.as_str() {
                let rewritten = rewritten.into_owned();
                self.store.update_fact_field(&fact.id, key, &rewritten).await.or_raise(|| ErrorKind::Store)?;
                *value = rewritten;
            }
        }

        tracing::info!(added = added.len(), failed = failures.len(), "Ingested media");
        Ok(Ingest { fact: updated, added, failures })
    }

    /// Turn a reference into a filename relative to the media directory,
    /// copying the file in if it lives elsewhere.
    async fn resolve(&self, reference: &str) -> Result<String> {
        let path = Path::new(reference);
        if path.is_absolute() {
            return self.dir.copy_in(path).await;
        }
        let normalized = normalize_separators(reference);
        Ok(to_unix(validate_path(&normalized)?))
    }

    /// Add a filename to the media registry. Returns `true` if it was not
    /// registered before.
    async fn register(&self, filename: &str, ctx: &Context) -> Result<bool> {
        if self.store.get_media(filename).await.or_raise(|| ErrorKind::Store)?.is_some() {
            return Ok(false);
        }
        let drift = self.dir.drift_signal(filename).await?;
        let inserted =
            self.store.insert_media(&MediaEntry::new(filename, drift)).await.or_raise(|| ErrorKind::Store)?;
        if inserted {
            tracing::debug!(filename, "Registered media file");
            if !ctx.is_syncing() {
                self.log.added_media_file(filename).await.or_raise(|| ErrorKind::Store)?;
            }
        }
        Ok(inserted)
    }
}
