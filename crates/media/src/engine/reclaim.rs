use crate::engine::{MediaEngine, MediaFailure};
use crate::error::{Error, ErrorKind, Result};
use crate::path::{normalize_separators, to_unix, validate as validate_path};
use crate::refs::references;
use exn::ResultExt;
use futures::StreamExt;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::instrument;

/// Outcome of [`MediaEngine::reclaim_orphaned_media`].
#[derive(Debug, Default)]
pub struct Reclaim {
    /// Deleted media files.
    pub deleted: Vec<String>,
    /// Directories removed because they ended up empty.
    pub pruned: Vec<String>,
    pub failures: Vec<MediaFailure>,
}

impl MediaEngine {
    /// Delete every media file no fact references, then remove directories
    /// left empty. Files under reserved (`_`-prefixed) directories are never
    /// considered.
    ///
    /// Deleted files are dropped from the media registry and reported as
    /// deleted, also during a sync session: replicas only ever learn about
    /// deletions from the log. A file that can't be deleted is recorded in
    /// [`Reclaim::failures`] and keeps its registry entry. So is a directory
    /// that can't be read, whose files are then left alone.
    ///
    /// Ingestion doesn't track which fact uses which file, so this is the
    /// only place media gets deleted. Nothing calls it automatically.
    #[instrument(skip(self))]
    pub async fn reclaim_orphaned_media(&self) -> Result<Reclaim> {
        let values = self.store.list_field_values_with_media().await.or_raise(|| ErrorKind::Store)?;
        let referenced: HashSet<String> =
            values.iter().flat_map(|value| references(value)).map(canonical_reference).collect();

        let mut reclaim = Reclaim::default();
        // The path on disk is kept next to its name; the name is lossy for
        // filenames that aren't valid UTF-8.
        let mut present: Vec<(String, PathBuf)> = Vec::new();
        let mut files = self.dir.list_stream();
        while let Some(file) = files.next().await {
            match file {
                Ok(path) => present.push((to_unix(&path), path)),
                Err(error) => {
                    tracing::warn!(%error, "Could not list media directory");
                    reclaim.failures.push(self.walk_failure(error));
                },
            }
        }
        present.sort();

        for (filename, path) in present.into_iter().filter(|(filename, _)| !referenced.contains(filename)) {
            if let Err(error) = self.dir.delete(&path).await {
                tracing::warn!(filename, %error, "Could not delete orphaned media file");
                reclaim.failures.push(MediaFailure { path: filename, error });
                continue;
            }
            self.store.delete_media(&filename).await.or_raise(|| ErrorKind::Store)?;
            self.log.deleted_media_file(&filename).await.or_raise(|| ErrorKind::Store)?;
            tracing::debug!(filename, "Deleted orphaned media file");
            reclaim.deleted.push(filename);
        }

        match self.dir.prune_empty_dirs().await {
            Ok(pruned) => reclaim.pruned = pruned.iter().map(to_unix).collect(),
            Err(error) => {
                tracing::warn!(%error, "Could not prune empty media directories");
                reclaim.failures.push(self.walk_failure(error));
            },
        }
        tracing::info!(
            deleted = reclaim.deleted.len(),
            pruned = reclaim.pruned.len(),
            failed = reclaim.failures.len(),
            "Reclaimed orphaned media"
        );
        Ok(reclaim)
    }

    /// A failure that concerns a directory rather than a single file, named
    /// relative to the media directory where possible.
    fn walk_failure(&self, error: Error) -> MediaFailure {
        let path = match &*error {
            ErrorKind::NotFound(path) | ErrorKind::PermissionDenied(path) | ErrorKind::InvalidPath(path) => {
                match path.strip_prefix(self.dir.root()) {
                    Ok(relative) if relative == Path::new("") => ".".to_string(),
                    Ok(relative) => to_unix(relative),
                    Err(_) => path.display().to_string(),
                }
            },
            _ => ".".to_string(),
        };
        MediaFailure { path, error }
    }
}

/// A reference in the form it would have after ingestion, so that a stray
/// `pics\cat.png` still protects `pics/cat.png`.
fn canonical_reference(reference: &str) -> String {
    let normalized = normalize_separators(reference);
    match validate_path(&normalized) {
        Ok(path) => to_unix(path),
        Err(_) => normalized,
    }
}
