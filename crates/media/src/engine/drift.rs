use crate::engine::MediaEngine;
use crate::error::{ErrorKind, Result};
use crate::hooks::HookKind;
use exn::ResultExt;
use tracing::instrument;

impl MediaEngine {
    /// Find registered media files that were modified outside the
    /// application, update their drift signal and report them as edited.
    ///
    /// Files that disappeared are skipped; reclaiming orphans deals with
    /// absence. Afterwards every field value of every fact is handed to the
    /// [`HookKind::EditedMediaCheck`] hooks, so media the engine doesn't
    /// manage itself can be checked too.
    ///
    /// Returns the edited filenames.
    #[instrument(skip(self))]
    pub async fn detect_edited_media_files(&self) -> Result<Vec<String>> {
        let entries = self.store.list_media().await.or_raise(|| ErrorKind::Store)?;
        let mut edited = Vec::new();
        for entry in entries {
            match self.dir.drift_signal(&entry.filename).await {
                Ok(signal) if signal != entry.drift => edited.push((entry.filename, signal)),
                Ok(_) => {},
                Err(e) if matches!(&*e, ErrorKind::NotFound(_)) => {
                    tracing::debug!(filename = entry.filename, "Registered media file is missing");
                },
                Err(e) => tracing::warn!(filename = entry.filename, error = %e, "Could not check media file"),
            }
        }

        for (filename, signal) in &edited {
            self.store.update_media_drift(filename, signal).await.or_raise(|| ErrorKind::Store)?;
            self.log.edited_media_file(filename).await.or_raise(|| ErrorKind::Store)?;
            tracing::debug!(filename, "Media file was edited");
        }

        let hooks = self.hooks.hooks(HookKind::EditedMediaCheck);
        if !hooks.is_empty() {
            let values = self.store.list_field_values().await.or_raise(|| ErrorKind::Store)?;
            for value in &values {
                for hook in &hooks {
                    hook.run(value).await.or_raise(|| ErrorKind::Hook(hook.name().to_string()))?;
                }
            }
        }

        tracing::info!(edited = edited.len(), "Checked media files for edits");
        Ok(edited.into_iter().map(|(filename, _)| filename).collect())
    }
}
