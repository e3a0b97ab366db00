//! Local media directory access.
//!
//! All paths handed to [`MediaDir`] are relative to the media directory and
//! validated before use; absolute paths only ever appear as the *source* of
//! [`copy_in`](MediaDir::copy_in).

use crate::error::{ErrorKind, Result};
use crate::path::{to_unix, validate as validate_path};
use async_stream::stream;
use exn::{OptionExt, ResultExt};
use futures::{Stream, TryStreamExt};
use std::fs::create_dir_all as sync_create_dir;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use time::OffsetDateTime;
use tokio::fs::{self, DirEntry};

/// Directories whose name starts with this prefix hold derived content
/// generated by the application itself (e.g. typeset formulas). They are
/// exempt from orphan scanning and directory pruning.
pub const RESERVED_PREFIX: &str = "_";
/// Upper bound on `name_N.ext` attempts when picking a collision-safe name.
const MAX_COLLISIONS: usize = 10_000;

type PathStream<'a> = Pin<Box<dyn Stream<Item = Result<PathBuf>> + Send + 'a>>;

enum WalkEntry {
    File(PathBuf),
    Descend(PathBuf),
    Skip,
}

/// The media directory of one store.
///
/// # Examples
///
/// ```no_run
/// use recall_media::MediaDir;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let media = MediaDir::new("/home/user/.local/share/recall/default.db_media")?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct MediaDir {
    root: PathBuf,
}
impl MediaDir {
    /// Open (and create, if needed) a media directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is not absolute, or exists but is not a
    /// directory.
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_absolute() {
            exn::bail!(ErrorKind::InvalidPath(root));
        }
        if root.exists() {
            if !root.is_dir() {
                exn::bail!(ErrorKind::InvalidPath(root));
            }
        } else {
            // Non-async on purpose: happens once when the engine is built and
            // isn't worth making the constructor async.
            sync_create_dir(&root).map_err(|e| Self::map_io_error(e, &root))?;
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the absolute path for a relative media path.
    fn absolute_path(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        let validated = validate_path(path.as_ref())?;
        Ok(self.root.join(validated))
    }

    /// Convert an absolute path inside the media directory back to a relative one.
    fn relative_path(&self, absolute: impl AsRef<Path>) -> Result<PathBuf> {
        let absolute = absolute.as_ref();
        let relative = absolute
            .strip_prefix(&self.root)
            .or_raise(|| ErrorKind::InvalidPath(absolute.to_path_buf()))?;
        validate_path(relative)
    }

    fn map_io_error(e: std::io::Error, path: &Path) -> ErrorKind {
        match e.kind() {
            std::io::ErrorKind::NotFound => ErrorKind::NotFound(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied(path.to_path_buf()),
            _ => ErrorKind::Io(e),
        }
    }

    fn is_reserved(relative_dir: &Path) -> bool {
        relative_dir
            .file_name()
            .is_some_and(|name| name.to_string_lossy().starts_with(RESERVED_PREFIX))
    }

    pub async fn exists(&self, path: impl AsRef<Path>) -> Result<bool> {
        let abs_path = self.absolute_path(path)?;
        Ok(fs::try_exists(&abs_path).await.map_err(ErrorKind::Io)?)
    }

    /// Cheap fingerprint used to notice edits made outside the application.
    ///
    /// The modification time in nanoseconds since the Unix epoch, as text.
    /// Only ever compare it for equality: an edit-then-revert within the
    /// timestamp resolution goes unnoticed, which is accepted in exchange for
    /// not hashing every file on every scan.
    pub async fn drift_signal(&self, path: impl AsRef<Path>) -> Result<String> {
        let path = path.as_ref();
        let abs_path = self.absolute_path(path)?;
        let metadata = fs::metadata(&abs_path).await.map_err(|e| Self::map_io_error(e, path))?;
        let modified: OffsetDateTime = metadata.modified().map_err(ErrorKind::Io)?.into();
        Ok(modified.unix_timestamp_nanos().to_string())
    }

    pub async fn read(&self, path: impl AsRef<Path>) -> Result<Vec<u8>> {
        let path = path.as_ref();
        let abs_path = self.absolute_path(path)?;
        Ok(fs::read(&abs_path).await.map_err(|e| Self::map_io_error(e, path))?)
    }

    pub async fn delete(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let abs_path = self.absolute_path(path)?;
        Ok(fs::remove_file(&abs_path).await.map_err(|e| Self::map_io_error(e, path))?)
    }

    /// Copy a file from anywhere on disk into the media directory and return
    /// its forward-slash name relative to the media directory.
    ///
    /// - A source already inside the media directory is not copied.
    /// - The file keeps its name (`cat.png`). If that name is taken by a file
    ///   with identical contents, the existing file is reused; if taken by
    ///   different contents, `cat_1.png`, `cat_2.png`, ... are tried.
    ///
    /// Re-running it for the same source is therefore a no-op.
    pub async fn copy_in(&self, source: impl AsRef<Path>) -> Result<String> {
        let source = source.as_ref();
        if source.starts_with(&self.root) {
            return Ok(to_unix(self.relative_path(source)?));
        }
        let file_name = source.file_name().ok_or_raise(|| ErrorKind::InvalidPath(source.to_path_buf()))?;
        let original = Path::new(file_name);
        let stem = original.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
        let extension = original.extension().map(|e| format!(".{}", e.to_string_lossy())).unwrap_or_default();

        let contents = fs::read(source).await.map_err(|e| Self::map_io_error(e, source))?;
        let source_hash = blake3::hash(&contents);
        for attempt in 0..MAX_COLLISIONS {
            let candidate = match attempt {
                0 => file_name.to_string_lossy().into_owned(),
                n => format!("{stem}_{n}{extension}"),
            };
            let target = self.root.join(&candidate);
            let metadata = match fs::metadata(&target).await {
                Ok(metadata) => metadata,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    fs::write(&target, &contents).await.map_err(|e| Self::map_io_error(e, &target))?;
                    tracing::debug!(source = %source.display(), target = candidate, "Copied media file");
                    return Ok(candidate);
                },
                Err(e) => exn::bail!(Self::map_io_error(e, &target)),
            };
            // Identical files have identical sizes.
            if !metadata.is_file() || metadata.len() != contents.len() as u64 {
                continue;
            }
            let existing = fs::read(&target).await.map_err(|e| Self::map_io_error(e, &target))?;
            if blake3::hash(&existing) == source_hash {
                tracing::debug!(source = %source.display(), target = candidate, "Identical media file already present");
                return Ok(candidate);
            }
        }
        exn::bail!(ErrorKind::AlreadyExists(self.root.join(file_name)))
    }

    /// Classify one directory entry for the walk.
    async fn process_entry(&self, entry: DirEntry) -> Result<WalkEntry> {
        let path = entry.path();
        let file_type = entry.file_type().await.map_err(|e| Self::map_io_error(e, &path))?;
        let relative = self.relative_path(&path)?;
        if file_type.is_dir() {
            if Self::is_reserved(&relative) {
                return Ok(WalkEntry::Skip);
            }
            return Ok(WalkEntry::Descend(path));
        }
        if file_type.is_file() {
            return Ok(WalkEntry::File(relative));
        }
        // Note: silently drop what is most likely a symlink.
        Ok(WalkEntry::Skip)
    }

    /// Stream the relative paths of all files in the media directory,
    /// skipping reserved directories entirely.
    pub fn list_stream(&self) -> PathStream<'_> {
        let mut stack = vec![self.root.clone()];
        Box::pin(stream! {
            'dirs: while let Some(current) = stack.pop() {
                let mut entries = match fs::read_dir(&current).await {
                    Ok(entries) => entries,
                    Err(err) if err.kind() == std::io::ErrorKind::NotFound => continue,
                    Err(err) => {
                        yield Err(exn::Exn::from(Self::map_io_error(err, &current)));
                        continue 'dirs;
                    }
                };
                'entries: loop {
                    let entry = match entries.next_entry().await {
                        Ok(Some(entry)) => entry,
                        Ok(None) => break 'entries,
                        Err(e) => { yield Err(exn::Exn::from(Self::map_io_error(e, &current))); continue 'entries; },
                    };
                    match self.process_entry(entry).await {
                        Ok(WalkEntry::File(f)) => yield Ok(f),
                        Ok(WalkEntry::Descend(d)) => stack.push(d),
                        Ok(WalkEntry::Skip) => {},
                        Err(e) => yield Err(e),
                    };
                }
            }
        })
    }

    /// Collect [`list_stream()`](Self::list_stream) into a [`Vec`].
    pub async fn list(&self) -> Result<Vec<PathBuf>> {
        self.list_stream().try_collect().await
    }

    /// All non-reserved directories below the root (the root itself excluded).
    ///
    /// Directories that can't be read are skipped along with everything
    /// below them.
    async fn directories(&self) -> Vec<PathBuf> {
        let mut found = Vec::new();
        let mut stack = vec![self.root.clone()];
        'dirs: while let Some(current) = stack.pop() {
            let mut entries = match fs::read_dir(&current).await {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!(path = %current.display(), error = %e, "Could not read media directory");
                    continue 'dirs;
                },
            };
            'entries: loop {
                let entry = match entries.next_entry().await {
                    Ok(Some(entry)) => entry,
                    Ok(None) => break 'entries,
                    Err(e) => {
                        tracing::warn!(path = %current.display(), error = %e, "Could not read media directory");
                        continue 'dirs;
                    },
                };
                match self.process_entry(entry).await {
                    Ok(WalkEntry::Descend(dir)) => {
                        found.push(dir.clone());
                        stack.push(dir);
                    },
                    Ok(_) => {},
                    Err(e) => tracing::warn!(path = %current.display(), error = %e, "Could not inspect media directory entry"),
                }
            }
        }
        found
    }

    /// Remove every empty directory, deepest first, so that a parent emptied
    /// by removing its children goes too. Reserved directories and the media
    /// directory itself are never removed. Directories that can't be read or
    /// removed are logged and kept.
    ///
    /// Returns the relative paths of the removed directories.
    pub async fn prune_empty_dirs(&self) -> Result<Vec<PathBuf>> {
        let mut dirs = self.directories().await;
        dirs.sort_by_key(|dir| std::cmp::Reverse(dir.components().count()));
        let mut removed = Vec::new();
        for dir in dirs {
            let is_empty = match fs::read_dir(&dir).await {
                Ok(mut entries) => entries.next_entry().await.map(|entry| entry.is_none()),
                Err(e) => Err(e),
            };
            match is_empty {
                Ok(true) => {},
                Ok(false) => continue,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => {
                    tracing::warn!(path = %dir.display(), error = %e, "Could not read media directory");
                    continue;
                },
            }
            match fs::remove_dir(&dir).await {
                Ok(()) => removed.push(self.relative_path(&dir)?),
                Err(e) => tracing::warn!(path = %dir.display(), error = %e, "Could not remove empty media directory"),
            }
        }
        Ok(removed)
    }
}
