//! Media path validation and the forward-slash convention.
//!
//! Filenames in the registry and inside fact fields are always relative to
//! the media directory and always use `/`, whatever the host OS. These helpers
//! convert between that convention and [`Path`]s, and stop any path from
//! escaping the media directory.

use std::path::{Component, Path, PathBuf};

use crate::error::{ErrorKind, Result};

/// Validates a media path for security and correctness.
/// Ensures that paths don't escape the media directory (no `..` traversal).
///
/// # Returns
/// Returns the normalized path if valid, or [`InvalidPath`](crate::error::ErrorKind::InvalidPath)
/// if invalid.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use recall_media::validate_path;
/// // Valid paths
/// assert!(validate_path("pics/cat.png").is_ok());
/// assert!(validate_path("a/../cat.png").is_ok()); // (never leaves the media dir)
/// // Invalid paths
/// assert!(validate_path("../etc/passwd").is_err());
/// assert!(validate_path("a\0b").is_err());
/// // Paths get resolved
/// assert_eq!(
///     validate_path("wrong/.././pics//cat.png").unwrap(),
///     Path::new("pics/cat.png")
/// );
/// ```
pub fn validate(path: impl AsRef<Path>) -> Result<PathBuf> {
    let mut components = Vec::new();
    for component in path.as_ref().components() {
        match component {
            Component::Normal(s) => {
                // Null bytes pass through Path::components() on Unix but cause
                // truncation in C-based syscalls, reject them explicitly.
                if s.as_encoded_bytes().contains(&0) {
                    exn::bail!(ErrorKind::InvalidPath(path.as_ref().to_path_buf()));
                }
                components.push(s)
            },
            Component::CurDir | Component::RootDir => {},
            Component::Prefix(_) => exn::bail!(ErrorKind::InvalidPath(path.as_ref().to_path_buf())),
            Component::ParentDir => {
                if components.pop().is_none() {
                    exn::bail!(ErrorKind::InvalidPath(path.as_ref().to_path_buf()));
                }
            },
        }
    }
    match components.is_empty() {
        true => exn::bail!(ErrorKind::InvalidPath(path.as_ref().to_path_buf())),
        false => Ok(components.into_iter().collect()),
    }
}

/// Render a relative path using forward slashes.
///
/// Only normal components are kept, so feed it validated paths.
pub fn to_unix(path: impl AsRef<Path>) -> String {
    path.as_ref()
        .components()
        .filter_map(|component| match component {
            Component::Normal(s) => Some(s.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Normalize a relative reference typed by a user (possibly on Windows).
pub(crate) fn normalize_separators(reference: &str) -> String {
    reference.replace('\\', "/")
}
