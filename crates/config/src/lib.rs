//! Configuration for the recall store and its media directory.
//!
//! Values are layered with [figment], lowest priority first:
//!
//! 1. Built-in defaults (platform data directory from [`directories`]),
//! 2. An optional TOML file,
//! 3. Environment variables prefixed with `RECALL_` (e.g. `RECALL_DATA_DIR`).
//!
//! The media directory is never configured directly. It is derived from the
//! data directory and the store path so that two stores sharing a data
//! directory never share media.

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::{OptionExt, ResultExt};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Prefix for environment variable overrides.
pub const ENV_PREFIX: &str = "RECALL_";
/// Store filename used when nothing else is configured.
pub const DEFAULT_STORE: &str = "default.db";
const MEDIA_SUFFIX: &str = "_media";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the store database and its media directory.
    pub data_dir: PathBuf,
    /// Store database path. Relative paths are resolved against `data_dir`.
    pub path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = ProjectDirs::from("", "", "recall")
            .map(|dirs| dirs.data_dir().to_path_buf())
            // No home directory (containers, CI); still needs to be absolute.
            .unwrap_or_else(|| std::env::temp_dir().join("recall"));
        Self {
            data_dir,
            path: PathBuf::from(DEFAULT_STORE),
        }
    }
}

impl Config {
    pub fn new(data_dir: impl Into<PathBuf>, path: impl Into<PathBuf>) -> Result<Self> {
        let config = Self {
            data_dir: data_dir.into(),
            path: path.into(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from defaults, an optional TOML file and the
    /// environment.
    ///
    /// An explicitly requested file that does not exist is an error; it is
    /// never silently ignored.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(file) = file {
            if !file.is_file() {
                exn::bail!(ErrorKind::NotFound(file.to_path_buf()));
            }
            tracing::debug!(path = %file.display(), "Loading configuration file");
            figment = figment.merge(Toml::file(file));
        }
        let config: Self = figment.merge(Env::prefixed(ENV_PREFIX)).extract().or_raise(|| ErrorKind::Load)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if !self.data_dir.is_absolute() {
            exn::bail!(ErrorKind::Invalid("data_dir must be an absolute path"));
        }
        if self.path.file_name().is_none() {
            exn::bail!(ErrorKind::Invalid("path must name a file"));
        }
        Ok(())
    }

    /// Absolute location of the store database.
    pub fn database_path(&self) -> PathBuf {
        // Joining an absolute path replaces the base, which is exactly what
        // we want for an absolute `path`.
        self.data_dir.join(&self.path)
    }

    /// Media directory for the configured store: `<data_dir>/<store file name>_media`.
    ///
    /// Pure function of the configuration; nothing is created on disk.
    pub fn media_dir(&self) -> Result<PathBuf> {
        let name = self.path.file_name().ok_or_raise(|| ErrorKind::Invalid("path must name a file"))?;
        let mut name = name.to_os_string();
        name.push(MEDIA_SUFFIX);
        Ok(self.data_dir.join(name))
    }
}
