//! Reading run configurations.
//!
//! A configuration read from a file has its relative paths resolved against
//! the directory holding that file, so a run behaves the same whatever the
//! working directory is. Configurations parsed from a string keep their paths
//! as written.

use crate::config::schema::{RunConfig, ValidationError};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read run config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}malformed run config: {source}", origin(.path))]
    Toml {
        path: Option<PathBuf>,
        #[source]
        source: toml_edit::de::Error,
    },

    #[error("{}invalid run config:\n{source}", origin(.path))]
    Validation {
        path: Option<PathBuf>,
        #[source]
        source: ValidationError,
    },
}

impl ConfigError {
    /// The config file the error came from, if it was read from one.
    pub fn path(&self) -> Option<&Path> {
        match self {
            ConfigError::Io { path, .. } => Some(path),
            ConfigError::Toml { path, .. } | ConfigError::Validation { path, .. } => {
                path.as_deref()
            }
        }
    }

    fn in_file(self, file: &Path) -> Self {
        match self {
            ConfigError::Toml { path: None, source } => ConfigError::Toml {
                path: Some(file.to_path_buf()),
                source,
            },
            ConfigError::Validation { path: None, source } => ConfigError::Validation {
                path: Some(file.to_path_buf()),
                source,
            },
            other => other,
        }
    }
}

fn origin(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|p| format!("{}: ", p.display()))
        .unwrap_or_default()
}

/// Parse and validate a run config. Paths are kept as written.
pub fn load_from_str(input: &str) -> Result<RunConfig, ConfigError> {
    let config = parse(input)?;
    validated(config)
}

/// Read, parse and validate the run config at `path`. A relative
/// `[reports].dir` is taken relative to the directory holding `path`.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RunConfig, ConfigError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut config = parse(&contents).map_err(|e| e.in_file(path))?;
    if let Some(base) = path.parent() {
        resolve_paths(&mut config, base);
    }
    log::debug!("loaded run config from {}", path.display());
    validated(config).map_err(|e| e.in_file(path))
}

fn parse(input: &str) -> Result<RunConfig, ConfigError> {
    toml_edit::de::from_str(input).map_err(|source| ConfigError::Toml { path: None, source })
}

fn validated(config: RunConfig) -> Result<RunConfig, ConfigError> {
    config
        .validate()
        .map_err(|source| ConfigError::Validation { path: None, source })?;
    Ok(config)
}

fn resolve_paths(config: &mut RunConfig, base: &Path) {
    if let Some(dir) = config.reports.dir.take() {
        config.reports.dir = Some(if dir.is_relative() {
            base.join(dir)
        } else {
            dir
        });
    }
}
