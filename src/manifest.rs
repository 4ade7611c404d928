//! Project metadata lookup.
//!
//! The version is read once from the project manifest. `package.json` is the
//! usual source; a TOML manifest (`Cargo.toml`, `pyproject.toml`-style
//! `[package]` table) is accepted as well. The string is returned exactly as
//! written: no semver validation, no trimming.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors that can occur while reading the project version.
#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("failed to read manifest {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse manifest {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("manifest {0} has no string `version` field")]
    MissingVersion(PathBuf),
}

/// Manifest flavours we know how to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestFormat {
    Json,
    Toml,
}

impl ManifestFormat {
    /// Anything not ending in `.toml` is treated as JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Self::Toml,
            _ => Self::Json,
        }
    }
}

/// Read the version string from the manifest at `path`.
pub fn read_version(path: &Path) -> Result<String, ManifestError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ManifestError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let version = match ManifestFormat::from_path(path) {
        ManifestFormat::Json => version_from_json(path, &raw)?,
        ManifestFormat::Toml => version_from_toml(path, &raw)?,
    };
    tracing::debug!(manifest = %path.display(), %version, "read project version");
    Ok(version)
}

fn version_from_json(path: &Path, raw: &str) -> Result<String, ManifestError> {
    let value: serde_json::Value =
        serde_json::from_str(raw).map_err(|e| ManifestError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
    value
        .get("version")
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| ManifestError::MissingVersion(path.to_path_buf()))
}

fn version_from_toml(path: &Path, raw: &str) -> Result<String, ManifestError> {
    let value: toml::Table = toml::from_str(raw).map_err(|e| ManifestError::Parse {
        path: path.to_path_buf(),
        message: e.message().to_string(),
    })?;
    value
        .get("package")
        .and_then(|p| p.get("version"))
        .or_else(|| value.get("version"))
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| ManifestError::MissingVersion(path.to_path_buf()))
}
