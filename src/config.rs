//! Invocation settings.
//!
//! Resolution order, later wins:
//!
//! 1. Built-in defaults (`npx luapack --config luapack.config.json --output dist/gma2-workers-v<version>.lua`)
//! 2. `pack.toml` in the project directory, if present
//! 3. A named target from `pack.toml` (`--target` / `PACK_TARGET`)
//! 4. Explicit overrides (`--prefix` / `PACK_PREFIX`, `--tool` / `PACK_TOOL`)
//!
//! ```toml
//! [pack]
//! prefix = "gma2-workers-v"
//! out_dir = "dist"
//! config_file = "luapack.config.json"
//!
//! [targets.onpc]
//! prefix = "gma2-onpc-workers-v"
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// File name looked up in the project directory.
pub const CONFIG_FILE_NAME: &str = "pack.toml";

pub const DEFAULT_TOOL: &str = "npx";
pub const DEFAULT_TOOL_ARGS: &[&str] = &["luapack"];
pub const DEFAULT_CONFIG_FILE: &str = "luapack.config.json";
pub const DEFAULT_CONFIG_FLAG: &str = "--config";
pub const DEFAULT_OUTPUT_FLAG: &str = "--output";
pub const DEFAULT_OUT_DIR: &str = "dist";
pub const DEFAULT_PREFIX: &str = "gma2-workers-v";
pub const DEFAULT_EXTENSION: &str = "lua";
pub const DEFAULT_MANIFEST: &str = "package.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("unknown target `{name}` (known: {known})")]
    UnknownTarget { name: String, known: String },
}

/// Fully resolved settings for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackConfig {
    /// Program to launch.
    pub tool: String,
    /// Arguments placed before the config/output pairs (`luapack` for `npx luapack`).
    pub tool_args: Vec<String>,
    pub config_file: String,
    pub config_flag: String,
    pub output_flag: String,
    pub out_dir: PathBuf,
    pub prefix: String,
    pub extension: String,
    /// Manifest holding the version, relative to the project directory.
    pub manifest: PathBuf,
    /// Named prefix variants.
    pub targets: BTreeMap<String, String>,
}

impl Default for PackConfig {
    fn default() -> Self {
        Self {
            tool: DEFAULT_TOOL.to_string(),
            tool_args: DEFAULT_TOOL_ARGS.iter().map(|s| s.to_string()).collect(),
            config_file: DEFAULT_CONFIG_FILE.to_string(),
            config_flag: DEFAULT_CONFIG_FLAG.to_string(),
            output_flag: DEFAULT_OUTPUT_FLAG.to_string(),
            out_dir: PathBuf::from(DEFAULT_OUT_DIR),
            prefix: DEFAULT_PREFIX.to_string(),
            extension: DEFAULT_EXTENSION.to_string(),
            manifest: PathBuf::from(DEFAULT_MANIFEST),
            targets: BTreeMap::new(),
        }
    }
}

/// On-disk shape of `pack.toml`. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct PackFile {
    #[serde(default)]
    pack: PackSection,
    #[serde(default)]
    targets: BTreeMap<String, TargetSection>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct PackSection {
    tool: Option<String>,
    tool_args: Option<Vec<String>>,
    config_file: Option<String>,
    config_flag: Option<String>,
    output_flag: Option<String>,
    out_dir: Option<PathBuf>,
    prefix: Option<String>,
    extension: Option<String>,
    manifest: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TargetSection {
    prefix: String,
}

impl PackConfig {
    /// Defaults overlaid with `<project_dir>/pack.toml`. A missing file is fine.
    pub fn load(project_dir: &Path) -> Result<Self, ConfigError> {
        let path = project_dir.join(CONFIG_FILE_NAME);
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        let config = Self::from_toml_str(&raw).map_err(|message| ConfigError::Parse {
            path: path.clone(),
            message,
        })?;
        tracing::debug!(path = %path.display(), "loaded pack config");
        Ok(config)
    }

    fn from_toml_str(raw: &str) -> Result<Self, String> {
        let file: PackFile = toml::from_str(raw).map_err(|e| e.message().to_string())?;
        let mut config = Self::default();
        let section = file.pack;
        if let Some(v) = section.tool {
            config.tool = v;
        }
        if let Some(v) = section.tool_args {
            config.tool_args = v;
        }
        if let Some(v) = section.config_file {
            config.config_file = v;
        }
        if let Some(v) = section.config_flag {
            config.config_flag = v;
        }
        if let Some(v) = section.output_flag {
            config.output_flag = v;
        }
        if let Some(v) = section.out_dir {
            config.out_dir = v;
        }
        if let Some(v) = section.prefix {
            config.prefix = v;
        }
        if let Some(v) = section.extension {
            config.extension = v;
        }
        if let Some(v) = section.manifest {
            config.manifest = v;
        }
        config.targets = file
            .targets
            .into_iter()
            .map(|(name, t)| (name, t.prefix))
            .collect();
        Ok(config)
    }

    /// Switch to the prefix of a named target.
    pub fn select_target(&mut self, name: &str) -> Result<(), ConfigError> {
        match self.targets.get(name) {
            Some(prefix) => {
                self.prefix = prefix.clone();
                Ok(())
            }
            None => Err(ConfigError::UnknownTarget {
                name: name.to_string(),
                known: if self.targets.is_empty() {
                    "none".to_string()
                } else {
                    self.targets.keys().cloned().collect::<Vec<_>>().join(", ")
                },
            }),
        }
    }

    /// Apply command-line / environment overrides on top of the file.
    pub fn apply_overrides(&mut self, overrides: &Overrides) -> Result<(), ConfigError> {
        if let Some(target) = overrides.target.as_deref() {
            self.select_target(target)?;
        }
        if let Some(prefix) = &overrides.prefix {
            self.prefix = prefix.clone();
        }
        if let Some(tool) = &overrides.tool {
            self.tool = tool.clone();
        }
        Ok(())
    }
}

/// Values supplied outside `pack.toml`.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub target: Option<String>,
    pub prefix: Option<String>,
    pub tool: Option<String>,
}
