//! Layered configuration
//!
//! Sources, lowest priority first: built-in defaults, the user file at
//! `<config dir>/git-stack/config.toml`, the repository file
//! `<repo>/.git-stack.toml`, then command-line flags.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Directory name under the user config dir
const CONFIG_DIR: &str = "git-stack";

/// User config filename
const USER_CONFIG_FILE: &str = "config.toml";

/// Repository config filename, at the repository root
pub const REPO_CONFIG_FILE: &str = ".git-stack.toml";

/// Resolved settings for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Remote to push group branches to; detected when unset
    pub remote: Option<String>,
    /// Trunk branch; detected from the remote when unset
    pub trunk: Option<String>,
    /// Run git hooks on cherry-pick and push
    pub verify: bool,
    /// Publish after replaying
    pub sync: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            remote: None,
            trunk: None,
            verify: true,
            sync: true,
        }
    }
}

/// One config file; every key is optional so files can be layered
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigLayer {
    /// Remote to push to
    pub remote: Option<String>,
    /// Trunk branch
    pub trunk: Option<String>,
    /// Run git hooks
    pub verify: Option<bool>,
    /// Publish after replaying
    pub sync: Option<bool>,
}

impl ConfigLayer {
    /// Read a layer from `path`, returning an empty layer if it does not exist
    pub fn read(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read {}: {e}", path.display())))?;

        let layer = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse {}: {e}", path.display())))?;

        debug!(path = %path.display(), "loaded config layer");
        Ok(layer)
    }
}

impl Config {
    /// Load defaults, the user file and the repository file
    pub fn load(repo_root: &Path) -> Result<Self> {
        Self::load_from(user_config_path().as_deref(), repo_root)
    }

    /// Load with an explicit user config path (`None` skips the user layer)
    pub fn load_from(user_config: Option<&Path>, repo_root: &Path) -> Result<Self> {
        let mut config = Self::default();
        if let Some(path) = user_config {
            config.apply(ConfigLayer::read(path)?);
        }
        config.apply(ConfigLayer::read(&repo_root.join(REPO_CONFIG_FILE))?);
        Ok(config)
    }

    /// Overlay every key the layer sets
    pub fn apply(&mut self, layer: ConfigLayer) {
        if layer.remote.is_some() {
            self.remote = layer.remote;
        }
        if layer.trunk.is_some() {
            self.trunk = layer.trunk;
        }
        if let Some(verify) = layer.verify {
            self.verify = verify;
        }
        if let Some(sync) = layer.sync {
            self.sync = sync;
        }
    }
}

/// Path of the user config file, if the platform has a config dir
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(CONFIG_DIR).join(USER_CONFIG_FILE))
}
