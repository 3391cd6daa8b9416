use std::env;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use directories_next::ProjectDirs;

pub const ENV_CONFIG_DIR: &str = "ZEROGIVEN_CONFIG_DIR";
pub const ENV_CACHE_DIR: &str = "ZEROGIVEN_CACHE_DIR";

const QUALIFIER: &str = "org";
const ORGANISATION: &str = "ZeroGiven";
const APPLICATION: &str = "zerogiven";

#[derive(Debug, Clone)]
pub struct AppPaths {
    config_dir: PathBuf,
    cache_dir: PathBuf,
}

impl AppPaths {
    pub fn discover() -> Result<Self> {
        let config_override = env_override(ENV_CONFIG_DIR);
        let cache_override = env_override(ENV_CACHE_DIR);

        // Both overrides set means the platform lookup is never needed, which
        // keeps tests working on machines without a home directory.
        if let (Some(config_dir), Some(cache_dir)) = (&config_override, &cache_override) {
            return Ok(Self::from_dirs(config_dir.clone(), cache_dir.clone()));
        }

        let project_dirs = ProjectDirs::from(QUALIFIER, ORGANISATION, APPLICATION)
            .ok_or_else(|| anyhow!("failed to determine user directories"))?;
        Ok(Self::from_dirs(
            config_override.unwrap_or_else(|| project_dirs.config_dir().to_path_buf()),
            cache_override.unwrap_or_else(|| project_dirs.cache_dir().to_path_buf()),
        ))
    }

    pub fn from_dirs(config_dir: PathBuf, cache_dir: PathBuf) -> Self {
        Self {
            config_dir,
            cache_dir,
        }
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn state_file(&self) -> PathBuf {
        self.config_dir.join("state.toml")
    }

    /// Catalog picked up when `--catalog` is not given.
    pub fn default_catalog(&self) -> PathBuf {
        self.config_dir.join("catalog.toml")
    }

    pub fn model_cache_dir(&self) -> PathBuf {
        self.cache_dir.join("models")
    }
}

fn env_override(name: &str) -> Option<PathBuf> {
    match env::var_os(name) {
        Some(value) if !value.is_empty() => Some(PathBuf::from(value)),
        _ => None,
    }
}
