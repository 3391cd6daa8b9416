use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use renderer::Theme;
use serde::{Deserialize, Serialize};

/// Preferences that survive between sessions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppState {
    pub theme: StoredTheme,
}

/// On-disk spelling of [`Theme`]; kept separate so the renderer stays free of
/// serde.
///
/// With no saved preference the showcase opens dark. The desktop colour
/// scheme is not consulted; `--theme` or `zerogiven theme set` change it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoredTheme {
    #[default]
    Dark,
    Light,
}

impl From<StoredTheme> for Theme {
    fn from(value: StoredTheme) -> Self {
        match value {
            StoredTheme::Dark => Theme::Dark,
            StoredTheme::Light => Theme::Light,
        }
    }
}

impl From<Theme> for StoredTheme {
    fn from(value: Theme) -> Self {
        match value {
            Theme::Dark => StoredTheme::Dark,
            Theme::Light => StoredTheme::Light,
        }
    }
}

impl AppState {
    pub fn theme(&self) -> Theme {
        self.theme.into()
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme.into();
    }

    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("failed to read state file at {}", path.display()))?;
            let state: Self = toml::from_str(&contents)
                .with_context(|| format!("failed to parse state file at {}", path.display()))?;
            Ok(state)
        } else {
            Ok(Self::default())
        }
    }

    pub fn persist(&self, path: &Path) -> Result<()> {
        let dir = path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("state path has no parent: {}", path.display()))?;
        fs::create_dir_all(dir).with_context(|| {
            format!(
                "failed to prepare directory for state file at {}",
                dir.display()
            )
        })?;
        let serialized =
            toml::to_string_pretty(self).context("failed to serialize state file to TOML")?;
        fs::write(path, serialized)
            .with_context(|| format!("failed to write state file to {}", path.display()))?;
        Ok(())
    }
}
