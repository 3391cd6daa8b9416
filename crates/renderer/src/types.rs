use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use assets::FetchOptions;
use scheduler::{CycleSettings, PreloadSettings};

use crate::preset::RenderPresetId;

/// Multi-sample anti-aliasing policy for the scene pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Antialiasing {
    /// Use the highest sample count the offscreen format supports.
    #[default]
    Auto,
    Off,
    Samples(u32),
}

/// Easing applied to the opacity of models while the showcase switches between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CrossfadeCurve {
    Linear,
    #[default]
    Smoothstep,
    EaseInOut,
}

/// Page theme. Drives the background colour behind the model and the canvas
/// opacity it is composited with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }

    /// Background behind the canvas, RGB in display space.
    pub fn background(self) -> [f32; 3] {
        match self {
            Theme::Dark => [0.035, 0.035, 0.043],
            Theme::Light => [0.98, 0.98, 0.98],
        }
    }

    pub fn canvas_opacity(self) -> f32 {
        match self {
            Theme::Dark => 0.6,
            Theme::Light => 0.4,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "dark" => Ok(Theme::Dark),
            "light" => Ok(Theme::Light),
            other => Err(format!("unknown theme '{other}' (expected dark or light)")),
        }
    }
}

/// A model the showcase can present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShowcaseAsset {
    pub id: String,
    pub label: String,
    pub url: String,
}

/// Everything the window needs to run a showcase session.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    pub surface_size: (u32, u32),
    pub title: String,
    pub assets: Vec<ShowcaseAsset>,
    pub cycle: CycleSettings,
    pub preload: PreloadSettings,
    pub preset: RenderPresetId,
    pub theme: Theme,
    pub canonical_radius: f32,
    pub antialiasing: Antialiasing,
    pub crossfade_curve: CrossfadeCurve,
    pub target_fps: Option<f32>,
    pub cache_dir: PathBuf,
    pub fetch: FetchOptions,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            surface_size: (1280, 800),
            title: "ZERO GIVEN".to_string(),
            assets: Vec::new(),
            cycle: CycleSettings::default(),
            preload: PreloadSettings::default(),
            preset: RenderPresetId::default(),
            theme: Theme::default(),
            canonical_radius: 2.25,
            antialiasing: Antialiasing::default(),
            crossfade_curve: CrossfadeCurve::default(),
            target_fps: None,
            cache_dir: PathBuf::from("cache"),
            fetch: FetchOptions::default(),
        }
    }
}

/// Session state worth keeping once the window closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOutcome {
    pub theme: Theme,
    pub preset: RenderPresetId,
}
