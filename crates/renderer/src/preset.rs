//! Quality presets.
//!
//! A preset bundles every knob that trades visual fidelity for cost: the
//! render target density, how fast the model moves, whether the rotation blur
//! runs, and how the scene is lit. Presets are static tables; selecting one is
//! a pure lookup.
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RenderPresetId {
    Low,
    #[default]
    Balanced,
    High,
}

/// Allowed device-pixel-ratio window for the offscreen target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DensityRange {
    pub min: f32,
    pub max: f32,
}

impl DensityRange {
    pub fn clamp(&self, scale_factor: f64) -> f32 {
        (scale_factor as f32).clamp(self.min, self.max)
    }
}

/// Image-based lighting approximation. Only the city look is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvironmentPreset {
    City,
}

impl EnvironmentPreset {
    pub fn sky(self) -> [f32; 3] {
        match self {
            EnvironmentPreset::City => [0.62, 0.66, 0.74],
        }
    }

    pub fn ground(self) -> [f32; 3] {
        match self {
            EnvironmentPreset::City => [0.26, 0.23, 0.21],
        }
    }

    pub fn intensity(self) -> f32 {
        match self {
            EnvironmentPreset::City => 0.6,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderPreset {
    pub id: RenderPresetId,
    pub density: DensityRange,
    /// Radians per second around Y.
    pub rotation_speed: f32,
    /// Radians per second around X.
    pub tilt_speed: f32,
    pub float_speed: f32,
    pub float_intensity: f32,
    pub rotation_intensity: f32,
    pub blur_enabled: bool,
    /// Blur radius in logical pixels, `[at sin = 1, at sin = -1]`.
    pub blur_range: [f32; 2],
    pub directional_light: f32,
    pub ambient_light: f32,
    pub environment: Option<EnvironmentPreset>,
}

static LOW: RenderPreset = RenderPreset {
    id: RenderPresetId::Low,
    density: DensityRange { min: 0.75, max: 1.0 },
    rotation_speed: 0.2,
    tilt_speed: 0.05,
    float_speed: 1.2,
    float_intensity: 0.3,
    rotation_intensity: 0.3,
    blur_enabled: false,
    blur_range: [0.0, 0.0],
    directional_light: 0.8,
    ambient_light: 0.6,
    environment: None,
};

static BALANCED: RenderPreset = RenderPreset {
    id: RenderPresetId::Balanced,
    density: DensityRange { min: 1.0, max: 1.5 },
    rotation_speed: 0.3,
    tilt_speed: 0.1,
    float_speed: 2.0,
    float_intensity: 0.5,
    rotation_intensity: 0.5,
    blur_enabled: true,
    blur_range: [1.0, 8.0],
    directional_light: 1.0,
    ambient_light: 0.5,
    environment: Some(EnvironmentPreset::City),
};

static HIGH: RenderPreset = RenderPreset {
    id: RenderPresetId::High,
    density: DensityRange { min: 1.0, max: 2.0 },
    rotation_speed: 0.35,
    tilt_speed: 0.12,
    float_speed: 2.4,
    float_intensity: 0.6,
    rotation_intensity: 0.6,
    blur_enabled: true,
    blur_range: [1.0, 11.0],
    directional_light: 1.2,
    ambient_light: 0.4,
    environment: Some(EnvironmentPreset::City),
};

impl RenderPresetId {
    pub const ORDER: [RenderPresetId; 3] = [
        RenderPresetId::Low,
        RenderPresetId::Balanced,
        RenderPresetId::High,
    ];

    pub fn preset(self) -> &'static RenderPreset {
        match self {
            RenderPresetId::Low => &LOW,
            RenderPresetId::Balanced => &BALANCED,
            RenderPresetId::High => &HIGH,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RenderPresetId::Low => "low",
            RenderPresetId::Balanced => "balanced",
            RenderPresetId::High => "high",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RenderPresetId::Low => "Low",
            RenderPresetId::Balanced => "Balanced",
            RenderPresetId::High => "High",
        }
    }

    /// Three-letter tag used in the window title.
    pub fn short_label(self) -> &'static str {
        match self {
            RenderPresetId::Low => "LOW",
            RenderPresetId::Balanced => "BAL",
            RenderPresetId::High => "HIGH",
        }
    }
}

impl fmt::Display for RenderPresetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RenderPresetId {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        RenderPresetId::ORDER
            .into_iter()
            .find(|id| id.as_str() == normalized)
            .ok_or_else(|| format!("unknown preset '{value}' (expected low, balanced or high)"))
    }
}
