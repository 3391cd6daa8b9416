use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to parse catalog: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to read catalog at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid catalog: {0}")]
    Invalid(String),
}

/// One presentable 3D asset. Identity is the position in the catalog; `id`
/// only has to be unique so caches and logs can refer to it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AssetDescriptor {
    pub id: String,
    pub label: String,
    pub url: String,
}

impl AssetDescriptor {
    pub fn new(id: impl Into<String>, label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            url: url.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityTier {
    Low,
    #[default]
    Balanced,
    High,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Catalog {
    pub version: u32,
    #[serde(default)]
    pub cycle: CycleConfig,
    #[serde(default)]
    pub preload: PreloadConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub assets: Vec<AssetDescriptor>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CycleConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(
        default = "default_interval",
        deserialize_with = "deserialize_duration"
    )]
    pub interval: Duration,
    #[serde(
        default = "default_transition",
        deserialize_with = "deserialize_duration"
    )]
    pub transition: Duration,
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval: default_interval(),
            transition: default_transition(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PreloadConfig {
    #[serde(
        default = "default_preload_delay",
        deserialize_with = "deserialize_duration"
    )]
    pub delay: Duration,
    #[serde(
        default = "default_preload_stagger",
        deserialize_with = "deserialize_duration"
    )]
    pub stagger: Duration,
}

impl Default for PreloadConfig {
    fn default() -> Self {
        Self {
            delay: default_preload_delay(),
            stagger: default_preload_stagger(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RenderConfig {
    #[serde(default)]
    pub preset: QualityTier,
    #[serde(default = "default_canonical_radius")]
    pub canonical_radius: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            preset: QualityTier::default(),
            canonical_radius: default_canonical_radius(),
        }
    }
}

pub const DEFAULT_CANONICAL_RADIUS: f32 = 2.25;

fn default_true() -> bool {
    true
}

fn default_interval() -> Duration {
    Duration::from_secs(3)
}

fn default_transition() -> Duration {
    Duration::from_millis(500)
}

fn default_preload_delay() -> Duration {
    Duration::from_millis(400)
}

fn default_preload_stagger() -> Duration {
    Duration::from_millis(200)
}

fn default_canonical_radius() -> f32 {
    DEFAULT_CANONICAL_RADIUS
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    deserialize_duration_opt(deserializer)?
        .ok_or_else(|| de::Error::custom("duration must not be empty"))
}

fn deserialize_duration_opt<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    struct Visitor;
    impl<'de> de::Visitor<'de> for Visitor {
        type Value = Option<Duration>;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a duration as number of seconds or human-readable string")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            humantime::parse_duration(v.trim())
                .map(Some)
                .map_err(|err| E::custom(format!("invalid duration '{v}': {err}")))
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(Duration::from_secs(v)))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v < 0 {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Some(Duration::from_secs(v as u64)))
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v.is_nan() || v.is_sign_negative() {
                return Err(E::custom("duration must be non-negative"));
            }
            Duration::try_from_secs_f64(v)
                .map(Some)
                .map_err(|err| E::custom(format!("invalid duration {v}: {err}")))
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }
    }

    deserializer.deserialize_any(Visitor)
}

impl Catalog {
    pub fn from_toml_str(input: &str) -> Result<Self, CatalogError> {
        let raw: Catalog = toml::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    /// Reads a catalog file. Asset urls that are plain relative paths are
    /// rebased onto the directory holding the catalog.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let contents = fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut catalog = Self::from_toml_str(&contents)?;
        if let Some(base) = path.parent() {
            catalog.rebase_relative_urls(base);
        }
        Ok(catalog)
    }

    /// The five shoes shipped with the landing page.
    pub fn builtin() -> Self {
        let assets = (1..=5)
            .map(|n| {
                AssetDescriptor::new(
                    format!("shoe{n}"),
                    format!("SHOE {n:02}"),
                    format!("assets/shoe{n}-compressed.glb"),
                )
            })
            .collect();
        Self {
            version: 1,
            cycle: CycleConfig::default(),
            preload: PreloadConfig::default(),
            render: RenderConfig::default(),
            assets,
        }
    }

    pub fn hero(&self) -> Option<&AssetDescriptor> {
        self.assets.first()
    }

    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.version != 1 {
            return Err(CatalogError::Invalid(format!(
                "unsupported catalog version {}; expected 1",
                self.version
            )));
        }

        if self.assets.is_empty() {
            return Err(CatalogError::Invalid(
                "catalog must define at least one asset".into(),
            ));
        }

        let mut seen = HashSet::new();
        for asset in &self.assets {
            if asset.id.trim().is_empty() {
                return Err(CatalogError::Invalid(
                    "catalog contains an asset with an empty id".into(),
                ));
            }
            if !seen.insert(asset.id.as_str()) {
                return Err(CatalogError::Invalid(format!(
                    "asset id '{}' is declared more than once",
                    asset.id
                )));
            }
            if asset.url.trim().is_empty() {
                return Err(CatalogError::Invalid(format!(
                    "asset '{}' has an empty url",
                    asset.id
                )));
            }
        }

        if self.cycle.interval.is_zero() {
            return Err(CatalogError::Invalid(
                "cycle.interval must be greater than zero".into(),
            ));
        }

        let radius = self.render.canonical_radius;
        if !radius.is_finite() || radius <= 0.0 {
            return Err(CatalogError::Invalid(format!(
                "render.canonical_radius must be a positive number, got {radius}"
            )));
        }

        Ok(())
    }

    fn rebase_relative_urls(&mut self, base: &Path) {
        for asset in &mut self.assets {
            if is_relative_path(&asset.url) {
                asset.url = base.join(&asset.url).to_string_lossy().into_owned();
            }
        }
    }
}

fn is_relative_path(url: &str) -> bool {
    if url.contains("://") {
        return false;
    }
    Path::new(url).is_relative()
}
