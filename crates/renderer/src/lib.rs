//! Renderer crate for the Zero Given showcase.
//!
//! Presents a rotating, floating product model over a themed background and
//! cycles through a catalog of models. The overall flow is:
//!
//! ```text
//!   CLI / zerogiven
//!          │ RendererConfig
//!          ▼
//!   Renderer::run ──▶ winit event loop ──▶ Showcase::update() ──▶ Frame
//!                          ▲                                        │
//!                          │ keys                                   ▼
//!                     ShowcaseCommand                   GpuState::render()
//!                                                   scene ─▶ blur ─▶ composite
//! ```
//!
//! `Showcase` owns every piece of session state (cycle timer, preload plan,
//! model cache, preset, theme, motion) and never touches the GPU, so its
//! behaviour is testable without a window. `GpuState` owns all wgpu resources.
//! Models are fetched and decoded on a background thread by [`cache::AssetCache`].

pub mod cache;
mod gpu;
pub mod model;
pub mod motion;
pub mod preset;
pub mod runtime;
pub mod showcase;
mod timeline;
mod types;
mod window;

use anyhow::{bail, Result};

pub use preset::{RenderPreset, RenderPresetId};
pub use types::{Antialiasing, CrossfadeCurve, RendererConfig, RunOutcome, ShowcaseAsset, Theme};

/// High-level entry point that owns the chosen configuration.
pub struct Renderer {
    config: RendererConfig,
}

impl Renderer {
    pub fn new(config: RendererConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Opens the showcase window and blocks until it closes.
    pub fn run(&mut self) -> Result<RunOutcome> {
        if self.config.assets.is_empty() {
            bail!("showcase needs at least one asset");
        }
        tracing::info!(
            assets = self.config.assets.len(),
            preset = %self.config.preset,
            theme = %self.config.theme,
            auto_cycle = self.config.cycle.auto_cycle,
            "starting showcase"
        );
        window::run_window(&self.config)
    }
}
