//! Session state of the showcase, independent of the GPU.
//!
//! The window feeds it clock readings and commands; it answers with a
//! [`Frame`] describing which models to draw, where, and how opaque.
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use glam::Mat4;
use scheduler::{CycleController, CycleSettings, PreloadScheduler, PreloadSettings};
use tracing::{debug, info};

use crate::cache::{AssetCache, LoadProgress, LoadState};
use crate::model::NormalizedModel;
use crate::motion::{blur_for_angle, model_matrix, BlurRadius, FloatMotion, Spin};
use crate::preset::{RenderPreset, RenderPresetId};
use crate::timeline::FadeEnvelope;
use crate::types::{CrossfadeCurve, ShowcaseAsset, Theme};

pub const INTERVAL_STEP: Duration = Duration::from_millis(500);
pub const TRANSITION_STEP: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShowcaseCommand {
    Next,
    Previous,
    ToggleAutoCycle,
    SelectPreset(RenderPresetId),
    LongerInterval,
    ShorterInterval,
    LongerTransition,
    ShorterTransition,
    ToggleTheme,
}

#[derive(Debug, Clone)]
pub struct ShowcaseOptions {
    pub title: String,
    pub cycle: CycleSettings,
    pub preload: PreloadSettings,
    pub preset: RenderPresetId,
    pub theme: Theme,
    pub curve: CrossfadeCurve,
}

/// One model to draw this frame.
#[derive(Debug, Clone)]
pub struct ModelLayer {
    pub asset_id: String,
    pub model: Arc<NormalizedModel>,
    pub transform: Mat4,
    pub opacity: f32,
}

#[derive(Debug, Clone)]
pub struct Frame {
    /// Back to front: an outgoing model, if any, comes first.
    pub layers: Vec<ModelLayer>,
    pub blur: BlurRadius,
    pub preset: &'static RenderPreset,
    pub theme: Theme,
}

#[derive(Debug)]
struct Outgoing {
    index: usize,
    model: Arc<NormalizedModel>,
    spin: Spin,
}

pub struct Showcase {
    title: String,
    assets: Vec<ShowcaseAsset>,
    cycle: CycleController,
    preload: PreloadScheduler,
    cache: AssetCache,
    preset: RenderPresetId,
    theme: Theme,
    curve: CrossfadeCurve,
    float: FloatMotion,
    spin: Spin,
    displayed: Option<usize>,
    outgoing: Option<Outgoing>,
    fade: Option<FadeEnvelope>,
    started: Instant,
    last_frame: Option<Instant>,
}

impl Showcase {
    pub fn new(
        assets: Vec<ShowcaseAsset>,
        options: ShowcaseOptions,
        cache: AssetCache,
        now: Instant,
    ) -> Result<Self> {
        let cycle = CycleController::new(assets.len(), options.cycle, now)?;
        let urls = assets.iter().map(|asset| asset.url.clone()).collect();
        Ok(Self {
            title: options.title,
            assets,
            cycle,
            preload: PreloadScheduler::new(urls, options.preload),
            cache,
            preset: options.preset,
            theme: options.theme,
            curve: options.curve,
            float: FloatMotion::random(&mut rand::thread_rng()),
            spin: Spin::default(),
            displayed: None,
            outgoing: None,
            fade: None,
            started: now,
            last_frame: None,
        })
    }

    /// Loads the hero model before the first frame, then arms the timers from
    /// the moment it settled so a slow hero keeps its full first interval and
    /// the preload delay.
    pub fn start(&mut self) -> LoadState {
        let state = self.load_hero();
        self.begin(Instant::now());
        state
    }

    /// Blocks until the hero model has settled.
    pub fn load_hero(&mut self) -> LoadState {
        let hero = self
            .preload
            .hero()
            .map(str::to_string)
            .unwrap_or_default();
        let state = self.cache.warm_blocking(&hero);
        if matches!(state, LoadState::Ready(_)) {
            self.displayed = Some(0);
        }
        state
    }

    /// Arms the cycle timer and queues the remaining assets relative to `now`.
    pub fn begin(&mut self, now: Instant) {
        self.cycle.restart(now);
        self.preload.start(now);
        self.started = now;
        self.last_frame = None;
    }

    pub fn apply(&mut self, command: ShowcaseCommand, now: Instant) {
        match command {
            ShowcaseCommand::Next => {
                let index = self.cycle.next(now);
                self.warm_index(index);
                debug!(index, "next model");
            }
            ShowcaseCommand::Previous => {
                let index = self.cycle.previous(now);
                self.warm_index(index);
                debug!(index, "previous model");
            }
            ShowcaseCommand::ToggleAutoCycle => {
                let enabled = self.cycle.toggle_auto_cycle(now);
                info!(enabled, "auto-cycle toggled");
            }
            ShowcaseCommand::SelectPreset(preset) => {
                self.preset = preset;
                info!(preset = %preset, "render preset selected");
            }
            ShowcaseCommand::LongerInterval | ShowcaseCommand::ShorterInterval => {
                let current = self.cycle.interval();
                let requested = if command == ShowcaseCommand::LongerInterval {
                    current + INTERVAL_STEP
                } else {
                    current.saturating_sub(INTERVAL_STEP)
                };
                let interval = self.cycle.set_interval(requested, now);
                info!(interval_ms = interval.as_millis() as u64, "cycle interval changed");
            }
            ShowcaseCommand::LongerTransition | ShowcaseCommand::ShorterTransition => {
                let current = self.cycle.transition();
                let requested = if command == ShowcaseCommand::LongerTransition {
                    current + TRANSITION_STEP
                } else {
                    current.saturating_sub(TRANSITION_STEP)
                };
                let transition = self.cycle.set_transition(requested);
                info!(
                    transition_ms = transition.as_millis() as u64,
                    "transition duration changed"
                );
            }
            ShowcaseCommand::ToggleTheme => {
                self.theme = self.theme.toggled();
                info!(theme = %self.theme, "theme toggled");
            }
        }
    }

    /// Advances timers, loads and motion to `now` and describes the frame.
    pub fn update(&mut self, now: Instant) -> Frame {
        if let Some(index) = self.cycle.tick(now) {
            debug!(index, "auto-cycle advanced");
            self.warm_index(index);
        }
        for task in self.preload.due(now) {
            self.cache.warm(&task.url);
        }
        self.cache.drain();

        let delta = self
            .last_frame
            .map(|last| now.saturating_duration_since(last).as_secs_f32())
            .unwrap_or(0.0);
        self.last_frame = Some(now);
        let preset = self.preset.preset();
        self.spin.advance(delta, preset);
        self.spin = self.spin.wrapped();
        if let Some(outgoing) = self.outgoing.as_mut() {
            outgoing.spin.advance(delta, preset);
        }

        self.sync_displayed(now);
        self.frame(now)
    }

    fn sync_displayed(&mut self, now: Instant) {
        let target = self.cycle.index();
        if self.displayed == Some(target) {
            return;
        }
        let Some(model) = self.model_at(target) else {
            // Keep showing whatever is up until the target is ready.
            self.warm_index(target);
            return;
        };

        self.outgoing = self.displayed.and_then(|index| {
            self.model_at(index).map(|model| Outgoing {
                index,
                model,
                spin: self.spin,
            })
        });
        self.fade = FadeEnvelope::new(self.cycle.transition(), self.curve, now);
        self.displayed = Some(target);
        self.spin = Spin::default();
        debug!(
            from = ?self.outgoing.as_ref().map(|outgoing| outgoing.index),
            to = target,
            radius = model.radius,
            "switching model"
        );
    }

    fn frame(&mut self, now: Instant) -> Frame {
        let preset = self.preset.preset();
        let elapsed = now.saturating_duration_since(self.started).as_secs_f32();
        let pose = self.float.sample(elapsed, preset);

        let (outgoing_opacity, incoming_opacity) = match self.fade {
            Some(envelope) => {
                let mix = envelope.mix(now);
                if mix.finished {
                    self.fade = None;
                    self.outgoing = None;
                    (0.0, 1.0)
                } else {
                    (mix.outgoing, mix.incoming)
                }
            }
            None => (0.0, 1.0),
        };

        let mut layers = Vec::with_capacity(2);
        if let Some(outgoing) = self.outgoing.as_ref() {
            layers.push(ModelLayer {
                asset_id: self.assets[outgoing.index].id.clone(),
                model: Arc::clone(&outgoing.model),
                transform: model_matrix(&pose, &outgoing.spin, outgoing.model.scale),
                opacity: outgoing_opacity,
            });
        }
        if let Some(index) = self.displayed {
            if let Some(model) = self.model_at(index) {
                layers.push(ModelLayer {
                    asset_id: self.assets[index].id.clone(),
                    transform: model_matrix(&pose, &self.spin, model.scale),
                    model,
                    opacity: incoming_opacity,
                });
            }
        }

        Frame {
            layers,
            blur: blur_for_angle(self.spin.y, preset),
            preset,
            theme: self.theme,
        }
    }

    /// Earliest instant a timer needs the event loop awake.
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.cycle.next_deadline(), self.preload.next_deadline()) {
            (Some(cycle), Some(preload)) => Some(cycle.min(preload)),
            (cycle, preload) => cycle.or(preload),
        }
    }

    /// Drops pending preloads. Loads already handed to the worker finish or
    /// are abandoned when the cache is dropped.
    pub fn shutdown(&mut self) -> usize {
        self.preload.cancel()
    }

    pub fn title(&self) -> String {
        let asset = &self.assets[self.cycle.index()];
        let mode = if self.cycle.auto_cycle() {
            format!("AUTO {:.1}s", self.cycle.interval().as_secs_f32())
        } else {
            "MANUAL".to_string()
        };
        let mut title = format!(
            "{} | {} | {} | {}",
            self.title,
            asset.label,
            self.preset.short_label(),
            mode
        );
        let progress = self.cache.progress();
        if progress.active || progress.percent() < 100 {
            title.push_str(&format!(" | loading {}%", progress.percent()));
        }
        if matches!(self.cache.get(&asset.url), Some(LoadState::Failed(_))) {
            title.push_str(" | unavailable");
        }
        title
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn preset(&self) -> RenderPresetId {
        self.preset
    }

    pub fn cycle(&self) -> &CycleController {
        &self.cycle
    }

    pub fn progress(&self) -> LoadProgress {
        self.cache.progress()
    }

    pub fn displayed(&self) -> Option<&ShowcaseAsset> {
        self.displayed.map(|index| &self.assets[index])
    }

    fn model_at(&self, index: usize) -> Option<Arc<NormalizedModel>> {
        self.assets
            .get(index)
            .and_then(|asset| self.cache.model(&asset.url))
    }

    fn warm_index(&mut self, index: usize) {
        if let Some(asset) = self.assets.get(index) {
            self.cache.warm(&asset.url);
        }
    }
}
