use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Result};
use assets::AssetFetcher;
use tracing::{error, info, warn};
use winit::dpi::LogicalSize;
use winit::event::{ElementState, Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoopBuilder};
use winit::keyboard::{Key, NamedKey};
use winit::window::WindowBuilder;

use crate::cache::{AssetCache, FetchingLoader, LoadState};
use crate::gpu::GpuState;
use crate::preset::RenderPresetId;
use crate::runtime::FrameScheduler;
use crate::showcase::{Showcase, ShowcaseCommand, ShowcaseOptions};
use crate::types::{RendererConfig, RunOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum KeyAction {
    Command(ShowcaseCommand),
    Quit,
}

/// Keyboard stand-in for the control panel.
pub(crate) fn action_for_key(key: &Key) -> Option<KeyAction> {
    let command = match key {
        Key::Named(NamedKey::Escape) => return Some(KeyAction::Quit),
        Key::Named(NamedKey::ArrowLeft) => ShowcaseCommand::Previous,
        Key::Named(NamedKey::ArrowRight) => ShowcaseCommand::Next,
        Key::Named(NamedKey::Space) => ShowcaseCommand::ToggleAutoCycle,
        Key::Character(value) => match value.as_str() {
            " " => ShowcaseCommand::ToggleAutoCycle,
            "1" => ShowcaseCommand::SelectPreset(RenderPresetId::Low),
            "2" => ShowcaseCommand::SelectPreset(RenderPresetId::Balanced),
            "3" => ShowcaseCommand::SelectPreset(RenderPresetId::High),
            "+" | "=" => ShowcaseCommand::LongerInterval,
            "-" | "_" => ShowcaseCommand::ShorterInterval,
            "]" => ShowcaseCommand::LongerTransition,
            "[" => ShowcaseCommand::ShorterTransition,
            "t" | "T" => ShowcaseCommand::ToggleTheme,
            _ => return None,
        },
        _ => return None,
    };
    Some(KeyAction::Command(command))
}

pub(crate) fn run_window(config: &RendererConfig) -> Result<RunOutcome> {
    let event_loop = EventLoopBuilder::new()
        .build()
        .map_err(|err| anyhow!("failed to create event loop: {err}"))?;
    let window = WindowBuilder::new()
        .with_title(&config.title)
        .with_inner_size(LogicalSize::new(config.surface_size.0, config.surface_size.1))
        .build(&event_loop)
        .map_err(|err| anyhow!("failed to create showcase window: {err}"))?;
    let window = Arc::new(window);
    let mut gpu = GpuState::new(Arc::clone(&window), config.antialiasing)?;

    let fetcher = AssetFetcher::new(config.cache_dir.clone(), config.fetch.clone())?;
    let loader = Arc::new(FetchingLoader::new(fetcher, config.canonical_radius));
    let cache = AssetCache::spawn(loader, config.assets.len())?;

    let mut showcase = Showcase::new(
        config.assets.clone(),
        ShowcaseOptions {
            title: config.title.clone(),
            cycle: config.cycle,
            preload: config.preload,
            preset: config.preset,
            theme: config.theme,
            curve: config.crossfade_curve,
        },
        cache,
        Instant::now(),
    )?;
    match showcase.start() {
        LoadState::Ready(model) => info!(
            vertices = model.mesh.vertices.len(),
            scale = model.scale,
            "hero model ready"
        ),
        LoadState::Failed(reason) => warn!(%reason, "hero model failed to load"),
        LoadState::Loading => {}
    }

    let mut frames = FrameScheduler::new(config.target_fps);
    let mut title = String::new();
    window.request_redraw();

    let run_result = event_loop.run(|event, elwt| match event {
        Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
            WindowEvent::CloseRequested | WindowEvent::Destroyed => elwt.exit(),
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state != ElementState::Pressed || event.repeat {
                    return;
                }
                match action_for_key(&event.logical_key) {
                    Some(KeyAction::Quit) => elwt.exit(),
                    Some(KeyAction::Command(command)) => {
                        showcase.apply(command, Instant::now());
                        window.request_redraw();
                    }
                    None => {}
                }
            }
            WindowEvent::Resized(new_size) => gpu.resize(new_size),
            WindowEvent::RedrawRequested => {
                let now = Instant::now();
                let frame = showcase.update(now);
                match gpu.render(&frame, window.scale_factor()) {
                    Ok(()) => frames.mark_rendered(now),
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        gpu.resize(gpu.size());
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        error!("surface out of memory; closing showcase");
                        elwt.exit();
                    }
                    Err(other) => warn!(error = ?other, "surface error; retrying next frame"),
                }

                let next_title = showcase.title();
                if next_title != title {
                    window.set_title(&next_title);
                    title = next_title;
                }
            }
            _ => {}
        },
        Event::AboutToWait => {
            let now = Instant::now();
            if frames.ready_for_frame(now) {
                window.request_redraw();
                elwt.set_control_flow(ControlFlow::Wait);
            } else {
                let deadline = [frames.next_deadline(), showcase.next_deadline()]
                    .into_iter()
                    .flatten()
                    .min();
                match deadline {
                    Some(deadline) => elwt.set_control_flow(ControlFlow::WaitUntil(deadline)),
                    None => elwt.set_control_flow(ControlFlow::Wait),
                }
            }
        }
        Event::LoopExiting => {
            let cancelled = showcase.shutdown();
            info!(cancelled, "showcase closing");
        }
        _ => {}
    });
    run_result.map_err(|err| anyhow!("window event loop error: {err}"))?;

    Ok(RunOutcome {
        theme: showcase.theme(),
        preset: showcase.preset(),
    })
}
