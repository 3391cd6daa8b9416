use anyhow::{Context, Result};
use assets::FetchOptions;
use catalog::Catalog;
use renderer::{Renderer, RendererConfig};
use tracing_subscriber::EnvFilter;

use crate::bindings::{cycle_settings, preload_settings, preset_for_tier, showcase_assets};
use crate::cli::RunArgs;
use crate::paths::AppPaths;
use crate::state::AppState;

pub fn run(args: RunArgs) -> Result<()> {
    let paths = AppPaths::discover()?;
    let state_file = paths.state_file();
    let mut state = AppState::load_or_default(&state_file)?;
    tracing::debug!(
        config = %paths.config_dir().display(),
        cache = %paths.cache_dir().display(),
        theme = %state.theme(),
        "resolved zerogiven paths"
    );

    let catalog = load_catalog(&args, &paths)?;
    let config = build_config(&args, &catalog, &state, &paths);
    let starting_theme = config.theme;
    tracing::info!(
        assets = config.assets.len(),
        hero = %catalog.hero().map(|asset| asset.label.as_str()).unwrap_or("-"),
        "bootstrapping zerogiven showcase"
    );

    let mut renderer = Renderer::new(config);
    let outcome = renderer.run()?;

    if outcome.theme != starting_theme {
        state.set_theme(outcome.theme);
        state.persist(&state_file)?;
        tracing::info!(theme = %outcome.theme, "saved theme preference");
    }
    Ok(())
}

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Picks the catalog in priority order: `--catalog`, the user's
/// `catalog.toml`, then the built-in shoes.
pub fn load_catalog(args: &RunArgs, paths: &AppPaths) -> Result<Catalog> {
    if let Some(path) = args.catalog.as_ref() {
        return Catalog::load(path)
            .with_context(|| format!("failed to load catalog {}", path.display()));
    }

    let user_catalog = paths.default_catalog();
    if user_catalog.exists() {
        tracing::debug!(path = %user_catalog.display(), "using user catalog");
        return Catalog::load(&user_catalog)
            .with_context(|| format!("failed to load catalog {}", user_catalog.display()));
    }

    tracing::debug!("no catalog configured; using built-in catalog");
    Ok(Catalog::builtin())
}

/// Merges catalog values, the saved state, and CLI overrides. CLI wins.
pub fn build_config(
    args: &RunArgs,
    catalog: &Catalog,
    state: &AppState,
    paths: &AppPaths,
) -> RendererConfig {
    let defaults = RendererConfig::default();

    let mut cycle = cycle_settings(catalog);
    if args.no_auto_cycle {
        cycle.auto_cycle = false;
    }
    if let Some(interval) = args.interval {
        cycle.interval = interval;
    }
    if let Some(transition) = args.transition {
        cycle.transition = transition;
    }

    let target_fps = args.fps.filter(|fps| fps.is_finite() && *fps > 0.0);

    RendererConfig {
        surface_size: args.size.unwrap_or(defaults.surface_size),
        assets: showcase_assets(catalog),
        cycle,
        preload: preload_settings(catalog),
        preset: args
            .preset
            .unwrap_or_else(|| preset_for_tier(catalog.render.preset)),
        theme: args.theme.unwrap_or_else(|| state.theme()),
        canonical_radius: catalog.render.canonical_radius,
        antialiasing: args.antialias,
        crossfade_curve: args.transition_curve.unwrap_or(defaults.crossfade_curve),
        target_fps,
        cache_dir: paths.model_cache_dir(),
        fetch: FetchOptions {
            cache_only: args.cache_only,
            refresh: args.refresh,
        },
        ..defaults
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::Duration;

    use renderer::{CrossfadeCurve, RenderPresetId, Theme};
    use tempfile::TempDir;

    fn temp_paths(root: &TempDir) -> AppPaths {
        AppPaths::from_dirs(root.path().join("config"), root.path().join("cache"))
    }

    #[test]
    fn catalog_values_apply_without_overrides() {
        let root = TempDir::new().unwrap();
        let paths = temp_paths(&root);
        let catalog = Catalog::builtin();

        let config = build_config(&RunArgs::default(), &catalog, &AppState::default(), &paths);

        assert_eq!(config.assets.len(), 5);
        assert_eq!(config.assets[0].id, "shoe1");
        assert!(config.cycle.auto_cycle);
        assert_eq!(config.cycle.interval, Duration::from_secs(3));
        assert_eq!(config.preset, RenderPresetId::Balanced);
        assert_eq!(config.theme, Theme::Dark);
        assert_eq!(config.cache_dir, root.path().join("cache/models"));
        assert_eq!(config.target_fps, None);
    }

    #[test]
    fn cli_overrides_win_over_catalog_and_state() {
        let root = TempDir::new().unwrap();
        let paths = temp_paths(&root);
        let catalog = Catalog::builtin();
        let mut state = AppState::default();
        state.set_theme(Theme::Light);

        let args = RunArgs {
            preset: Some(RenderPresetId::High),
            interval: Some(Duration::from_secs(6)),
            transition: Some(Duration::from_millis(200)),
            transition_curve: Some(CrossfadeCurve::Linear),
            no_auto_cycle: true,
            theme: Some(Theme::Dark),
            size: Some((640, 480)),
            fps: Some(30.0),
            cache_only: true,
            ..RunArgs::default()
        };
        let config = build_config(&args, &catalog, &state, &paths);

        assert_eq!(config.preset, RenderPresetId::High);
        assert!(!config.cycle.auto_cycle);
        assert_eq!(config.cycle.interval, Duration::from_secs(6));
        assert_eq!(config.cycle.transition, Duration::from_millis(200));
        assert_eq!(config.crossfade_curve, CrossfadeCurve::Linear);
        assert_eq!(config.theme, Theme::Dark);
        assert_eq!(config.surface_size, (640, 480));
        assert_eq!(config.target_fps, Some(30.0));
        assert!(config.fetch.cache_only);
    }

    #[test]
    fn saved_theme_is_used_when_not_overridden() {
        let root = TempDir::new().unwrap();
        let mut state = AppState::default();
        state.set_theme(Theme::Light);
        let config = build_config(
            &RunArgs::default(),
            &Catalog::builtin(),
            &state,
            &temp_paths(&root),
        );
        assert_eq!(config.theme, Theme::Light);
    }

    #[test]
    fn zero_fps_means_uncapped() {
        let root = TempDir::new().unwrap();
        let args = RunArgs {
            fps: Some(0.0),
            ..RunArgs::default()
        };
        let config = build_config(&args, &Catalog::builtin(), &AppState::default(), &temp_paths(&root));
        assert_eq!(config.target_fps, None);
    }

    #[test]
    fn user_catalog_is_preferred_over_builtin() {
        let root = TempDir::new().unwrap();
        let paths = temp_paths(&root);
        fs::create_dir_all(paths.config_dir()).unwrap();
        fs::write(
            paths.default_catalog(),
            r#"
version = 1

[render]
preset = "low"

[[assets]]
id = "chair"
label = "CHAIR"
url = "https://example.com/chair.glb"
"#,
        )
        .unwrap();

        let catalog = load_catalog(&RunArgs::default(), &paths).unwrap();
        assert_eq!(catalog.assets.len(), 1);
        assert_eq!(catalog.assets[0].id, "chair");

        let config = build_config(&RunArgs::default(), &catalog, &AppState::default(), &paths);
        assert_eq!(config.preset, RenderPresetId::Low);
    }

    #[test]
    fn missing_explicit_catalog_is_an_error() {
        let root = TempDir::new().unwrap();
        let args = RunArgs {
            catalog: Some(root.path().join("nope.toml")),
            ..RunArgs::default()
        };
        let err = load_catalog(&args, &temp_paths(&root)).unwrap_err();
        assert!(err.to_string().contains("failed to load catalog"));
    }

    #[test]
    fn falls_back_to_builtin_catalog() {
        let root = TempDir::new().unwrap();
        let catalog = load_catalog(&RunArgs::default(), &temp_paths(&root)).unwrap();
        assert_eq!(catalog.assets.len(), 5);
    }
}
