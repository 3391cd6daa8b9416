use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use renderer::{Antialiasing, CrossfadeCurve, RenderPresetId, Theme};

#[derive(Parser, Debug)]
#[command(
    name = "zerogiven",
    author,
    version,
    about = "Zero Given product showcase",
    arg_required_else_help = false
)]
pub struct Cli {
    #[command(flatten)]
    pub run: RunArgs,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Parser, Debug, Default)]
pub struct RunArgs {
    /// Catalog TOML listing the models to show (defaults to `catalog.toml` in
    /// the config directory, then the built-in shoe catalog).
    #[arg(long, value_name = "FILE", global = true)]
    pub catalog: Option<PathBuf>,

    /// Quality preset: `low`, `balanced`, or `high`.
    #[arg(long, value_name = "PRESET", value_parser = parse_preset)]
    pub preset: Option<RenderPresetId>,

    /// Time each model stays on screen (e.g. `3s`, `2500ms`, or plain seconds).
    #[arg(long, value_name = "DURATION", value_parser = parse_duration)]
    pub interval: Option<Duration>,

    /// Start with automatic cycling paused.
    #[arg(long)]
    pub no_auto_cycle: bool,

    /// Crossfade length when switching models (e.g. `500ms`).
    #[arg(long, value_name = "DURATION", value_parser = parse_duration)]
    pub transition: Option<Duration>,

    /// Crossfade easing: `linear`, `smoothstep`, or `ease-in-out`.
    #[arg(long, value_name = "CURVE", value_parser = parse_crossfade_curve)]
    pub transition_curve: Option<CrossfadeCurve>,

    /// Page theme for this session: `dark` or `light` (overrides the saved preference).
    #[arg(long, value_name = "THEME", value_parser = parse_theme)]
    pub theme: Option<Theme>,

    /// Initial window size (e.g. `1280x800`).
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_dimensions)]
    pub size: Option<(u32, u32)>,

    /// Optional FPS cap (0=uncapped).
    #[arg(long, value_name = "FPS")]
    pub fps: Option<f32>,

    /// Anti-aliasing policy: `auto`, `off`, or an explicit MSAA sample count (e.g. `4`).
    #[arg(
        long,
        value_name = "MODE",
        value_parser = parse_antialias,
        default_value = "auto"
    )]
    pub antialias: Antialiasing,

    /// Never download models; only use local files and the model cache.
    #[arg(long, global = true)]
    pub cache_only: bool,

    /// Download remote models again even when a cached copy exists.
    #[arg(long)]
    pub refresh: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Inspect the model catalog.
    Assets(AssetsCommand),
    /// Read or change the saved page theme.
    Theme(ThemeCommand),
    /// Print resolved directories for config, cache, and state.
    Where,
}

#[derive(Parser, Debug)]
pub struct AssetsCommand {
    #[command(subcommand)]
    pub action: AssetsAction,
}

#[derive(Subcommand, Debug)]
pub enum AssetsAction {
    /// List catalog entries with their cache state.
    List,
}

#[derive(Parser, Debug)]
pub struct ThemeCommand {
    #[command(subcommand)]
    pub action: ThemeAction,
}

#[derive(Subcommand, Debug)]
pub enum ThemeAction {
    /// Print the saved theme.
    Get,
    /// Save a theme.
    Set {
        #[arg(value_name = "THEME", value_parser = parse_theme)]
        theme: Theme,
    },
    /// Flip between dark and light.
    Toggle,
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_antialias(value: &str) -> Result<Antialiasing, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("anti-alias mode must not be empty".to_string());
    }

    let normalized = trimmed.to_ascii_lowercase();
    match normalized.as_str() {
        "auto" | "default" => Ok(Antialiasing::Auto),
        "off" | "none" | "disable" | "disabled" | "0" => Ok(Antialiasing::Off),
        _ => {
            let samples: u32 = normalized.parse().map_err(|_| {
                format!("invalid anti-alias sample count '{trimmed}'; use auto/off or 2/4/8/16")
            })?;

            if samples == 1 {
                return Ok(Antialiasing::Off);
            }

            if !matches!(samples, 2 | 4 | 8 | 16) {
                return Err(format!(
                    "unsupported sample count {samples}; supported values are 2, 4, 8, or 16"
                ));
            }

            Ok(Antialiasing::Samples(samples))
        }
    }
}

pub fn parse_preset(value: &str) -> Result<RenderPresetId, String> {
    value.parse()
}

pub fn parse_theme(value: &str) -> Result<Theme, String> {
    value.parse()
}

pub fn parse_crossfade_curve(value: &str) -> Result<CrossfadeCurve, String> {
    let normalized = value.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "linear" => Ok(CrossfadeCurve::Linear),
        "smoothstep" | "smooth" => Ok(CrossfadeCurve::Smoothstep),
        "ease-in-out" | "ease_in_out" | "easeinout" => Ok(CrossfadeCurve::EaseInOut),
        "" => Err("crossfade curve must not be empty".to_string()),
        other => Err(format!(
            "unknown crossfade curve '{other}'; expected linear, smoothstep, or ease-in-out"
        )),
    }
}

/// Accepts humantime strings (`3s`, `250ms`, `1m 5s`) or a bare number of seconds.
pub fn parse_duration(value: &str) -> Result<Duration, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("duration must not be empty".to_string());
    }

    if let Ok(seconds) = trimmed.parse::<f64>() {
        if !seconds.is_finite() || seconds < 0.0 {
            return Err(format!("duration must be a non-negative number, got '{trimmed}'"));
        }
        return Duration::try_from_secs_f64(seconds)
            .map_err(|err| format!("invalid duration '{trimmed}': {err}"));
    }

    humantime::parse_duration(trimmed).map_err(|err| format!("invalid duration '{trimmed}': {err}"))
}

pub fn parse_dimensions(value: &str) -> Result<(u32, u32), String> {
    let (w, h) = value
        .trim()
        .split_once(['x', 'X'])
        .ok_or_else(|| "expected WIDTHxHEIGHT".to_string())?;
    let width = w
        .trim()
        .parse::<u32>()
        .map_err(|_| "invalid width in window size".to_string())?;
    let height = h
        .trim()
        .parse::<u32>()
        .map_err(|_| "invalid height in window size".to_string())?;
    if width == 0 || height == 0 {
        return Err("window size must be greater than zero".into());
    }
    Ok((width, height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_antialias_modes() {
        assert_eq!(parse_antialias("auto").unwrap(), Antialiasing::Auto);
        assert_eq!(parse_antialias("OFF").unwrap(), Antialiasing::Off);
        assert_eq!(parse_antialias("1").unwrap(), Antialiasing::Off);
        assert_eq!(parse_antialias("8").unwrap(), Antialiasing::Samples(8));
        assert!(parse_antialias("3").is_err());
        assert!(parse_antialias("lots").is_err());
        assert!(parse_antialias(" ").is_err());
    }

    #[test]
    fn parses_durations_in_either_spelling() {
        assert_eq!(parse_duration("3s").unwrap(), Duration::from_secs(3));
        assert_eq!(parse_duration("250ms").unwrap(), Duration::from_millis(250));
        assert_eq!(parse_duration("2.5").unwrap(), Duration::from_millis(2500));
        assert!(parse_duration("-1").is_err());
        assert!(parse_duration("1e300").is_err());
        assert!(parse_duration("soon").is_err());
        assert!(parse_duration("").is_err());
    }

    #[test]
    fn parses_window_size() {
        assert_eq!(parse_dimensions("1280x800").unwrap(), (1280, 800));
        assert_eq!(parse_dimensions(" 640 X 480 ").unwrap(), (640, 480));
        assert!(parse_dimensions("0x800").is_err());
        assert!(parse_dimensions("1280").is_err());
    }

    #[test]
    fn parses_named_values() {
        assert_eq!(parse_preset("HIGH").unwrap(), RenderPresetId::High);
        assert!(parse_preset("ultra").is_err());
        assert_eq!(parse_theme("light").unwrap(), Theme::Light);
        assert!(parse_theme("sepia").is_err());
        assert_eq!(
            parse_crossfade_curve("ease-in-out").unwrap(),
            CrossfadeCurve::EaseInOut
        );
        assert!(parse_crossfade_curve("bounce").is_err());
    }

    #[test]
    fn cli_accepts_run_flags_and_subcommands() {
        let cli = Cli::try_parse_from([
            "zerogiven",
            "--preset",
            "low",
            "--interval",
            "4s",
            "--no-auto-cycle",
            "--size",
            "800x600",
        ])
        .unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.run.preset, Some(RenderPresetId::Low));
        assert_eq!(cli.run.interval, Some(Duration::from_secs(4)));
        assert!(cli.run.no_auto_cycle);
        assert_eq!(cli.run.size, Some((800, 600)));
        assert_eq!(cli.run.antialias, Antialiasing::Auto);

        assert!(Cli::try_parse_from(["zerogiven", "--interval", "1e300"]).is_err());

        let cli = Cli::try_parse_from(["zerogiven", "theme", "set", "light"]).unwrap();
        match cli.command {
            Some(Command::Theme(ThemeCommand {
                action: ThemeAction::Set { theme },
            })) => assert_eq!(theme, Theme::Light),
            other => panic!("unexpected command: {other:?}"),
        }

        let cli = Cli::try_parse_from(["zerogiven", "assets", "list", "--cache-only"]).unwrap();
        assert!(matches!(cli.command, Some(Command::Assets(_))));
        assert!(cli.run.cache_only);
    }
}
