mod bindings;
mod cli;
mod paths;
mod run;
mod state;

use anyhow::{Context, Result};
use assets::{AssetFetcher, AssetSource, FetchOptions};
use cli::{AssetsAction, Command, RunArgs, ThemeAction};
use paths::AppPaths;
use state::AppState;

fn main() -> Result<()> {
    let cli = cli::parse();
    run::initialise_tracing();

    match cli.command {
        Some(Command::Assets(assets_cmd)) => match assets_cmd.action {
            AssetsAction::List => run_assets_list(&cli.run),
        },
        Some(Command::Theme(theme_cmd)) => run_theme_command(theme_cmd.action),
        Some(Command::Where) => run_where(&cli.run),
        None => run::run(cli.run),
    }
}

fn run_assets_list(args: &RunArgs) -> Result<()> {
    let paths = AppPaths::discover()?;
    let catalog = run::load_catalog(args, &paths)?;
    // Listing never touches the network.
    let fetcher = AssetFetcher::new(
        paths.model_cache_dir(),
        FetchOptions {
            cache_only: true,
            refresh: false,
        },
    )?;

    println!("Catalog assets:");
    for (position, asset) in catalog.assets.iter().enumerate() {
        let status = match AssetSource::parse(&asset.url) {
            Ok(source) => match (source.is_remote(), fetcher.is_cached(&source)) {
                (true, true) => "cached",
                (true, false) => "remote",
                (false, true) => "local",
                (false, false) => "missing",
            },
            Err(_) => "invalid",
        };
        let marker = if position == 0 { "*" } else { " " };
        println!(
            " {marker}{:<12} {:<16} status={:<8} url={}",
            asset.id, asset.label, status, asset.url
        );
    }
    Ok(())
}

fn run_theme_command(action: ThemeAction) -> Result<()> {
    let paths = AppPaths::discover()?;
    let state_file = paths.state_file();
    let mut state = AppState::load_or_default(&state_file)?;

    let theme = match action {
        ThemeAction::Get => {
            println!("{}", state.theme());
            return Ok(());
        }
        ThemeAction::Set { theme } => theme,
        ThemeAction::Toggle => state.theme().toggled(),
    };

    state.set_theme(theme);
    state
        .persist(&state_file)
        .context("failed to save theme preference")?;
    println!("{theme}");
    Ok(())
}

fn run_where(args: &RunArgs) -> Result<()> {
    let paths = AppPaths::discover()?;
    let catalog = match args.catalog.as_ref() {
        Some(path) => path.clone(),
        None => paths.default_catalog(),
    };
    println!("Configuration directories:");
    println!("  config:     {}", paths.config_dir().display());
    println!("  cache:      {}", paths.cache_dir().display());
    println!("  models:     {}", paths.model_cache_dir().display());
    println!("  state:      {}", paths.state_file().display());
    if catalog.exists() {
        println!("  catalog:    {}", catalog.display());
    } else {
        println!("  catalog:    {} (not found; using built-in)", catalog.display());
    }
    Ok(())
}
