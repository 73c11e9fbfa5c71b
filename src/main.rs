use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use dotmate::config::expand;
use dotmate::tree::visible_entries;
use dotmate::tui;
use dotmate::{build_tree, Config, SyncEngine};

#[derive(Parser)]
#[command(name = "dotmate")]
#[command(about = "Mirror dotfile directories into one managed folder")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Settings file path (defaults to ./settings.json, then the XDG config location)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a settings file and create the destination directory
    Init {
        /// Directory every tracked dotfile tree is mirrored into
        #[arg(short, long)]
        destination: String,
    },

    /// Mirror a dotfile directory and start tracking it
    Add {
        /// Directory to track, e.g. ~/.config/nvim
        path: String,
    },

    /// Re-synchronize every tracked directory
    Refresh,

    /// List tracked directories
    List,

    /// Print the destination tree
    Tree {
        /// Expand every directory
        #[arg(long)]
        expand: bool,
    },

    /// Push the destination to a remote
    Push,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("❌ Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    // Only initialize logging for CLI commands, not TUI
    // stdout logging breaks raw mode
    let is_tui = cli.command.is_none();
    if !is_tui {
        init_logging(cli.verbose)?;
        info!("Starting dotmate v{}", env!("CARGO_PKG_VERSION"));
    }

    let config_path = settings_path(cli.config)?;

    match cli.command {
        None => tui::run_tui(load_config(&config_path)?, config_path),
        Some(Commands::Init { destination }) => cmd_init(destination, &config_path),
        Some(Commands::Add { path }) => cmd_add(&load_engine(&config_path)?, &path),
        Some(Commands::Refresh) => cmd_refresh(&load_engine(&config_path)?),
        Some(Commands::List) => cmd_list(&load_engine(&config_path)?),
        Some(Commands::Tree { expand }) => cmd_tree(&load_engine(&config_path)?, expand),
        Some(Commands::Push) => cmd_push(&load_engine(&config_path)?),
    }
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    Ok(())
}

/// Locate the settings file from the flag, the working directory or XDG
fn settings_path(explicit: Option<PathBuf>) -> Result<PathBuf> {
    let working_dir = std::env::current_dir().context("Cannot read the working directory")?;
    match Config::resolve_path(explicit, &working_dir) {
        Some(path) => Ok(path),
        None => bail!("No configuration directory found; pass --config <path>"),
    }
}

/// Load the settings file; missing or malformed settings are fatal
fn load_config(config_path: &Path) -> Result<Config> {
    Config::load(config_path)
        .with_context(|| format!("Cannot load settings from {}", config_path.display()))
}

fn load_engine(config_path: &Path) -> Result<SyncEngine> {
    let config = load_config(config_path)?;
    Ok(SyncEngine::from_config(&config, config_path))
}

/// Write the settings file and prepare the destination
fn cmd_init(destination: String, config_path: &Path) -> Result<()> {
    info!("Initializing dotmate...");

    let expanded = expand(&destination)?;
    std::fs::create_dir_all(&expanded)
        .with_context(|| format!("Cannot create destination {}", expanded.display()))?;

    Config::new(destination).save(config_path)?;
    info!("Configuration saved to: {:?}", config_path);

    println!("✅ dotmate initialized successfully!");
    println!("   Config: {}", config_path.display());
    println!("   Destination: {}", expanded.display());
    println!("   Next: track a directory with 'dotmate add ~/.config/<app>'");

    Ok(())
}

/// Validate, mirror and track one directory
fn cmd_add(engine: &SyncEngine, path: &str) -> Result<()> {
    let report = engine
        .validate_and_sync(path)
        .with_context(|| format!("Cannot add {}", path))?;
    let mirror = engine.mirror_path(path)?;

    println!("✅ Tracking {}", path);
    println!("   Mirror: {}", mirror.display());
    println!("   {}", report);

    Ok(())
}

/// Re-synchronize everything; fails when any tracked path failed
fn cmd_refresh(engine: &SyncEngine) -> Result<()> {
    let summary = engine.refresh_all().context("Cannot read tracked paths")?;

    if summary.total() == 0 {
        println!("📭 Nothing tracked yet. Add a directory with 'dotmate add <path>'");
        return Ok(());
    }

    println!("🔄 Refreshed {} tracked paths", summary.total());
    for (path, report) in summary.succeeded() {
        println!("   ✅ {}: {}", path, report);
    }
    for (path, e) in summary.failed() {
        println!("   ❌ {}: {}", path, e);
    }

    println!(
        "\n📈 Summary: {} ok, {} failed in {:.2}s",
        summary.total() - summary.failed_count(),
        summary.failed_count(),
        summary.duration.as_secs_f64()
    );

    if !summary.all_succeeded() {
        bail!(
            "{} of {} tracked paths failed to refresh",
            summary.failed_count(),
            summary.total()
        );
    }

    Ok(())
}

/// Print tracked paths with their mirror location
fn cmd_list(engine: &SyncEngine) -> Result<()> {
    let entries = engine.tracked()?;

    if entries.is_empty() {
        println!("📭 Nothing tracked yet");
        return Ok(());
    }

    println!("📋 Tracked directories ({}):", entries.len());
    for entry in entries {
        let icon = if entry.source_exists { "✅" } else { "⚠️ " };
        let mirror = entry
            .mirror
            .map(|m| m.display().to_string())
            .unwrap_or_else(|| "?".to_string());
        print!("   {} {} -> {}", icon, entry.path, mirror);
        if !entry.source_exists {
            print!(" (source missing)");
        }
        println!();
    }

    Ok(())
}

/// Print the destination tree, one level deep unless `expand_all`
fn cmd_tree(engine: &SyncEngine, expand_all: bool) -> Result<()> {
    let mut tree = build_tree(engine.destination());
    if expand_all {
        tree.set_expanded_recursive(true);
    } else {
        tree.expanded = true;
    }

    for (depth, node) in visible_entries(&tree) {
        let suffix = if node.is_dir() && depth > 0 { "/" } else { "" };
        println!("{}{}{}", "  ".repeat(depth), node.label, suffix);
    }

    Ok(())
}

fn cmd_push(engine: &SyncEngine) -> Result<()> {
    engine.push()?;
    Ok(())
}
