//! Strata - arrangement and stacking engine for X11 window managers
//!
//! The engine itself lives in `strata-core` and never talks to an X server. This
//! binary is its headless front end: it loads the configuration, replays a scene
//! file of windows and input through the engine and prints where every window
//! ended up.
//!
//! # Features
//! - Float, tiled (four orientations), grid and monocle layouts per view
//! - Eight-band stacking with modal and transient grouping
//! - Interactive move and resize with snapping, tear-out and shuffling
//! - Dock-app area reserving screen space
//! - TOML configuration with per-view overrides

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::level_filters::LevelFilter;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use strata_core::config::Config;
use strata_core::Core;

mod scene;

use scene::Scene;

/// Strata - replay window scenes through the arrangement engine
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Run in debug mode with verbose logging
    #[arg(short, long)]
    debug: bool,

    /// Validate configuration and exit
    #[arg(long)]
    validate: bool,

    /// Print default configuration to stdout
    #[arg(long)]
    print_default_config: bool,

    /// Include every emitted action in the report
    #[arg(long)]
    actions: bool,

    /// Pretty-print the JSON report
    #[arg(short, long)]
    pretty: bool,

    /// Scene file (JSON) to replay
    scene: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Logs go to stderr so the report on stdout stays machine-readable
    let log_level = if args.debug {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    let filter = EnvFilter::builder()
        .with_default_directive(log_level.into())
        .from_env_lossy();
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Strata v{} starting...", env!("CARGO_PKG_VERSION"));

    if args.print_default_config {
        println!("{}", Config::default_config_string());
        return Ok(());
    }

    let config = if args.validate {
        // --validate reports load errors instead of falling back
        Config::load(args.config.as_deref())?
    } else {
        match Config::load(args.config.as_deref()) {
            Ok(cfg) => {
                info!("Configuration loaded successfully");
                cfg
            }
            Err(e) => {
                warn!("Failed to load config: {:#}, using defaults", e);
                Config::default()
            }
        }
    };

    if args.validate {
        info!("Configuration is valid");
        return Ok(());
    }

    let Some(path) = args.scene else {
        anyhow::bail!("no scene given; pass a scene file or --validate / --print-default-config");
    };
    let scene = Scene::load(&path)?;
    info!(
        screens = scene.screens.len(),
        steps = scene.steps.len(),
        "Replaying {:?}",
        path
    );

    let mut core = Core::new(config);
    let report = scene.run(&mut core, args.actions);
    if let Some(violation) = &report.violation {
        warn!(%violation, "scene ended in an inconsistent state");
    }

    let json = if args.pretty {
        serde_json::to_string_pretty(&report)
    } else {
        serde_json::to_string(&report)
    }
    .context("Failed to serialize report")?;
    println!("{json}");
    Ok(())
}
