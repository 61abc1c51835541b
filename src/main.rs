use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;

use handnav::driver::{ReplayDetector, SyntheticFrameSource};
use handnav::host::HostServices;
use handnav::{HandnavConfig, HandnavOrchestrator};

#[derive(Parser, Debug)]
#[command(name = "handnav")]
#[command(about = "Hand-gesture page navigation driven by hand landmark streams")]
#[command(version)]
#[command(long_about = "Turns hand landmarks into page actions: an index finger moves a cursor \
and scrolls, hovering clickable elements clicks them, four fingers swipe through history and \
held fist or palm poses save viewport or full page captures. Without a browser host the \
pipeline runs against an in-memory document, optionally replaying recorded landmark sessions.")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "handnav.toml", help = "Path to TOML configuration file")]
    config: String,

    /// Enable debug logging (most verbose)
    #[arg(short, long, help = "Enable debug level logging")]
    debug: bool,

    /// Enable verbose logging (info level)
    #[arg(short, long, help = "Enable verbose info level logging")]
    verbose: bool,

    /// Enable quiet mode (errors only)
    #[arg(short, long, help = "Enable quiet mode - only log errors")]
    quiet: bool,

    /// Validate configuration and exit
    #[arg(long, help = "Validate configuration file and exit without starting tracking")]
    validate_config: bool,

    /// Print default configuration and exit
    #[arg(long, help = "Print default configuration in TOML format and exit")]
    print_config: bool,

    /// Dry run mode - initialize but don't start tracking
    #[arg(long, help = "Perform dry run - initialize components but don't start them")]
    dry_run: bool,

    /// Override log format (json, pretty, compact)
    #[arg(long, value_name = "FORMAT", help = "Log output format: json, pretty, or compact")]
    log_format: Option<String>,

    /// Also write logs to daily rotated files in this directory
    #[arg(long, value_name = "DIR", help = "Directory for rotated log files")]
    log_dir: Option<PathBuf>,

    /// Replay recorded landmarks instead of idling on a synthetic camera
    #[arg(long, value_name = "FILE", help = "JSON lines file of recorded landmark frames")]
    replay: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Handle special modes that don't require full initialization
    if args.print_config {
        print_default_config()?;
        return Ok(());
    }

    let _log_guard = init_logging(&args)?;

    info!("Starting handnav v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration file: {}", args.config);

    let config = match HandnavConfig::load_from_file(&args.config) {
        Ok(config) => {
            info!("Configuration loaded successfully from: {}", args.config);
            config
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if args.validate_config {
        match config.validate() {
            Ok(()) => {
                info!("Configuration validation successful");
                println!("✓ Configuration is valid");
                return Ok(());
            }
            Err(e) => {
                error!("Configuration validation failed: {}", e);
                eprintln!("✗ Configuration validation failed: {}", e);
                std::process::exit(1);
            }
        }
    }

    let host = HostServices::headless(config.cursor.viewport, &config.capture.path);
    let (source, detector) = match &args.replay {
        Some(path) => {
            let detector = ReplayDetector::from_file(path).await.map_err(|e| {
                error!("Failed to load recording {}: {}", path.display(), e);
                e
            })?;
            let source = SyntheticFrameSource::new(config.camera.clone())
                .with_frame_limit(detector.len() as u64);
            (source, detector)
        }
        None => (
            SyntheticFrameSource::new(config.camera.clone()),
            ReplayDetector::default(),
        ),
    };

    let mut orchestrator =
        HandnavOrchestrator::new(config, host, Box::new(source), Box::new(detector))
            .await
            .map_err(|e| {
                error!("Failed to create orchestrator: {}", e);
                e
            })?;

    orchestrator.initialize().await.map_err(|e| {
        error!("Failed to initialize: {}", e);
        e
    })?;

    if args.dry_run {
        info!("Dry run mode - components initialized but not started");
        println!("✓ Dry run completed successfully - all components initialized");
        return Ok(());
    }

    orchestrator.start().await.map_err(|e| {
        error!("Failed to start tracking: {}", e);
        e
    })?;

    let exit_code = orchestrator.run().await.map_err(|e| {
        error!("Error during execution: {}", e);
        e
    })?;

    if let Some(stats) = orchestrator.loop_stats() {
        info!(
            "Processed {} frames, {} with a hand, {} actions",
            stats.ticks, stats.frames_with_hand, stats.actions_applied
        );
    }
    info!("Handnav exited with code: {}", exit_code);

    drop(_log_guard);
    std::process::exit(exit_code);
}

fn init_logging(args: &Args) -> Result<Option<WorkerGuard>> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    let log_level = if args.debug {
        "debug"
    } else if args.verbose {
        "info"
    } else if args.quiet {
        "error"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("handnav={}", log_level)));

    let fmt_layer = match args.log_format.as_deref() {
        Some("json") => fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        Some("compact") => fmt::layer()
            .compact()
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .boxed(),
        Some("pretty") | None => fmt::layer()
            .pretty()
            .with_target(true)
            .with_thread_ids(args.debug)
            .with_file(args.debug)
            .with_line_number(args.debug)
            .boxed(),
        Some(format) => {
            eprintln!("Warning: Unknown log format '{}', using default", format);
            fmt::layer()
                .with_target(true)
                .with_thread_ids(args.debug)
                .with_file(args.debug)
                .with_line_number(args.debug)
                .boxed()
        }
    };

    let (file_layer, guard) = match &args.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let appender = tracing_appender::rolling::daily(dir, "handnav.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false).boxed();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(file_layer)
        .with(env_filter)
        .init();

    Ok(guard)
}

/// Print default configuration in TOML format
fn print_default_config() -> Result<()> {
    println!("# Handnav Configuration File");
    println!("# This is the default configuration with all available options.");
    println!("# Every value can be overridden with HANDNAV__<SECTION>__<KEY> variables.");
    println!();
    println!("{}", toml::to_string_pretty(&HandnavConfig::default())?);
    Ok(())
}
