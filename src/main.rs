use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use oled_sentinel::Config;
use oled_sentinel::logging::init_logging;

#[derive(Parser, Debug)]
#[command(name = "oled-sentinel")]
#[command(about = "Blanks idle displays to protect OLED panels from burn-in")]
#[command(version)]
struct Args {
    /// Path to config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Blank all enabled monitors right after startup
    #[arg(long)]
    blank_now: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Open the settings window
    Settings,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let explicit_config = args.config.is_some();
    let config_path = match args.config {
        Some(path) => path,
        None => Config::default_path().context("Could not determine config directory")?,
    };

    // The daemon raises verbosity itself once it has read `debug`.
    let log = init_logging(&args.log_level, false)?;
    info!("oled-sentinel v{}", env!("CARGO_PKG_VERSION"));

    run(args.command, config_path, explicit_config, args.blank_now, log)
}

#[cfg(windows)]
fn run(
    command: Option<Command>,
    config_path: PathBuf,
    explicit_config: bool,
    blank_now: bool,
    log: oled_sentinel::logging::LogHandle,
) -> Result<()> {
    use oled_sentinel::platform::{DaemonOptions, run_daemon};

    match command {
        Some(Command::Settings) => oled_sentinel::ui::run_settings(config_path),
        None => run_daemon(
            DaemonOptions {
                config_path,
                explicit_config,
                blank_now,
            },
            log,
        ),
    }
}

#[cfg(not(windows))]
fn run(
    _command: Option<Command>,
    _config_path: PathBuf,
    _explicit_config: bool,
    _blank_now: bool,
    _log: oled_sentinel::logging::LogHandle,
) -> Result<()> {
    anyhow::bail!("oled-sentinel only runs on Windows")
}
