use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{anyhow, Context};
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "taskboard", version, about = "Terminal kanban board")]
pub struct Cli {
    /// Store file holding tasks and preferences.
    #[arg(long, env = "TASKBOARD_DATA")]
    pub data: Option<PathBuf>,

    /// JSON array of tasks used to seed an empty store.
    #[arg(long)]
    pub seed: Option<PathBuf>,

    /// Where log output goes (defaults next to the store file).
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Keep everything in memory; nothing is written to the store file.
    #[arg(long)]
    pub ephemeral: bool,

    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Resolved runtime settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub data_path: PathBuf,
    pub seed_path: Option<PathBuf>,
    pub log_path: PathBuf,
    pub ephemeral: bool,
    pub verbose: u8,
}

impl Config {
    pub fn from_cli(cli: Cli) -> anyhow::Result<Self> {
        let data_path = match cli.data {
            Some(path) => path,
            None => default_data_path()?,
        };
        let log_path = cli
            .log_file
            .unwrap_or_else(|| data_path.with_file_name("taskboard.log"));
        Ok(Self {
            data_path,
            seed_path: cli.seed,
            log_path,
            ephemeral: cli.ephemeral,
            verbose: cli.verbose,
        })
    }
}

fn default_data_path() -> anyhow::Result<PathBuf> {
    let base = dirs::data_dir()
        .ok_or_else(|| anyhow!("no data directory on this platform, pass --data"))?;
    Ok(base.join("taskboard").join("store.json"))
}

fn default_level(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Log to a file; the terminal belongs to the board.
pub fn init_tracing(verbose: u8, log_path: &Path) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level(verbose)))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;

    if let Some(parent) = log_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .with_context(|| format!("failed to open log file {}", log_path.display()))?;

    let init_result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(Mutex::new(file))
        .with_target(true)
        .with_level(true)
        .with_ansi(false)
        .try_init();

    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }
    Ok(())
}
