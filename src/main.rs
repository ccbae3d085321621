mod app;
mod boards;
mod bootstrap;
mod cli;
mod input;
mod modal;
mod render;
mod storage;
mod task;
mod task_store;
mod theme;
mod ui;
mod view;

use std::io;

use anyhow::Context;
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{error, info};

use crate::app::App;
use crate::bootstrap::{default_seed, initialize_data, load_seed_file};
use crate::cli::{init_tracing, Cli, Config};
use crate::storage::{JsonFileStore, KeyValueStore, MemoryStore};
use crate::task_store::TaskStore;

fn main() -> anyhow::Result<()> {
    let config = Config::from_cli(Cli::parse())?;
    init_tracing(config.verbose, &config.log_path)?;

    let kv: Box<dyn KeyValueStore> = if config.ephemeral {
        Box::new(MemoryStore::new())
    } else {
        let file = JsonFileStore::open(&config.data_path)
            .with_context(|| format!("failed to open store {}", config.data_path.display()))?;
        Box::new(file)
    };
    let mut store = TaskStore::new(kv);

    let seed = match &config.seed_path {
        Some(path) => load_seed_file(path)?,
        None => default_seed(),
    };
    initialize_data(&mut store, &seed).context("failed to seed store")?;

    let mut app = App::new(store);

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    info!(data = %config.data_path.display(), ephemeral = config.ephemeral, "board started");
    let result = app::run(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = &result {
        error!(error = %err, "board exited with error");
    }
    result.context("terminal i/o failed")
}
