use std::fs;
use std::path::Path;

use anyhow::Context;
use tracing::{debug, info};

use crate::storage::{keys, KeyValueStore, StorageError};
use crate::task::{Status, Task};
use crate::task_store::TaskStore;

/// Seed the store on first run. Returns whether anything was written.
#[tracing::instrument(skip_all, fields(seed = seed.len()))]
pub fn initialize_data(store: &mut TaskStore, seed: &[Task]) -> Result<bool, StorageError> {
    if store.has_collection() {
        debug!("data already exists in store");
        return Ok(false);
    }
    store.replace_all(seed)?;
    store.kv_mut().set(keys::SHOW_SIDEBAR, "true".to_string())?;
    info!("seeded store with initial data");
    Ok(true)
}

/// Seed tasks from a JSON array file.
pub fn load_seed_file(path: &Path) -> anyhow::Result<Vec<Task>> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("failed to read seed file {}", path.display()))?;
    serde_json::from_str(&data).with_context(|| format!("invalid seed file {}", path.display()))
}

/// Built-in first-run data.
pub fn default_seed() -> Vec<Task> {
    let entries: [(&str, &str, &str, Status); 6] = [
        (
            "Launch Epic Career",
            "Create a killer Resume",
            "Set up your first job hunt document",
            Status::Todo,
        ),
        (
            "Launch Epic Career",
            "Practice daily katas",
            "Short exercises every morning",
            Status::Doing,
        ),
        (
            "Launch Epic Career",
            "Contribute to open source",
            "Find a project with good first issues",
            Status::Done,
        ),
        (
            "Roadmap",
            "Plan the next release",
            "Collect feedback from the last one",
            Status::Todo,
        ),
        ("Roadmap", "Review milestones", "", Status::Doing),
        (
            "Marketing",
            "Draft launch post",
            "Outline the announcement",
            Status::Todo,
        ),
    ];

    entries
        .into_iter()
        .zip(1i64..)
        .map(|((board, title, description, status), id)| Task {
            id,
            title: title.to_string(),
            description: description.to_string(),
            status,
            board: board.to_string(),
        })
        .collect()
}

/// Display preferences restored at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UiPrefs {
    pub show_sidebar: bool,
    pub light_theme: bool,
}

impl UiPrefs {
    pub fn restore(kv: &dyn KeyValueStore) -> Self {
        Self {
            show_sidebar: kv.get(keys::SHOW_SIDEBAR).as_deref() == Some("true"),
            light_theme: kv.get(keys::LIGHT_THEME).as_deref() == Some("enabled"),
        }
    }

    /// Show or hide the sidebar and remember the choice.
    pub fn toggle_sidebar(
        &mut self,
        show: bool,
        kv: &mut dyn KeyValueStore,
    ) -> Result<(), StorageError> {
        self.show_sidebar = show;
        kv.set(keys::SHOW_SIDEBAR, show.to_string())
    }

    /// Flip between light and dark and remember the choice.
    pub fn toggle_theme(&mut self, kv: &mut dyn KeyValueStore) -> Result<(), StorageError> {
        self.light_theme = !self.light_theme;
        let value = if self.light_theme { "enabled" } else { "disabled" };
        kv.set(keys::LIGHT_THEME, value.to_string())
    }
}
