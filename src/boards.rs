use tracing::{debug, warn};

use crate::render::render_columns;
use crate::storage::{keys, KeyValueStore, StorageError};
use crate::task::Task;
use crate::view::BoardView;

/// Distinct non-empty board names in first-seen order.
pub fn derive_boards(tasks: &[Task]) -> Vec<String> {
    let mut boards: Vec<String> = Vec::new();
    for task in tasks {
        if !task.board.is_empty() && !boards.iter().any(|b| b == &task.board) {
            boards.push(task.board.clone());
        }
    }
    boards
}

/// A non-empty persisted name wins, even if no task uses it any more.
/// Otherwise the first board, or empty when there are none.
pub fn resolve_active_board(boards: &[String], persisted: Option<&str>) -> String {
    match persisted {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => boards.first().cloned().unwrap_or_default(),
    }
}

/// Per-run state: the board whose tasks are on screen.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub active_board: String,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode the persisted pointer (a JSON string). Malformed values count as absent.
    pub fn load_persisted(kv: &dyn KeyValueStore) -> Option<String> {
        let raw = kv.get(keys::ACTIVE_BOARD)?;
        match serde_json::from_str::<Option<String>>(&raw) {
            Ok(name) => name,
            Err(err) => {
                warn!(error = %err, raw = %raw, "ignoring malformed active board");
                None
            }
        }
    }

    pub fn has_active(&self) -> bool {
        !self.active_board.is_empty()
    }

    /// Switch to `name`: persist it, repaint the columns, and move the active
    /// marker. The in-memory switch happens even when persisting fails.
    #[tracing::instrument(skip(self, kv, view, tasks))]
    pub fn select_board(
        &mut self,
        name: &str,
        kv: &mut dyn KeyValueStore,
        view: &mut BoardView,
        tasks: &[Task],
    ) -> Result<(), StorageError> {
        self.active_board = name.to_string();
        view.header = name.to_string();
        render_columns(view, name, tasks);
        view.style_active_board(name);
        debug!("board selected");
        self.persist(kv)
    }

    pub fn persist(&self, kv: &mut dyn KeyValueStore) -> Result<(), StorageError> {
        kv.set(keys::ACTIVE_BOARD, serde_json::to_string(&self.active_board)?)
    }

    /// Neighbouring board in the list, wrapping. From a board that is not
    /// listed, steps land on the first or last board.
    pub fn cycle(&self, boards: &[String], forward: bool) -> Option<String> {
        if boards.is_empty() {
            return None;
        }
        let len = boards.len();
        let next = match boards.iter().position(|b| b == &self.active_board) {
            Some(i) if forward => (i + 1) % len,
            Some(i) => (i + len - 1) % len,
            None if forward => 0,
            None => len - 1,
        };
        Some(boards[next].clone())
    }
}
