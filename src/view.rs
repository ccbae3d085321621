//! Handles to everything the screen shows. Components update these; the
//! drawing code only reads them.

use crate::task::{Status, TaskId};

/// Header of a column: status label plus the coloured dot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnHeader {
    pub status: Status,
    pub label: String,
}

impl ColumnHeader {
    pub fn for_status(status: Status) -> Self {
        Self {
            status,
            label: status.label().to_string(),
        }
    }
}

/// One visible task. Clicking or pressing Enter on it opens the edit modal
/// for `task_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRow {
    pub task_id: TaskId,
    pub title: String,
}

/// A status column. `body` is the task container; `None` means it has not
/// been created yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnView {
    pub header: ColumnHeader,
    pub body: Option<Vec<TaskRow>>,
}

impl ColumnView {
    pub fn new(status: Status) -> Self {
        Self {
            header: ColumnHeader::for_status(status),
            body: Some(Vec::new()),
        }
    }

    pub fn status(&self) -> Status {
        self.header.status
    }

    pub fn rows(&self) -> &[TaskRow] {
        self.body.as_deref().unwrap_or(&[])
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardControl {
    pub label: String,
    pub active: bool,
}

#[derive(Debug, Clone, Default)]
pub struct BoardView {
    pub header: String,
    pub board_controls: Vec<BoardControl>,
    pub columns: Vec<ColumnView>,
}

impl BoardView {
    /// A view with one empty column per status.
    pub fn new() -> Self {
        Self {
            header: String::new(),
            board_controls: Vec::new(),
            columns: Status::ALL.iter().map(|s| ColumnView::new(*s)).collect(),
        }
    }

    pub fn column(&self, status: Status) -> Option<&ColumnView> {
        self.columns.iter().find(|c| c.status() == status)
    }

    /// Rebuild the board list, clearing any active marker.
    pub fn set_boards(&mut self, boards: &[String]) {
        self.board_controls = boards
            .iter()
            .map(|b| BoardControl {
                label: b.clone(),
                active: false,
            })
            .collect();
    }

    /// Mark exactly the controls whose label equals `name`.
    pub fn style_active_board(&mut self, name: &str) {
        for control in &mut self.board_controls {
            control.active = control.label == name;
        }
    }

    pub fn active_control(&self) -> Option<usize> {
        self.board_controls.iter().position(|c| c.active)
    }

    /// Status column and row index showing `id`, if any.
    pub fn locate(&self, id: TaskId) -> Option<(Status, usize)> {
        self.columns.iter().find_map(|c| {
            c.rows()
                .iter()
                .position(|r| r.task_id == id)
                .map(|idx| (c.status(), idx))
        })
    }
}
