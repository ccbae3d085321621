use tracing::{trace, warn};

use crate::task::{Status, Task};
use crate::view::{BoardView, ColumnView, TaskRow};

/// Repaint every status column with the tasks of `active_board`.
///
/// Each column keeps its header and gets a fresh body. A column missing from
/// the view is recreated in status order and the pass carries on.
pub fn render_columns(view: &mut BoardView, active_board: &str, tasks: &[Task]) {
    let on_board: Vec<&Task> = tasks.iter().filter(|t| t.board == active_board).collect();

    for status in Status::ALL {
        let column = column_or_create(view, status);
        let rows: Vec<TaskRow> = on_board
            .iter()
            .filter(|t| t.status == status)
            .map(|t| row_for(t))
            .collect();
        trace!(%status, rows = rows.len(), "rendered column");
        column.body = Some(rows);
    }
}

/// Append one task to its column without a full render.
pub fn add_task_to_ui(view: &mut BoardView, task: &Task) {
    let column = column_or_create(view, task.status);
    let body = column.body.get_or_insert_with(|| {
        warn!(status = %task.status, "tasks container missing, creating one");
        Vec::new()
    });
    body.push(row_for(task));
}

fn row_for(task: &Task) -> TaskRow {
    TaskRow {
        task_id: task.id,
        title: task.title.clone(),
    }
}

fn column_or_create(view: &mut BoardView, status: Status) -> &mut ColumnView {
    let idx = match view.columns.iter().position(|c| c.status() == status) {
        Some(idx) => idx,
        None => {
            warn!(%status, "column not found, creating fallback container");
            let at = view
                .columns
                .iter()
                .position(|c| c.status().index() > status.index())
                .unwrap_or(view.columns.len());
            view.columns.insert(at, ColumnView::new(status));
            at
        }
    };
    &mut view.columns[idx]
}
