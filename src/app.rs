use std::io;

use crossterm::event::{
    self, Event, KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::{backend::Backend, layout::Position, Terminal};
use tracing::{debug, error, warn};

use crate::boards::{derive_boards, resolve_active_board, Session};
use crate::bootstrap::UiPrefs;
use crate::input::{map_key, Action};
use crate::modal::{Modal, ModalAction, TaskForm};
use crate::render::{add_task_to_ui, render_columns};
use crate::storage::StorageError;
use crate::task::{Status, TaskId};
use crate::task_store::{TaskError, TaskStore};
use crate::ui::{self, HitMap};
use crate::view::BoardView;

/// Notification severity for status line colouring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub level: NotificationLevel,
}

pub struct App {
    pub store: TaskStore,
    pub session: Session,
    pub view: BoardView,
    pub prefs: UiPrefs,
    pub modal: Modal,
    pub focused_column: usize,
    pub selected_task: usize,
    pub notification: Option<Notification>,
    pub hit_map: HitMap,
    pub should_quit: bool,
}

impl App {
    pub fn new(store: TaskStore) -> Self {
        let prefs = UiPrefs::restore(store.kv());
        Self {
            store,
            session: Session::new(),
            view: BoardView::new(),
            prefs,
            modal: Modal::Closed,
            focused_column: 0,
            selected_task: 0,
            notification: None,
            hit_map: HitMap::default(),
            should_quit: false,
        }
    }

    pub fn notify(&mut self, msg: impl Into<String>) {
        self.notification = Some(Notification {
            message: msg.into(),
            level: NotificationLevel::Info,
        });
    }

    pub fn notify_error(&mut self, msg: impl Into<String>) {
        self.notification = Some(Notification {
            message: msg.into(),
            level: NotificationLevel::Error,
        });
    }

    /// Bring the whole view in line with the store. Every mutating handler
    /// ends here.
    pub fn refresh(&mut self) {
        let tasks = self.store.list_tasks();
        let boards = derive_boards(&tasks);
        self.view.set_boards(&boards);

        if !self.session.has_active() {
            let persisted = Session::load_persisted(self.store.kv());
            self.session.active_board = resolve_active_board(&boards, persisted.as_deref());
        }
        if !self.session.has_active() {
            debug!("no boards, skipping render");
            self.view.header.clear();
            return;
        }

        let active = self.session.active_board.clone();
        self.view.header = active.clone();
        self.view.style_active_board(&active);
        render_columns(&mut self.view, &active, &tasks);
        self.clamp_selection();
    }

    pub fn select_board(&mut self, name: &str) {
        let tasks = self.store.list_tasks();
        let result = self
            .session
            .select_board(name, self.store.kv_mut(), &mut self.view, &tasks);
        self.selected_task = 0;
        self.clamp_selection();
        if let Err(err) = result {
            self.storage_failed(err);
        }
    }

    pub fn selected_task_id(&self) -> Option<TaskId> {
        self.view
            .columns
            .get(self.focused_column)
            .and_then(|c| c.rows().get(self.selected_task))
            .map(|r| r.task_id)
    }

    fn clamp_selection(&mut self) {
        let columns = self.view.columns.len();
        if self.focused_column >= columns {
            self.focused_column = columns.saturating_sub(1);
        }
        let rows = self
            .view
            .columns
            .get(self.focused_column)
            .map_or(0, |c| c.rows().len());
        self.selected_task = self.selected_task.min(rows.saturating_sub(1));
    }

    fn focus_task(&mut self, id: TaskId) {
        if let Some((status, idx)) = self.view.locate(id) {
            if let Some(col) = self.column_index(status) {
                self.focused_column = col;
                self.selected_task = idx;
            }
        }
    }

    pub fn open_create(&mut self) {
        let mut form = TaskForm::blank(&self.session.active_board);
        if let Some(status) = self.view.columns.get(self.focused_column).map(|c| c.status()) {
            form.status = status;
        }
        self.modal = Modal::Create(form);
    }

    pub fn open_edit(&mut self, task_id: TaskId) {
        match self.store.get_task(task_id) {
            Some(task) => {
                self.modal = Modal::Edit {
                    task_id,
                    form: TaskForm::from_task(&task),
                }
            }
            None => warn!(task_id, "clicked task no longer exists"),
        }
    }

    pub fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key(key),
            Event::Mouse(mouse) => self.handle_mouse(mouse),
            _ => {}
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        self.notification = None;
        if self.modal.is_open() {
            let action = self.modal.handle_key(key);
            self.dispatch_modal(action);
            return;
        }
        if let Some(action) = map_key(key) {
            self.handle_action(action);
        }
    }

    pub fn handle_mouse(&mut self, mouse: MouseEvent) {
        if mouse.kind != MouseEventKind::Down(MouseButton::Left) {
            return;
        }
        let pos = Position::new(mouse.column, mouse.row);
        if self.modal.is_open() {
            if !self.hit_map.inside_modal(pos) {
                self.dispatch_modal(ModalAction::Cancel);
            } else if let Some(button) = self.hit_map.button_at(pos) {
                let action = self.modal.activate(button);
                self.dispatch_modal(action);
            }
            return;
        }
        if let Some(id) = self.hit_map.row_at(pos) {
            self.focus_task(id);
            self.open_edit(id);
        } else if let Some(board) = self.hit_map.board_at(pos).map(str::to_string) {
            self.select_board(&board);
        }
    }

    pub fn handle_action(&mut self, action: Action) {
        match action {
            Action::Quit => self.should_quit = true,
            Action::NewTask => self.open_create(),
            Action::EditSelected => {
                if let Some(id) = self.selected_task_id() {
                    self.open_edit(id);
                }
            }
            Action::FocusPrevColumn => {
                self.focused_column = self.focused_column.saturating_sub(1);
                self.clamp_selection();
            }
            Action::FocusNextColumn => {
                self.focused_column += 1;
                self.clamp_selection();
            }
            Action::SelectPrevTask => self.selected_task = self.selected_task.saturating_sub(1),
            Action::SelectNextTask => {
                self.selected_task += 1;
                self.clamp_selection();
            }
            Action::PrevBoard | Action::NextBoard => {
                let boards = derive_boards(&self.store.list_tasks());
                if let Some(name) = self.session.cycle(&boards, action == Action::NextBoard) {
                    self.select_board(&name);
                }
            }
            Action::ToggleSidebar => {
                let show = !self.prefs.show_sidebar;
                if let Err(err) = self.prefs.toggle_sidebar(show, self.store.kv_mut()) {
                    self.storage_failed(err);
                }
            }
            Action::ToggleTheme => {
                if let Err(err) = self.prefs.toggle_theme(self.store.kv_mut()) {
                    self.storage_failed(err);
                }
            }
        }
    }

    /// Act on the outcome of a modal key press. Anything that ends the
    /// session closes the modal before touching the store.
    pub fn dispatch_modal(&mut self, action: ModalAction) {
        if action.closes() {
            self.modal.close();
        }
        match action {
            ModalAction::None => {}
            ModalAction::Invalid(msg) => self.notify_error(msg),
            ModalAction::Cancel => debug!("modal cancelled"),
            ModalAction::Create(draft) => match self.store.create_task(draft) {
                Ok(task) => {
                    if task.board == self.session.active_board {
                        add_task_to_ui(&mut self.view, &task);
                    }
                    self.refresh();
                    self.focus_task(task.id);
                    self.notify(format!("Created \"{}\"", task.title));
                }
                Err(err) => self.task_failed(err),
            },
            ModalAction::Save { task_id, mut patch } => {
                if self.session.has_active() {
                    patch.board = Some(self.session.active_board.clone());
                }
                match self.store.patch_task(task_id, patch) {
                    Ok(()) => {
                        self.refresh();
                        self.focus_task(task_id);
                    }
                    Err(err) => self.task_failed(err),
                }
            }
            ModalAction::Delete(task_id) => match self.store.delete_task(task_id) {
                Ok(()) => self.refresh(),
                Err(err) => self.task_failed(err),
            },
        }
    }

    fn task_failed(&mut self, err: TaskError) {
        match err {
            TaskError::NotFound(id) => error!(id, "task not found, change dropped"),
            TaskError::Storage(err) => self.storage_failed(err),
        }
        self.refresh();
    }

    fn storage_failed(&mut self, err: StorageError) {
        error!(error = %err, "storage write failed");
        self.notify_error(format!("Could not save: {err}"));
    }

    /// Column index of `status` in the current view.
    pub fn column_index(&self, status: Status) -> Option<usize> {
        self.view.columns.iter().position(|c| c.status() == status)
    }
}

pub fn run<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    app.refresh();
    while !app.should_quit {
        let mut hits = HitMap::default();
        terminal.draw(|f| hits = ui::draw(f, app))?;
        app.hit_map = hits;
        app.handle_event(event::read()?);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crossterm::event::{KeyCode, KeyModifiers};
    use ratatui::backend::TestBackend;

    use super::*;
    use crate::bootstrap::initialize_data;
    use crate::modal::FormField;
    use crate::storage::{keys, KeyValueStore, MemoryStore};
    use crate::task::{Task, TaskDraft};

    fn task(id: TaskId, title: &str, status: Status, board: &str) -> Task {
        Task {
            id,
            title: title.into(),
            description: String::new(),
            status,
            board: board.into(),
        }
    }

    fn seeded_app(seed: &[Task]) -> App {
        let mut store = TaskStore::new(Box::new(MemoryStore::new()));
        initialize_data(&mut store, seed).unwrap();
        let mut app = App::new(store);
        app.refresh();
        app
    }

    fn scenario_seed() -> Vec<Task> {
        vec![
            task(1, "plan", Status::Todo, "A"),
            task(2, "build", Status::Doing, "A"),
            task(3, "market", Status::Todo, "B"),
        ]
    }

    fn titles(app: &App, status: Status) -> Vec<String> {
        app.view
            .column(status)
            .unwrap()
            .rows()
            .iter()
            .map(|r| r.title.clone())
            .collect()
    }

    fn visible_count(app: &App) -> usize {
        app.view.columns.iter().map(|c| c.rows().len()).sum()
    }

    fn press(app: &mut App, code: KeyCode) {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    #[test]
    fn test_seed_then_default_board() {
        let app = seeded_app(&scenario_seed());
        let boards: Vec<_> = app.view.board_controls.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(boards, vec!["A", "B"]);
        assert_eq!(app.session.active_board, "A");
        assert_eq!(app.view.active_control(), Some(0));
        assert_eq!(visible_count(&app), 2);
        assert!(app.prefs.show_sidebar);
    }

    #[test]
    fn test_persisted_active_board_restored() {
        let mut kv = MemoryStore::new();
        kv.set(keys::ACTIVE_BOARD, "\"B\"".into()).unwrap();
        let mut store = TaskStore::new(Box::new(kv));
        initialize_data(&mut store, &scenario_seed()).unwrap();
        let mut app = App::new(store);
        app.refresh();
        assert_eq!(app.session.active_board, "B");
        assert_eq!(titles(&app, Status::Todo), vec!["market"]);
    }

    #[test]
    fn test_stale_active_board_shows_empty_columns() {
        let mut kv = MemoryStore::new();
        kv.set(keys::ACTIVE_BOARD, "\"Gone\"".into()).unwrap();
        let mut store = TaskStore::new(Box::new(kv));
        initialize_data(&mut store, &scenario_seed()).unwrap();
        let mut app = App::new(store);
        app.refresh();
        assert_eq!(app.view.header, "Gone");
        assert_eq!(visible_count(&app), 0);
        assert_eq!(app.view.active_control(), None);
    }

    #[test]
    fn test_empty_store_skips_render() {
        let mut app = seeded_app(&[]);
        app.refresh();
        assert_eq!(app.session.active_board, "");
        assert!(app.view.board_controls.is_empty());
        assert!(app.view.header.is_empty());
    }

    #[test]
    fn test_create_task_lands_in_one_column() {
        let mut app = seeded_app(&scenario_seed());
        app.focused_column = app.column_index(Status::Doing).unwrap();
        press(&mut app, KeyCode::Char('n'));
        assert!(matches!(app.modal, Modal::Create(_)));
        type_text(&mut app, "review");
        press(&mut app, KeyCode::Enter);

        assert!(!app.modal.is_open());
        assert_eq!(titles(&app, Status::Doing), vec!["build", "review"]);
        assert!(!titles(&app, Status::Todo).contains(&"review".to_string()));
        assert!(!titles(&app, Status::Done).contains(&"review".to_string()));
        let created = app.store.list_tasks().into_iter().last().unwrap();
        assert_eq!(created.board, "A");
        assert_eq!(created.status, Status::Doing);
        assert_eq!(app.selected_task_id(), Some(created.id));
    }

    #[test]
    fn test_create_with_empty_title_keeps_modal_open() {
        let mut app = seeded_app(&scenario_seed());
        press(&mut app, KeyCode::Char('n'));
        press(&mut app, KeyCode::Enter);
        assert!(app.modal.is_open());
        assert_eq!(
            app.notification.as_ref().map(|n| n.level),
            Some(NotificationLevel::Error)
        );
        assert_eq!(app.store.list_tasks().len(), 3);
    }

    #[test]
    fn test_edit_status_moves_task_between_columns() {
        let mut app = seeded_app(&scenario_seed());
        assert_eq!(app.selected_task_id(), Some(1));
        press(&mut app, KeyCode::Enter);
        assert!(matches!(app.modal, Modal::Edit { task_id: 1, .. }));
        assert_eq!(app.modal.form().unwrap().title.value(), "plan");

        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Left);
        press(&mut app, KeyCode::Enter);

        assert!(!app.modal.is_open());
        assert!(titles(&app, Status::Todo).is_empty());
        assert_eq!(titles(&app, Status::Done), vec!["plan"]);
        let stored = app.store.get_task(1).unwrap();
        assert_eq!(stored.status, Status::Done);
        assert_eq!(stored.id, 1);
    }

    #[test]
    fn test_delete_from_edit_modal_removes_row() {
        let mut app = seeded_app(&scenario_seed());
        press(&mut app, KeyCode::Enter);
        app.handle_key(KeyEvent::new(KeyCode::Char('d'), KeyModifiers::CONTROL));
        assert!(!app.modal.is_open());
        assert_eq!(app.view.locate(1), None);
        assert_eq!(app.store.list_tasks().len(), 2);
    }

    #[test]
    fn test_cancel_persists_nothing() {
        let mut app = seeded_app(&scenario_seed());
        press(&mut app, KeyCode::Enter);
        type_text(&mut app, " changed");
        press(&mut app, KeyCode::Esc);
        assert!(!app.modal.is_open());
        assert_eq!(app.store.get_task(1).unwrap().title, "plan");
    }

    #[test]
    fn test_save_of_vanished_task_closes_and_leaves_store() {
        let mut app = seeded_app(&scenario_seed());
        press(&mut app, KeyCode::Enter);
        app.store.delete_task(1).unwrap();
        press(&mut app, KeyCode::Enter);
        assert!(!app.modal.is_open());
        assert_eq!(app.store.list_tasks().len(), 2);
        assert_eq!(app.view.locate(1), None);
    }

    #[test]
    fn test_storage_failure_is_reported_and_modal_closed() {
        let seed = scenario_seed();
        let size = serde_json::to_string(&seed).unwrap().len() + keys::TASKS.len();
        let mut store = TaskStore::new(Box::new(MemoryStore::with_quota(size + 40)));
        initialize_data(&mut store, &seed).unwrap();
        let mut app = App::new(store);
        app.refresh();

        app.dispatch_modal(ModalAction::Create(TaskDraft {
            title: "a very long title that will not fit".into(),
            description: "x".repeat(100),
            status: Status::Todo,
            board: "A".into(),
        }));

        assert!(!app.modal.is_open());
        let note = app.notification.clone().unwrap();
        assert_eq!(note.level, NotificationLevel::Error);
        assert!(note.message.starts_with("Could not save"));
        assert_eq!(app.store.list_tasks().len(), 3);
        assert_eq!(visible_count(&app), 2);

        // the next interaction still works
        press(&mut app, KeyCode::Char(']'));
        assert_eq!(app.session.active_board, "B");
    }

    #[test]
    fn test_create_on_undecodable_collection_reports_and_keeps_data() {
        let raw = r#"[{"id":1,"title":"keep me","status":"blocked","board":"A"}]"#;
        let mut kv = MemoryStore::new();
        kv.set(keys::TASKS, raw.into()).unwrap();
        let mut app = App::new(TaskStore::new(Box::new(kv)));
        app.refresh();

        app.dispatch_modal(ModalAction::Create(TaskDraft {
            title: "new".into(),
            description: String::new(),
            status: Status::Todo,
            board: "A".into(),
        }));

        assert!(!app.modal.is_open());
        let note = app.notification.clone().unwrap();
        assert_eq!(note.level, NotificationLevel::Error);
        assert!(note.message.starts_with("Could not save"));
        assert_eq!(app.store.kv().get(keys::TASKS).as_deref(), Some(raw));
    }

    #[test]
    fn test_board_cycle_persists_selection() {
        let mut app = seeded_app(&scenario_seed());
        press(&mut app, KeyCode::Char(']'));
        assert_eq!(app.session.active_board, "B");
        assert_eq!(app.store.kv().get(keys::ACTIVE_BOARD).as_deref(), Some("\"B\""));
        assert_eq!(app.view.active_control(), Some(1));
        press(&mut app, KeyCode::Char(']'));
        assert_eq!(app.session.active_board, "A");
    }

    #[test]
    fn test_toggle_prefs_persist() {
        let mut app = seeded_app(&scenario_seed());
        press(&mut app, KeyCode::Char('s'));
        press(&mut app, KeyCode::Char('t'));
        assert!(!app.prefs.show_sidebar);
        assert!(app.prefs.light_theme);
        assert_eq!(app.store.kv().get(keys::SHOW_SIDEBAR).as_deref(), Some("false"));
        assert_eq!(app.store.kv().get(keys::LIGHT_THEME).as_deref(), Some("enabled"));
    }

    #[test]
    fn test_refresh_is_idempotent() {
        let mut app = seeded_app(&scenario_seed());
        let before = app.view.columns.clone();
        app.refresh();
        assert_eq!(app.view.columns, before);
    }

    fn draw(app: &mut App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 20)).unwrap();
        let mut hits = HitMap::default();
        terminal.draw(|f| hits = ui::draw(f, app)).unwrap();
        app.hit_map = hits;
        let buffer = terminal.backend().buffer().clone();
        buffer
            .content()
            .chunks(buffer.area.width as usize)
            .map(|line| line.iter().map(|c| c.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn click(app: &mut App, pos: Position) {
        app.handle_mouse(MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: pos.x,
            row: pos.y,
            modifiers: KeyModifiers::NONE,
        });
    }

    #[test]
    fn test_draw_shows_board_and_tasks() {
        let mut app = seeded_app(&scenario_seed());
        let screen = draw(&mut app);
        assert!(screen.contains("ALL BOARDS (2)"));
        assert!(screen.contains("plan"));
        assert!(screen.contains("build"));
        assert!(!screen.contains("market"));
        assert!(screen.contains("TODO"));
        assert!(screen.contains("DONE"));
        assert_eq!(app.hit_map.rows.len(), 2);
    }

    #[test]
    fn test_click_row_opens_edit_and_outside_click_cancels() {
        let mut app = seeded_app(&scenario_seed());
        draw(&mut app);
        let (rect, id) = app.hit_map.rows.iter().find(|(_, id)| *id == 2).copied().unwrap();
        click(&mut app, Position::new(rect.x, rect.y));
        assert!(matches!(app.modal, Modal::Edit { task_id, .. } if task_id == id));

        let screen = draw(&mut app);
        assert!(screen.contains("Edit Task"));
        assert!(app.hit_map.buttons.iter().any(|(_, f)| *f == FormField::Delete));
        click(&mut app, Position::new(0, 0));
        assert!(!app.modal.is_open());
        assert!(app.store.get_task(2).is_some());
    }

    #[test]
    fn test_click_board_control_selects_board() {
        let mut app = seeded_app(&scenario_seed());
        draw(&mut app);
        let (rect, _) = app.hit_map.boards.iter().find(|(_, b)| b == "B").cloned().unwrap();
        click(&mut app, Position::new(rect.x, rect.y));
        assert_eq!(app.session.active_board, "B");
        assert_eq!(titles(&app, Status::Todo), vec!["market"]);
    }

    #[test]
    fn test_click_delete_button() {
        let mut app = seeded_app(&scenario_seed());
        draw(&mut app);
        let (rect, _) = app.hit_map.rows[0];
        click(&mut app, Position::new(rect.x, rect.y));
        draw(&mut app);
        let (button, _) = app
            .hit_map
            .buttons
            .iter()
            .find(|(_, f)| *f == FormField::Delete)
            .copied()
            .unwrap();
        click(&mut app, Position::new(button.x, button.y));
        assert!(!app.modal.is_open());
        assert_eq!(app.store.list_tasks().len(), 2);
    }
}
