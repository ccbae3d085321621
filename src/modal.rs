use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::task::{Status, Task, TaskDraft, TaskId, TaskPatch};

/// Single-line text buffer with a cursor.
///
/// `cursor` is a **char index** (not byte index), always in `0..=char_count`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextBuffer {
    pub input: String,
    pub cursor: usize,
}

impl TextBuffer {
    pub fn new(input: String) -> Self {
        let cursor = input.chars().count();
        Self { input, cursor }
    }

    fn byte_offset(&self, char_idx: usize) -> usize {
        self.input
            .char_indices()
            .nth(char_idx)
            .map(|(i, _)| i)
            .unwrap_or(self.input.len())
    }

    pub fn insert(&mut self, c: char) {
        let byte_idx = self.byte_offset(self.cursor);
        self.input.insert(byte_idx, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            let byte_idx = self.byte_offset(self.cursor - 1);
            self.input.remove(byte_idx);
            self.cursor -= 1;
        }
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        if self.cursor < self.input.chars().count() {
            self.cursor += 1;
        }
    }

    pub fn home(&mut self) {
        self.cursor = 0;
    }

    pub fn end(&mut self) {
        self.cursor = self.input.chars().count();
    }

    pub fn value(&self) -> &str {
        &self.input
    }
}

/// Focusable parts of a task form, in Tab order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Title,
    Description,
    Status,
    Board,
    Submit,
    Delete,
    Cancel,
}

impl FormField {
    pub fn label(self) -> &'static str {
        match self {
            Self::Title => "Title",
            Self::Description => "Description",
            Self::Status => "Status",
            Self::Board => "Board",
            Self::Submit => "Save",
            Self::Delete => "Delete",
            Self::Cancel => "Cancel",
        }
    }

    pub fn is_button(self) -> bool {
        matches!(self, Self::Submit | Self::Delete | Self::Cancel)
    }
}

const CREATE_FIELDS: [FormField; 6] = [
    FormField::Title,
    FormField::Description,
    FormField::Status,
    FormField::Board,
    FormField::Submit,
    FormField::Cancel,
];

const EDIT_FIELDS: [FormField; 6] = [
    FormField::Title,
    FormField::Description,
    FormField::Status,
    FormField::Submit,
    FormField::Delete,
    FormField::Cancel,
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskForm {
    pub title: TextBuffer,
    pub description: TextBuffer,
    pub status: Status,
    pub board: TextBuffer,
    pub focus: FormField,
}

impl TaskForm {
    /// Blank form bound to `board`.
    pub fn blank(board: &str) -> Self {
        Self {
            title: TextBuffer::default(),
            description: TextBuffer::default(),
            status: Status::Todo,
            board: TextBuffer::new(board.to_string()),
            focus: FormField::Title,
        }
    }

    pub fn from_task(task: &Task) -> Self {
        Self {
            title: TextBuffer::new(task.title.clone()),
            description: TextBuffer::new(task.description.clone()),
            status: task.status,
            board: TextBuffer::new(task.board.clone()),
            focus: FormField::Title,
        }
    }

    fn focused_text(&mut self) -> Option<&mut TextBuffer> {
        match self.focus {
            FormField::Title => Some(&mut self.title),
            FormField::Description => Some(&mut self.description),
            FormField::Board => Some(&mut self.board),
            _ => None,
        }
    }

    /// Title and board after trimming; `Err` names the first missing field.
    fn required(&self) -> Result<(String, String), &'static str> {
        let title = self.title.value().trim();
        if title.is_empty() {
            return Err("Title is required");
        }
        let board = self.board.value().trim();
        if board.is_empty() {
            return Err("Board is required");
        }
        Ok((title.to_string(), board.to_string()))
    }
}

/// Which dialog is showing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Modal {
    #[default]
    Closed,
    Create(TaskForm),
    Edit { task_id: TaskId, form: TaskForm },
}

/// What a key press inside a modal asks the application to do. Every variant
/// other than `None` and `Invalid` ends the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModalAction {
    None,
    Invalid(&'static str),
    Create(TaskDraft),
    Save { task_id: TaskId, patch: TaskPatch },
    Delete(TaskId),
    Cancel,
}

impl ModalAction {
    pub fn closes(&self) -> bool {
        !matches!(self, Self::None | Self::Invalid(_))
    }
}

impl Modal {
    pub fn is_open(&self) -> bool {
        !matches!(self, Self::Closed)
    }

    pub fn form(&self) -> Option<&TaskForm> {
        match self {
            Self::Closed => None,
            Self::Create(form) | Self::Edit { form, .. } => Some(form),
        }
    }

    fn form_mut(&mut self) -> Option<&mut TaskForm> {
        match self {
            Self::Closed => None,
            Self::Create(form) | Self::Edit { form, .. } => Some(form),
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Closed => "",
            Self::Create(_) => "Add New Task",
            Self::Edit { .. } => "Edit Task",
        }
    }

    /// Tab order of the open form.
    pub fn fields(&self) -> &'static [FormField] {
        match self {
            Self::Closed => &[],
            Self::Create(_) => &CREATE_FIELDS,
            Self::Edit { .. } => &EDIT_FIELDS,
        }
    }

    /// Feed one key to the open form.
    pub fn handle_key(&mut self, key: KeyEvent) -> ModalAction {
        let fields = self.fields();
        let Some(form) = self.form_mut() else {
            return ModalAction::None;
        };

        match key.code {
            KeyCode::Esc => return ModalAction::Cancel,
            KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                return self.activate(FormField::Delete);
            }
            KeyCode::Tab | KeyCode::Down => form.focus = step(fields, form.focus, true),
            KeyCode::BackTab | KeyCode::Up => form.focus = step(fields, form.focus, false),
            KeyCode::Enter => {
                let target = if form.focus.is_button() {
                    form.focus
                } else {
                    FormField::Submit
                };
                return self.activate(target);
            }
            KeyCode::Left if form.focus == FormField::Status => form.status = form.status.prev(),
            KeyCode::Right if form.focus == FormField::Status => form.status = form.status.next(),
            KeyCode::Char(' ') if form.focus == FormField::Status => {
                form.status = form.status.next()
            }
            code => {
                if let Some(buf) = form.focused_text() {
                    match code {
                        KeyCode::Char(c) => buf.insert(c),
                        KeyCode::Backspace => buf.backspace(),
                        KeyCode::Left => buf.move_left(),
                        KeyCode::Right => buf.move_right(),
                        KeyCode::Home => buf.home(),
                        KeyCode::End => buf.end(),
                        _ => {}
                    }
                }
            }
        }
        ModalAction::None
    }

    /// Resolve a button press into an action.
    pub fn activate(&self, field: FormField) -> ModalAction {
        match (self, field) {
            (Self::Closed, _) => ModalAction::None,
            (_, FormField::Cancel) => ModalAction::Cancel,
            (Self::Create(form), FormField::Submit) => match form.required() {
                Ok((title, board)) => ModalAction::Create(TaskDraft {
                    title,
                    description: form.description.value().to_string(),
                    status: form.status,
                    board,
                }),
                Err(msg) => ModalAction::Invalid(msg),
            },
            (Self::Edit { task_id, form }, FormField::Submit) => {
                let title = form.title.value().trim();
                if title.is_empty() {
                    return ModalAction::Invalid("Title is required");
                }
                ModalAction::Save {
                    task_id: *task_id,
                    patch: TaskPatch {
                        title: Some(title.to_string()),
                        description: Some(form.description.value().to_string()),
                        status: Some(form.status),
                        board: None,
                    },
                }
            }
            (Self::Edit { task_id, .. }, FormField::Delete) => ModalAction::Delete(*task_id),
            _ => ModalAction::None,
        }
    }

    /// Close and hand back whatever was open.
    pub fn close(&mut self) -> Modal {
        std::mem::take(self)
    }
}

fn step(fields: &[FormField], current: FormField, forward: bool) -> FormField {
    let len = fields.len();
    let idx = fields.iter().position(|f| *f == current).unwrap_or(0);
    let next = if forward {
        (idx + 1) % len
    } else {
        (idx + len - 1) % len
    };
    fields[next]
}
