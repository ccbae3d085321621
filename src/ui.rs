use ratatui::{
    layout::{Constraint, Direction, Layout, Position, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::app::{App, NotificationLevel};
use crate::input::HINTS;
use crate::modal::{FormField, Modal, TaskForm};
use crate::task::TaskId;
use crate::theme::Theme;
use crate::view::ColumnView;

const SIDEBAR_WIDTH: u16 = 26;

/// Screen regions from the last draw, used to resolve mouse clicks.
#[derive(Debug, Clone, Default)]
pub struct HitMap {
    pub rows: Vec<(Rect, TaskId)>,
    pub boards: Vec<(Rect, String)>,
    pub modal: Option<Rect>,
    pub buttons: Vec<(Rect, FormField)>,
}

impl HitMap {
    pub fn row_at(&self, pos: Position) -> Option<TaskId> {
        self.rows.iter().find(|(r, _)| r.contains(pos)).map(|(_, id)| *id)
    }

    pub fn board_at(&self, pos: Position) -> Option<&str> {
        self.boards
            .iter()
            .find(|(r, _)| r.contains(pos))
            .map(|(_, name)| name.as_str())
    }

    pub fn button_at(&self, pos: Position) -> Option<FormField> {
        self.buttons.iter().find(|(r, _)| r.contains(pos)).map(|(_, f)| *f)
    }

    pub fn inside_modal(&self, pos: Position) -> bool {
        self.modal.is_some_and(|r| r.contains(pos))
    }
}

/// Create a centered rect within `area` using percentage-based sizing with minimums.
pub fn centered_rect(area: Rect, w_pct: u16, h_pct: u16, min_w: u16, min_h: u16) -> Rect {
    let width = percent_of(area.width, w_pct).max(min_w).min(area.width);
    let height = percent_of(area.height, h_pct).max(min_h).min(area.height);
    let x = area.x + (area.width - width) / 2;
    let y = area.y + (area.height - height) / 2;
    Rect::new(x, y, width, height)
}

fn percent_of(len: u16, pct: u16) -> u16 {
    u16::try_from(u32::from(len) * u32::from(pct) / 100).unwrap_or(u16::MAX)
}

pub fn draw(f: &mut Frame, app: &App) -> HitMap {
    let theme = Theme::for_prefs(app.prefs.light_theme);
    let mut hits = HitMap::default();

    f.render_widget(Block::default().style(theme.base()), f.area());

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(1), Constraint::Length(1)])
        .split(f.area());

    draw_header(f, chunks[0], app, &theme);

    let columns_area = if app.prefs.show_sidebar {
        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(1)])
            .split(chunks[1]);
        draw_sidebar(f, body[0], app, &theme, &mut hits);
        body[1]
    } else {
        chunks[1]
    };

    draw_columns(f, columns_area, app, &theme, &mut hits);
    draw_status_line(f, chunks[2], app, &theme);

    if app.modal.is_open() {
        draw_modal(f, chunks[1], &app.modal, &theme, &mut hits);
    }
    hits
}

fn draw_header(f: &mut Frame, area: Rect, app: &App, theme: &Theme) {
    let name = if app.view.header.is_empty() {
        Span::styled("No boards", theme.dim())
    } else {
        Span::styled(
            app.view.header.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )
    };
    let header = Paragraph::new(Line::from(vec![Span::raw(" "), name])).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(theme.border(false))
            .title(" kanban "),
    );
    f.render_widget(header, area);
}

fn draw_sidebar(f: &mut Frame, area: Rect, app: &App, theme: &Theme, hits: &mut HitMap) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.border(false))
        .title(format!(" ALL BOARDS ({}) ", app.view.board_controls.len()));
    let inner = block.inner(area);
    f.render_widget(block, area);

    for (i, control) in app.view.board_controls.iter().enumerate() {
        if i >= inner.height as usize {
            break;
        }
        let line_area = Rect::new(inner.x, inner.y + i as u16, inner.width, 1);
        let line = if control.active {
            Line::from(vec![
                Span::styled("▶ ", Style::default().fg(theme.active_board)),
                Span::styled(
                    control.label.clone(),
                    Style::default()
                        .fg(theme.active_board)
                        .add_modifier(Modifier::BOLD),
                ),
            ])
        } else {
            Line::from(vec![Span::raw("  "), Span::raw(control.label.clone())])
        };
        f.render_widget(Paragraph::new(line), line_area);
        hits.boards.push((line_area, control.label.clone()));
    }
}

fn draw_columns(f: &mut Frame, area: Rect, app: &App, theme: &Theme, hits: &mut HitMap) {
    let count = app.view.columns.len().max(1) as u32;
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints((0..count).map(|_| Constraint::Ratio(1, count)))
        .split(area);

    for (i, column) in app.view.columns.iter().enumerate() {
        let focused = app.focused_column == i && !app.modal.is_open();
        let selected = focused.then_some(app.selected_task);
        draw_column(f, chunks[i], column, selected, focused, theme, hits);
    }
}

fn draw_column(
    f: &mut Frame,
    area: Rect,
    column: &ColumnView,
    selected: Option<usize>,
    focused: bool,
    theme: &Theme,
    hits: &mut HitMap,
) {
    let rows = column.rows();
    let title = Line::from(vec![
        Span::raw(" "),
        Span::styled("● ", Style::default().fg(Theme::dot(column.status()))),
        Span::styled(
            column.header.label.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!(" ({}) ", rows.len()), theme.dim()),
    ]);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(if focused { BorderType::Thick } else { BorderType::Plain })
        .border_style(theme.border(focused))
        .title(title);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let height = inner.height as usize;
    if height == 0 {
        return;
    }
    let offset = selected.map_or(0, |s| s.saturating_sub(height - 1));

    let visible = rows.iter().enumerate().skip(offset).take(height);
    for (line_idx, (row_idx, row)) in visible.enumerate() {
        let row_area = Rect::new(inner.x, inner.y + line_idx as u16, inner.width, 1);
        let style = if selected == Some(row_idx) {
            theme.selected()
        } else {
            Style::default()
        };
        f.render_widget(
            Paragraph::new(Line::from(Span::styled(format!(" {}", row.title), style))),
            row_area,
        );
        hits.rows.push((row_area, row.task_id));
    }
}

fn draw_status_line(f: &mut Frame, area: Rect, app: &App, theme: &Theme) {
    let line = match &app.notification {
        Some(n) if n.level == NotificationLevel::Error => {
            Line::from(Span::styled(n.message.clone(), Style::default().fg(theme.error)))
        }
        Some(n) => Line::from(Span::raw(n.message.clone())),
        None => Line::from(Span::styled(HINTS, theme.dim())),
    };
    f.render_widget(Paragraph::new(line), area);
}

fn draw_modal(f: &mut Frame, area: Rect, modal: &Modal, theme: &Theme, hits: &mut HitMap) {
    let Some(form) = modal.form() else {
        return;
    };
    let fields = modal.fields();
    let inputs: Vec<FormField> = fields
        .iter()
        .copied()
        .filter(|field| !field.is_button())
        .collect();
    let popup = centered_rect(area, 60, 40, 40, inputs.len() as u16 + 4);
    hits.modal = Some(popup);

    f.render_widget(Clear, popup);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(theme.border(true))
        .style(theme.base())
        .title(Span::styled(
            format!(" {} ", modal.title()),
            Style::default().add_modifier(Modifier::BOLD),
        ));
    let inner = block.inner(popup);
    f.render_widget(block, popup);

    let label_width = 13u16;
    for (i, field) in inputs.iter().enumerate() {
        if i as u16 >= inner.height {
            break;
        }
        let y = inner.y + i as u16;
        let focused = form.focus == *field;
        let label_style = if focused {
            Style::default().add_modifier(Modifier::BOLD)
        } else {
            theme.dim()
        };
        let (value, cursor) = field_value(form, *field);
        let line = Line::from(vec![
            Span::styled(format!(" {:<11} ", field.label()), label_style),
            Span::raw(value.clone()),
        ]);
        f.render_widget(Paragraph::new(line), Rect::new(inner.x, y, inner.width, 1));

        if focused {
            if let Some(cursor) = cursor {
                let before: String = value.chars().take(cursor).collect();
                let x = (inner.x + label_width + before.width() as u16)
                    .min(inner.x + inner.width.saturating_sub(1));
                f.set_cursor_position(Position::new(x, y));
            }
        }
    }

    let buttons_y = inner.y + inner.height.saturating_sub(1);
    let mut x = inner.x + 1;
    for field in fields.iter().filter(|field| field.is_button()) {
        let text = format!("[ {} ]", field.label());
        let width = text.width() as u16;
        if x + width > inner.x + inner.width {
            break;
        }
        let style = if form.focus == *field {
            theme.selected()
        } else {
            Style::default()
        };
        let rect = Rect::new(x, buttons_y, width, 1);
        f.render_widget(Paragraph::new(Span::styled(text, style)), rect);
        hits.buttons.push((rect, *field));
        x += width + 2;
    }
}

/// Display text of a field and, for text inputs, the cursor position.
fn field_value(form: &TaskForm, field: FormField) -> (String, Option<usize>) {
    match field {
        FormField::Title => (form.title.input.clone(), Some(form.title.cursor)),
        FormField::Description => (form.description.input.clone(), Some(form.description.cursor)),
        FormField::Board => (form.board.input.clone(), Some(form.board.cursor)),
        FormField::Status => (format!("◀ {} ▶", form.status.label()), None),
        _ => (String::new(), None),
    }
}
