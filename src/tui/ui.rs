//! UI rendering for the TUI.
//!
//! Defines the layout and renders all UI components.

use super::app::{App, Focus};
use super::widgets::{chat, header, input, sidebar};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    Frame,
};

/// Renders the entire UI.
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    // Main layout: header, content, input
    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Header
            Constraint::Min(3),    // Content (chat + sidebar)
            Constraint::Length(3), // Input
        ])
        .split(area);

    let header_area = main_layout[0];
    let content_area = main_layout[1];
    let input_area = main_layout[2];

    // Content layout: chat (70%) and sidebar (30%)
    let content_layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
        .split(content_area);

    let chat_area = content_layout[0];
    let sidebar_area = content_layout[1];

    render_header(frame, header_area, app);
    render_chat(frame, chat_area, app);
    render_sidebar(frame, sidebar_area, app);
    render_input(frame, input_area, app);
}

fn busy_label(app: &App) -> Option<&'static str> {
    app.is_busy().then(|| app.turn_state.label())
}

fn render_header(frame: &mut Frame, area: Rect, app: &App) {
    let widget = header::Header::new(app.connection_info.as_deref(), busy_label(app));
    frame.render_widget(widget, area);
}

fn render_chat(frame: &mut Frame, area: Rect, app: &App) {
    let focused = app.focus == Focus::Chat;
    let widget = chat::ChatPanel::new(&app.messages, app.chat_scroll, focused, busy_label(app));
    frame.render_widget(widget, area);
}

/// Renders the side panel and places the cursor in the selected field.
fn render_sidebar(frame: &mut Frame, area: Rect, app: &App) {
    let focused = app.focus == Focus::Sidebar;
    let widget = sidebar::Sidebar::new(&app.form, app.connect_status.as_ref(), focused);
    frame.render_widget(widget, area);

    if focused {
        let field = app.form.selected_field();
        let cursor_x = area.x + 1 + sidebar::VALUE_INDENT + field.input.cursor as u16;
        let cursor_y = area.y + 1 + app.form.selected as u16 * sidebar::FIELD_HEIGHT + 1;
        if cursor_x < area.right() && cursor_y < area.bottom() {
            frame.set_cursor_position((cursor_x, cursor_y));
        }
    }
}

/// Renders the input bar.
fn render_input(frame: &mut Frame, area: Rect, app: &App) {
    let focused = app.focus == Focus::Input;
    let widget = input::InputBar::new(&app.input.text, app.input.cursor, focused, !app.is_busy());
    frame.render_widget(widget, area);

    // Position cursor in input field when focused
    if focused {
        let available_width = area.width.saturating_sub(5) as usize;
        let offset = input::calculate_scroll_offset(app.input.cursor, available_width);
        // Account for border (1) and prompt "> " (2)
        let cursor_x = area.x + 1 + 2 + (app.input.cursor - offset) as u16;
        let cursor_y = area.y + 1;
        frame.set_cursor_position((cursor_x, cursor_y));
    }
}
