//! Sidebar widget for the TUI.
//!
//! Displays the connection form and the result of the last Connect action.

use crate::tui::app::{ConnectForm, ConnectStatus};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};

/// Rows taken by each form field: label, then value.
pub const FIELD_HEIGHT: u16 = 2;

/// Columns before a field value: two for the selection marker.
pub const VALUE_INDENT: u16 = 2;

/// Sidebar widget with the connect form.
pub struct Sidebar<'a> {
    form: &'a ConnectForm,
    status: Option<&'a ConnectStatus>,
    focused: bool,
}

impl<'a> Sidebar<'a> {
    /// Creates a new sidebar widget.
    pub fn new(form: &'a ConnectForm, status: Option<&'a ConnectStatus>, focused: bool) -> Self {
        Self {
            form,
            status,
            focused,
        }
    }

    fn lines(&self) -> Vec<Line<'static>> {
        let mut lines = Vec::new();

        for (idx, field) in self.form.fields.iter().enumerate() {
            let selected = self.focused && idx == self.form.selected;
            let label_style = if selected {
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Gray)
            };
            let marker = if selected { "> " } else { "  " };

            lines.push(Line::from(Span::styled(field.label, label_style)));
            lines.push(Line::from(vec![
                Span::styled(marker, label_style),
                Span::raw(field.display_value()),
            ]));
        }

        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "[ Connect ]",
            Style::default()
                .fg(Color::Black)
                .bg(if self.focused {
                    Color::Cyan
                } else {
                    Color::Gray
                })
                .add_modifier(Modifier::BOLD),
        )));

        if let Some(status) = self.status {
            let color = match status {
                ConnectStatus::Connecting => Color::Yellow,
                ConnectStatus::Connected => Color::Green,
                ConnectStatus::Failed(_) => Color::Red,
            };
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                status.message().to_string(),
                Style::default().fg(color),
            )));
        }

        lines
    }
}

impl Widget for Sidebar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let border_style = if self.focused {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(" Connect to database ");

        Paragraph::new(self.lines())
            .block(block)
            .wrap(Wrap { trim: false })
            .render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConnectionConfig;

    fn render(sidebar: Sidebar<'_>) -> String {
        let area = Rect::new(0, 0, 40, 20);
        let mut buf = Buffer::empty(area);
        sidebar.render(area, &mut buf);
        (0..area.height)
            .map(|y| {
                (0..area.width)
                    .map(|x| buf[(x, y)].symbol().to_string())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_sidebar_masks_password() {
        let config = ConnectionConfig {
            password: "hunter2".to_string(),
            ..Default::default()
        };
        let form = ConnectForm::from_config(&config);

        let content = render(Sidebar::new(&form, None, false));

        assert!(content.contains("Password"));
        assert!(content.contains("•••••••"));
        assert!(!content.contains("hunter2"));
        assert!(content.contains("localhost"));
        assert!(content.contains("[ Connect ]"));
    }

    #[test]
    fn test_sidebar_shows_status() {
        let form = ConnectForm::from_config(&ConnectionConfig::default());
        let status = ConnectStatus::Failed("Connection error: refused".to_string());

        let content = render(Sidebar::new(&form, Some(&status), true));

        assert!(content.contains("Connection error: refused"));
        assert!(content.contains("> localhost"));
    }
}
