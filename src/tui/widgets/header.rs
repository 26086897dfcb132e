//! Header widget for the TUI.
//!
//! Displays the application name, version, turn status, and connection info.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::Span,
    widgets::Widget,
};

/// Header bar widget.
pub struct Header<'a> {
    connection_info: Option<&'a str>,
    /// Turn status, shown centered while a turn runs.
    status: Option<&'a str>,
}

impl<'a> Header<'a> {
    /// Creates a new header widget.
    pub fn new(connection_info: Option<&'a str>, status: Option<&'a str>) -> Self {
        Self {
            connection_info,
            status,
        }
    }
}

impl Widget for Header<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let style = Style::default()
            .bg(Color::Blue)
            .fg(Color::White)
            .add_modifier(Modifier::BOLD);

        for x in area.left()..area.right() {
            buf[(x, area.y)].set_style(style);
        }

        let left_text = format!(" askdb v{}", env!("CARGO_PKG_VERSION"));
        let left_span = Span::styled(left_text, style);
        buf.set_span(area.x, area.y, &left_span, area.width);

        if let Some(status) = self.status {
            let status_style = style.fg(Color::Yellow);
            let status_width = status.chars().count() as u16;
            let status_x = area.x + (area.width.saturating_sub(status_width)) / 2;
            buf.set_string(status_x, area.y, status, status_style);
        }

        let (dot, dot_color, info) = match self.connection_info {
            Some(info) => ("●", Color::Green, format!(" [db: {info}] ")),
            None => ("○", Color::Gray, " not connected ".to_string()),
        };

        let right_width = info.chars().count() as u16 + 2;
        if right_width < area.width {
            let right_x = area.right().saturating_sub(right_width);
            buf.set_string(right_x, area.y, " ", style);
            buf.set_string(right_x + 1, area.y, dot, style.fg(dot_color));
            buf.set_string(right_x + 2, area.y, &info, style);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(buf: &Buffer, area: Rect) -> String {
        (area.left()..area.right())
            .map(|x| buf[(x, area.y)].symbol().to_string())
            .collect()
    }

    #[test]
    fn test_header_shows_connection() {
        let area = Rect::new(0, 0, 60, 1);
        let mut buf = Buffer::empty(area);
        Header::new(Some("rag_test @ localhost:3306"), None).render(area, &mut buf);

        let text = row(&buf, area);
        assert!(text.starts_with(" askdb v"));
        assert!(text.contains("[db: rag_test @ localhost:3306]"));
    }

    #[test]
    fn test_header_disconnected_with_status() {
        let area = Rect::new(0, 0, 60, 1);
        let mut buf = Buffer::empty(area);
        Header::new(None, Some("writing query...")).render(area, &mut buf);

        let text = row(&buf, area);
        assert!(text.contains("not connected"));
        assert!(text.contains("writing query..."));
    }
}
