//! Input widget for the TUI.
//!
//! Provides the single-line question field.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

/// Placeholder shown in an empty input.
const PLACEHOLDER: &str = "Chat with your database";

/// Calculates the scroll offset needed to keep the cursor visible.
///
/// Returns the number of characters to skip from the start of the text.
pub fn calculate_scroll_offset(cursor: usize, available_width: usize) -> usize {
    cursor.saturating_sub(available_width)
}

/// Input bar widget.
pub struct InputBar<'a> {
    text: &'a str,
    cursor: usize,
    focused: bool,
    /// False while a turn runs; the text is dimmed.
    enabled: bool,
}

impl<'a> InputBar<'a> {
    /// Creates a new input bar widget.
    pub fn new(text: &'a str, cursor: usize, focused: bool, enabled: bool) -> Self {
        Self {
            text,
            cursor,
            focused,
            enabled,
        }
    }
}

impl Widget for InputBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let border_style = if self.focused {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(" Question ");

        let prompt_style = Style::default()
            .fg(Color::Green)
            .add_modifier(Modifier::BOLD);

        // Border left (1) + prompt "> " (2) + border right (1) + cursor space (1) = 5
        let available_width = area.width.saturating_sub(5) as usize;
        let scroll_offset = calculate_scroll_offset(self.cursor, available_width);

        let text_span = if self.text.is_empty() {
            Span::styled(PLACEHOLDER, Style::default().fg(Color::DarkGray))
        } else {
            let visible: String = self.text.chars().skip(scroll_offset).collect();
            let style = if self.enabled {
                Style::default()
            } else {
                Style::default().fg(Color::DarkGray)
            };
            Span::styled(visible, style)
        };

        let line = Line::from(vec![Span::styled("> ", prompt_style), text_span]);

        Paragraph::new(line).block(block).render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_bar_creation() {
        let input = InputBar::new("hello", 5, true, true);
        assert_eq!(input.text, "hello");
        assert_eq!(input.cursor, 5);
        assert!(input.focused);
    }

    #[test]
    fn test_scroll_offset_cursor_within_width() {
        assert_eq!(calculate_scroll_offset(5, 20), 0);
        assert_eq!(calculate_scroll_offset(20, 20), 0);
    }

    #[test]
    fn test_scroll_offset_cursor_beyond_width() {
        assert_eq!(calculate_scroll_offset(25, 20), 5);
        assert_eq!(calculate_scroll_offset(50, 20), 30);
    }

    #[test]
    fn test_scroll_offset_edge_cases() {
        assert_eq!(calculate_scroll_offset(0, 20), 0);
        // Width is 0 -> cursor position becomes offset
        assert_eq!(calculate_scroll_offset(5, 0), 5);
    }
}
