//! Chat panel widget for the TUI.
//!
//! Displays the conversation history, newest at the bottom.

use crate::tui::app::ChatMessage;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};

/// Chat panel widget.
pub struct ChatPanel<'a> {
    messages: &'a [ChatMessage],
    /// Lines scrolled up from the bottom.
    scroll: usize,
    focused: bool,
    /// Shown as the last line while a turn runs.
    status: Option<&'a str>,
}

impl<'a> ChatPanel<'a> {
    /// Creates a new chat panel widget.
    pub fn new(
        messages: &'a [ChatMessage],
        scroll: usize,
        focused: bool,
        status: Option<&'a str>,
    ) -> Self {
        Self {
            messages,
            scroll,
            focused,
            status,
        }
    }
}

fn label_style(message: &ChatMessage) -> Style {
    let color = match message {
        ChatMessage::User(_) => Color::Cyan,
        ChatMessage::Assistant(_) => Color::Green,
        ChatMessage::Error(_) => Color::Red,
        ChatMessage::System(_) => Color::Yellow,
    };
    Style::default().fg(color).add_modifier(Modifier::BOLD)
}

/// Builds the display lines for a list of messages.
pub fn message_lines<'a>(messages: &'a [ChatMessage], status: Option<&'a str>) -> Vec<Line<'a>> {
    let mut lines = Vec::new();

    for message in messages {
        lines.push(Line::from(Span::styled(
            format!("{}:", message.type_label()),
            label_style(message),
        )));
        let text_style = match message {
            ChatMessage::Error(_) => Style::default().fg(Color::Red),
            ChatMessage::System(_) => Style::default().fg(Color::Gray),
            _ => Style::default(),
        };
        for text_line in message.text().lines() {
            lines.push(Line::from(Span::styled(text_line, text_style)));
        }
        lines.push(Line::from(""));
    }

    if let Some(status) = status {
        lines.push(Line::from(Span::styled(
            status,
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        )));
    }

    lines
}

/// Number of rows `lines` take when wrapped to `width` columns.
pub fn wrapped_height(lines: &[Line<'_>], width: usize) -> usize {
    if width == 0 {
        return lines.len();
    }
    lines
        .iter()
        .map(|line| line.width().div_ceil(width).max(1))
        .sum()
}

impl Widget for ChatPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let border_style = if self.focused {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(" Chat ");

        let inner = block.inner(area);
        let lines = message_lines(self.messages, self.status);

        let total = wrapped_height(&lines, inner.width as usize);
        let max_offset = total.saturating_sub(inner.height as usize);
        let offset = max_offset.saturating_sub(self.scroll);

        Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: false })
            .scroll((offset.min(u16::MAX as usize) as u16, 0))
            .render(area, buf);
    }
}
