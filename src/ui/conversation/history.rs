//! Transcript display component

use crate::events::{Message, MessageKind, SourceDocument};
use crate::segment::{self, SegmentKind};
use crate::store::ConversationStore;
use crate::visibility::VisibilityController;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};

/// Renders the transcript bottom-aligned, `scroll` lines up from the end.
pub struct ConversationHistory<'a> {
    store: &'a ConversationStore,
    show_timestamps: bool,
    scroll: usize,
}

impl<'a> ConversationHistory<'a> {
    pub fn new(store: &'a ConversationStore, show_timestamps: bool) -> Self {
        Self {
            store,
            show_timestamps,
            scroll: 0,
        }
    }

    pub fn scroll(mut self, scroll: usize) -> Self {
        self.scroll = scroll;
        self
    }

    /// All transcript lines for the given content width
    pub fn lines(&self, width: u16) -> Vec<Line<'static>> {
        let mut lines = Vec::new();
        for message in self.store.messages() {
            lines.extend(self.render_message(message, width));
            lines.push(Line::default());
        }
        lines
    }

    fn render_message(&self, message: &Message, width: u16) -> Vec<Line<'static>> {
        let mut lines = Vec::new();
        let wrap_width = width.saturating_sub(2) as usize;

        let mut header = match message.id {
            Some(id) => format!("{} #{}", message.kind.display_name(), id),
            None => message.kind.display_name().to_string(),
        };
        if self.show_timestamps {
            header.push_str(&format!(" {}", message.timestamp.format("%H:%M:%S")));
        }
        lines.push(Line::from(vec![Span::styled(
            format!("{} {}", header, "─".repeat(20)),
            Style::default().fg(Color::DarkGray),
        )]));

        let mut code_index = 0;
        for segment in segment::segment(&message.text) {
            match segment.kind {
                SegmentKind::Prose => {
                    for text in wrap_text(&segment.content, wrap_width) {
                        lines.push(Line::from(vec![
                            Span::raw("  "),
                            Span::styled(text, content_style(message.kind)),
                        ]));
                    }
                }
                SegmentKind::Code => {
                    code_index += 1;
                    let label = match message.id {
                        Some(id) => format!("code {}  (/copy {} {})", code_index, id, code_index),
                        None => format!("code {}", code_index),
                    };
                    lines.extend(code_block(&label, &segment.content));
                }
            }
        }

        if let Some(id) = message.id {
            let docs = self.store.source_docs(id);
            let visible = VisibilityController::is_visible(self.store, id);
            let marker = if visible { "▾" } else { "▸" };
            lines.push(Line::from(vec![
                Span::raw("  "),
                Span::styled(
                    format!("{} {} source document(s)  (/sources {})", marker, docs.len(), id),
                    Style::default().fg(Color::Magenta),
                ),
            ]));

            if visible {
                for doc in docs {
                    lines.extend(source_document(doc));
                }
            }
        }

        lines
    }
}

/// A source document: its path, then its content as a single code block
fn source_document(doc: &SourceDocument) -> Vec<Line<'static>> {
    let mut lines = vec![Line::from(vec![
        Span::raw("    "),
        Span::styled(
            doc.source_path.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
    ])];
    lines.extend(code_block("", &doc.content));
    lines
}

fn code_block(label: &str, content: &str) -> Vec<Line<'static>> {
    let border = Style::default().fg(Color::DarkGray);
    let mut lines = vec![Line::from(vec![
        Span::raw("  "),
        Span::styled(format!("┌ {}", label), border),
    ])];
    for text in content.trim_matches('\n').lines() {
        lines.push(Line::from(vec![
            Span::raw("  "),
            Span::styled("│ ", border),
            Span::styled(text.to_string(), Style::default().fg(Color::Cyan)),
        ]));
    }
    lines.push(Line::from(vec![Span::raw("  "), Span::styled("└", border)]));
    lines
}

/// Get content style based on role
fn content_style(kind: MessageKind) -> Style {
    match kind {
        MessageKind::User => Style::default().fg(Color::Blue),
        MessageKind::Bot => Style::default().fg(Color::Green),
    }
}

/// Wrap text to fit within the given width, keeping paragraph breaks
fn wrap_text(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return text.lines().map(str::to_string).collect();
    }

    let mut lines = Vec::new();
    for paragraph in text.lines() {
        let mut current_line = String::new();
        for word in paragraph.split_whitespace() {
            let needed = current_line.chars().count() + word.chars().count() + 1;
            if current_line.is_empty() || needed <= width {
                if !current_line.is_empty() {
                    current_line.push(' ');
                }
                current_line.push_str(word);
            } else {
                lines.push(std::mem::take(&mut current_line));
                current_line.push_str(word);
            }
        }
        lines.push(current_line);
    }
    lines
}

impl Widget for ConversationHistory<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title("Conversation");

        let inner_area = block.inner(area);
        block.render(area, buf);

        if self.store.is_empty() {
            let welcome_lines = [
                Line::from(vec![Span::styled("Ask anything about the indexed sources.", Style::default().fg(Color::Green))]),
                Line::from(vec![Span::raw("")]),
                Line::from(vec![Span::styled("Type /help for commands.", Style::default().fg(Color::DarkGray))]),
            ];
            for (i, line) in welcome_lines.iter().enumerate() {
                if i < inner_area.height as usize {
                    buf.set_line(inner_area.x, inner_area.y + i as u16, line, inner_area.width);
                }
            }
            return;
        }

        let all_lines = self.lines(inner_area.width);
        let height = inner_area.height as usize;
        let end = all_lines.len().saturating_sub(self.scroll).max(height.min(all_lines.len()));
        let start = end.saturating_sub(height);

        for (i, line) in all_lines[start..end].iter().enumerate() {
            buf.set_line(inner_area.x, inner_area.y + i as u16, line, inner_area.width);
        }
    }
}
