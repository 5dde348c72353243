use crate::ui::conversation::commands::{command_entries, parse_slash_command, CommandEntry, ParsedCommand};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};

/// Result returned when the user interacts with the composer
#[derive(Debug, PartialEq)]
pub enum ComposerResult {
    Submitted(String),
    Command(ParsedCommand),
    None,
}

/// Input line with a `/` command palette
#[derive(Debug, Clone)]
pub struct ConversationComposer {
    content: String,
    /// Cursor position in chars, not bytes
    cursor: usize,
    placeholder: String,
    has_focus: bool,
    command_entries: Vec<CommandEntry>,
    filtered_commands: Vec<CommandEntry>,
    palette_open: bool,
    selected_command: Option<usize>,
}

impl ConversationComposer {
    pub fn new(placeholder: impl Into<String>) -> Self {
        Self {
            content: String::new(),
            cursor: 0,
            placeholder: placeholder.into(),
            has_focus: false,
            command_entries: command_entries(),
            filtered_commands: Vec::new(),
            palette_open: false,
            selected_command: None,
        }
    }

    /// Handle key input
    pub fn handle_key(&mut self, key: KeyEvent) -> ComposerResult {
        if key.kind != KeyEventKind::Press {
            return ComposerResult::None;
        }

        match key.code {
            KeyCode::Enter if key.modifiers.contains(KeyModifiers::SHIFT) => {
                self.insert_char('\n');
            }
            KeyCode::Enter => {
                let complete = parse_slash_command(&self.content).is_some();
                if self.palette_open && !complete && self.apply_selected_command() {
                    return ComposerResult::None;
                }
                return self.submit();
            }
            KeyCode::Up if self.palette_open => self.move_command_selection(-1),
            KeyCode::Down if self.palette_open => self.move_command_selection(1),
            KeyCode::Esc if self.palette_open => self.close_command_palette(),
            KeyCode::Tab if self.palette_open => {
                self.apply_selected_command();
            }
            KeyCode::Char(c) => {
                self.insert_char(c);
                self.sync_command_palette(Some(c));
            }
            KeyCode::Backspace => {
                if self.backspace() {
                    self.sync_command_palette(None);
                }
            }
            KeyCode::Delete => {
                if self.delete() {
                    self.sync_command_palette(None);
                }
            }
            KeyCode::Left => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Right => self.cursor = (self.cursor + 1).min(self.char_len()),
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = self.char_len(),
            _ => {}
        }

        ComposerResult::None
    }

    /// Insert pasted text at the cursor
    pub fn handle_paste(&mut self, text: &str) {
        for c in text.chars() {
            self.insert_char(c);
        }
        self.sync_command_palette(None);
    }

    /// Take the current input, clearing the composer. Blank input is kept.
    fn submit(&mut self) -> ComposerResult {
        if self.content.trim().is_empty() {
            return ComposerResult::None;
        }

        let content = std::mem::take(&mut self.content);
        self.cursor = 0;
        self.close_command_palette();

        match parse_slash_command(&content) {
            Some(command) => ComposerResult::Command(command),
            None => ComposerResult::Submitted(content),
        }
    }

    fn char_len(&self) -> usize {
        self.content.chars().count()
    }

    fn byte_index(&self, char_index: usize) -> usize {
        self.content
            .char_indices()
            .nth(char_index)
            .map(|(i, _)| i)
            .unwrap_or(self.content.len())
    }

    fn insert_char(&mut self, c: char) {
        let at = self.byte_index(self.cursor);
        self.content.insert(at, c);
        self.cursor += 1;
    }

    /// Delete character before cursor
    fn backspace(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        let at = self.byte_index(self.cursor);
        self.content.remove(at);
        true
    }

    /// Delete character at cursor
    fn delete(&mut self) -> bool {
        if self.cursor >= self.char_len() {
            return false;
        }
        let at = self.byte_index(self.cursor);
        self.content.remove(at);
        true
    }

    /// Open, refresh or close the palette after an edit. Typing whitespace
    /// after the command keyword closes it so arguments can be entered.
    fn sync_command_palette(&mut self, typed: Option<char>) {
        let is_command = self.content.starts_with('/');
        let in_keyword = is_command && !self.content.contains(char::is_whitespace);

        if !in_keyword || typed.is_some_and(char::is_whitespace) {
            self.close_command_palette();
        } else if self.palette_open {
            self.refresh_command_palette();
        } else {
            self.palette_open = true;
            self.selected_command = Some(0);
            self.refresh_command_palette();
        }
    }

    fn close_command_palette(&mut self) {
        self.palette_open = false;
        self.filtered_commands.clear();
        self.selected_command = None;
    }

    fn refresh_command_palette(&mut self) {
        let query = self.content.trim_start_matches('/').to_lowercase();
        self.filtered_commands = self
            .command_entries
            .iter()
            .filter(|entry| query.is_empty() || entry.keyword.starts_with(&query))
            .copied()
            .collect();

        self.selected_command = if self.filtered_commands.is_empty() {
            None
        } else {
            let index = self.selected_command.unwrap_or(0);
            Some(index.min(self.filtered_commands.len() - 1))
        };
    }

    fn move_command_selection(&mut self, delta: isize) {
        if self.filtered_commands.is_empty() {
            self.selected_command = None;
            return;
        }

        let len = self.filtered_commands.len() as isize;
        let current = self.selected_command.unwrap_or(0) as isize;
        self.selected_command = Some((current + delta).rem_euclid(len) as usize);
    }

    /// Complete the selected keyword into the input. Returns false when nothing is selected.
    fn apply_selected_command(&mut self) -> bool {
        let Some(entry) = self
            .selected_command
            .and_then(|index| self.filtered_commands.get(index))
            .copied()
        else {
            return false;
        };

        self.content = format!("/{} ", entry.keyword);
        self.cursor = self.char_len();
        self.close_command_palette();
        true
    }

    /// Set focus state
    pub fn set_focus(&mut self, has_focus: bool) {
        self.has_focus = has_focus;
    }

    #[cfg(test)]
    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn palette_open(&self) -> bool {
        self.palette_open
    }
}

impl Widget for &ConversationComposer {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title("Ask a question (Enter to send, / for commands)")
            .style(if self.has_focus {
                Style::default().fg(Color::Green)
            } else {
                Style::default().fg(Color::Gray)
            });

        let inner_area = block.inner(area);
        block.render(area, buf);

        if self.content.is_empty() {
            let placeholder_line = Line::from(vec![Span::styled(
                self.placeholder.as_str(),
                Style::default().fg(Color::DarkGray),
            )]);
            buf.set_line(inner_area.x, inner_area.y, &placeholder_line, inner_area.width);
        } else {
            let mut content = self.content.clone();
            if self.has_focus {
                content.insert(self.byte_index(self.cursor), '▌');
            }

            for (i, line_text) in content.split('\n').enumerate() {
                if i < inner_area.height as usize {
                    let line = Line::from(vec![Span::raw(line_text)]);
                    buf.set_line(inner_area.x, inner_area.y + i as u16, &line, inner_area.width);
                }
            }
        }

        if self.palette_open && !self.filtered_commands.is_empty() {
            let palette_height = (self.filtered_commands.len().min(5) + 2) as u16;
            let palette_area = Rect {
                x: area.x,
                y: area.y.saturating_sub(palette_height),
                width: area.width,
                height: palette_height.min(area.y),
            };

            let block = Block::default()
                .borders(Borders::ALL)
                .title("Commands")
                .style(Style::default().fg(Color::Blue));
            let inner = block.inner(palette_area);
            block.render(palette_area, buf);

            for (index, entry) in self.filtered_commands.iter().enumerate() {
                if index >= inner.height as usize {
                    break;
                }

                let style = if self.selected_command == Some(index) {
                    Style::default().fg(Color::Black).bg(Color::Cyan).add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(Color::White)
                };

                let line = Line::from(vec![
                    Span::styled(format!("/{}", entry.keyword), style),
                    Span::styled("  ", Style::default()),
                    Span::styled(entry.description, Style::default().fg(Color::Gray)),
                ]);
                buf.set_line(inner.x, inner.y + index as u16, &line, inner.width);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::conversation::commands::SlashCommand;

    fn press(composer: &mut ConversationComposer, code: KeyCode) -> ComposerResult {
        composer.handle_key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn type_str(composer: &mut ConversationComposer, text: &str) {
        for c in text.chars() {
            press(composer, KeyCode::Char(c));
        }
    }

    #[test]
    fn enter_submits_and_clears() {
        let mut composer = ConversationComposer::new("");
        type_str(&mut composer, "What is X?");

        assert_eq!(
            press(&mut composer, KeyCode::Enter),
            ComposerResult::Submitted("What is X?".to_string())
        );
        assert_eq!(composer.content(), "");
    }

    #[test]
    fn blank_input_is_not_submitted() {
        let mut composer = ConversationComposer::new("");
        type_str(&mut composer, "   ");
        assert_eq!(press(&mut composer, KeyCode::Enter), ComposerResult::None);
        assert_eq!(composer.content(), "   ");
    }

    #[test]
    fn shift_enter_inserts_newline() {
        let mut composer = ConversationComposer::new("");
        type_str(&mut composer, "a");
        composer.handle_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::SHIFT));
        type_str(&mut composer, "b");
        assert_eq!(composer.content(), "a\nb");
    }

    #[test]
    fn editing_handles_multibyte_characters() {
        let mut composer = ConversationComposer::new("");
        type_str(&mut composer, "héllo");
        press(&mut composer, KeyCode::Left);
        press(&mut composer, KeyCode::Left);
        press(&mut composer, KeyCode::Left);
        press(&mut composer, KeyCode::Backspace);
        assert_eq!(composer.content(), "hllo");
        press(&mut composer, KeyCode::Delete);
        assert_eq!(composer.content(), "hlo");
    }

    #[test]
    fn slash_opens_palette_and_tab_completes() {
        let mut composer = ConversationComposer::new("");
        type_str(&mut composer, "/so");
        assert!(composer.palette_open());

        press(&mut composer, KeyCode::Tab);
        assert!(!composer.palette_open());
        assert_eq!(composer.content(), "/sources ");

        type_str(&mut composer, "2");
        match press(&mut composer, KeyCode::Enter) {
            ComposerResult::Command(parsed) => {
                assert_eq!(parsed.command, SlashCommand::Sources);
                assert_eq!(parsed.argument(), Some("2"));
            }
            other => panic!("expected command, got {:?}", other),
        }
    }

    #[test]
    fn enter_on_a_complete_keyword_submits() {
        let mut composer = ConversationComposer::new("");
        type_str(&mut composer, "/bye");
        assert!(composer.palette_open());
        match press(&mut composer, KeyCode::Enter) {
            ComposerResult::Command(parsed) => assert_eq!(parsed.command, SlashCommand::Bye),
            other => panic!("expected command, got {:?}", other),
        }
    }

    #[test]
    fn whitespace_closes_palette() {
        let mut composer = ConversationComposer::new("");
        type_str(&mut composer, "/copy");
        assert!(composer.palette_open());
        type_str(&mut composer, " ");
        assert!(!composer.palette_open());
    }

    #[test]
    fn paste_inserts_at_cursor() {
        let mut composer = ConversationComposer::new("");
        type_str(&mut composer, "ad");
        press(&mut composer, KeyCode::Left);
        composer.handle_paste("bc");
        assert_eq!(composer.content(), "abcd");
    }
}
