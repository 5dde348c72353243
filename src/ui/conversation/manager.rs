use crate::clipboard::ClipboardExporter;
use crate::config::UiConfig;
use crate::dispatcher::RequestDispatcher;
use crate::events::TurnOutcome;
use crate::segment::Segment;
use crate::store::ConversationStore;
use crate::ui::conversation::commands::CopyTarget;
use crate::ui::conversation::{
    get_help_text, ComposerResult, ConversationComposer, ConversationHistory, ParsedCommand,
    SlashCommand,
};
use crate::visibility::VisibilityController;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap},
};

const SCROLL_STEP: usize = 10;

/// Actions that can be requested by the conversation manager
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationAction {
    None,
    Exit,
}

/// Owns the transcript and routes input, commands and backend outcomes to it
pub struct ConversationManager {
    store: ConversationStore,
    dispatcher: RequestDispatcher,
    clipboard: ClipboardExporter,
    composer: ConversationComposer,
    show_timestamps: bool,
    pending: usize,
    scroll: usize,
    notice: Option<String>,
    show_help: bool,
}

impl ConversationManager {
    pub fn new(dispatcher: RequestDispatcher, clipboard: ClipboardExporter, ui: &UiConfig) -> Self {
        let mut composer = ConversationComposer::new("Type your message...");
        composer.set_focus(true);

        Self {
            store: ConversationStore::new(),
            dispatcher,
            clipboard,
            composer,
            show_timestamps: ui.show_timestamps,
            pending: 0,
            scroll: 0,
            notice: None,
            show_help: false,
        }
    }

    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    /// Requests sent whose outcome has not arrived yet
    pub fn pending(&self) -> usize {
        self.pending
    }

    #[cfg(test)]
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// Handle user input: append it and start its backend call
    pub fn handle_input(&mut self, input: String) {
        if self.dispatcher.send(&mut self.store, &input).is_some() {
            self.pending += 1;
            self.scroll = 0;
        }
    }

    /// Apply a finished backend turn
    pub fn handle_turn(&mut self, outcome: TurnOutcome) {
        self.pending = self.pending.saturating_sub(1);
        match RequestDispatcher::apply(&mut self.store, outcome) {
            Some(_) => self.scroll = 0,
            None => self.notice = Some("Request failed; see the log. You can ask again.".to_string()),
        }
    }

    /// Handle key input
    pub fn handle_key(&mut self, key: KeyEvent) -> ConversationAction {
        if key.kind != KeyEventKind::Press {
            return ConversationAction::None;
        }

        if self.show_help {
            self.show_help = false;
            return ConversationAction::None;
        }

        let ctrl_c = key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL);
        if ctrl_c || (key.code == KeyCode::Esc && !self.composer.palette_open()) {
            return ConversationAction::Exit;
        }

        match key.code {
            KeyCode::PageUp => {
                self.scroll = self.scroll.saturating_add(SCROLL_STEP);
                return ConversationAction::None;
            }
            KeyCode::PageDown => {
                self.scroll = self.scroll.saturating_sub(SCROLL_STEP);
                return ConversationAction::None;
            }
            _ => {}
        }

        match self.composer.handle_key(key) {
            ComposerResult::Submitted(input) => {
                self.notice = None;
                self.handle_input(input);
                ConversationAction::None
            }
            ComposerResult::Command(command) => self.handle_slash_command(command),
            ComposerResult::None => ConversationAction::None,
        }
    }

    pub fn handle_paste(&mut self, text: &str) {
        self.composer.handle_paste(text);
    }

    /// Handle slash commands
    fn handle_slash_command(&mut self, command: ParsedCommand) -> ConversationAction {
        match command.command {
            SlashCommand::Sources => {
                self.notice = Some(match command.sources_target() {
                    Some(id) if self.store.message(id).is_none() => {
                        tracing::warn!(%id, "/sources for an unknown answer");
                        format!("No answer #{}", id)
                    }
                    Some(id) => match VisibilityController::toggle(&mut self.store, id) {
                        Some(true) => format!("Showing sources of #{}", id),
                        Some(false) => format!("Hiding sources of #{}", id),
                        None => format!("No answer #{}", id),
                    },
                    None => "Usage: /sources <id>".to_string(),
                });
            }
            SlashCommand::Copy => {
                self.notice = Some(match command.copy_target() {
                    Some(target) => self.copy_code(target),
                    None => "Usage: /copy [<id>] <n>".to_string(),
                });
            }
            SlashCommand::Help => self.show_help = true,
            SlashCommand::Bye => return ConversationAction::Exit,
        }
        ConversationAction::None
    }

    fn copy_code(&mut self, target: CopyTarget) -> String {
        let Some(id) = target.id.or_else(|| self.store.latest_bot_id()) else {
            return "No answer to copy from yet".to_string();
        };
        let Some(segments) = self.store.segments(id) else {
            return format!("No answer #{}", id);
        };

        let blocks: Vec<Segment> = segments.into_iter().filter(Segment::is_code).collect();
        match blocks.get(target.index - 1) {
            Some(code) if self.clipboard.copy(&code.content) => {
                format!("Copied code {} of #{}", target.index, id)
            }
            Some(_) => "Copy failed; see the log".to_string(),
            None => format!("#{} has {} code block(s)", id, blocks.len()),
        }
    }

    /// Render the conversation UI components
    pub fn render(&self, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(5),    // History area
                Constraint::Length(1), // Status line
                Constraint::Length(3), // Composer area
            ])
            .split(area);

        ConversationHistory::new(&self.store, self.show_timestamps)
            .scroll(self.scroll)
            .render(chunks[0], buf);
        Paragraph::new(self.status_line()).render(chunks[1], buf);
        self.composer.render(chunks[2], buf);

        if self.show_help {
            let popup = centered(area, 70, 12);
            Clear.render(popup, buf);
            Paragraph::new(get_help_text())
                .wrap(Wrap { trim: false })
                .block(Block::default().borders(Borders::ALL).title("Help (any key to close)"))
                .render(popup, buf);
        }
    }

    fn status_line(&self) -> Line<'static> {
        let mut spans = Vec::new();
        if self.pending > 0 {
            spans.push(Span::styled(
                format!("waiting for {} answer(s)  ", self.pending),
                Style::default().fg(Color::Yellow),
            ));
        }
        if self.scroll > 0 {
            spans.push(Span::styled(
                format!("scrolled {} lines  ", self.scroll),
                Style::default().fg(Color::DarkGray),
            ));
        }
        if let Some(notice) = &self.notice {
            spans.push(Span::styled(notice.clone(), Style::default().fg(Color::Gray)));
        }
        Line::from(spans)
    }
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Backend, BackendError};
    use crate::clipboard::{ClipboardError, ClipboardWriter};
    use crate::events::{BotReply, MessageId, SourceDocument};
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};
    use tokio::sync::mpsc;

    struct EchoBackend;

    #[async_trait]
    impl Backend for EchoBackend {
        async fn ask(&self, question: &str) -> Result<BotReply, BackendError> {
            if question == "fail" {
                return Err(BackendError::Status { status: 500, body: String::new() });
            }
            Ok(BotReply {
                answer: format!("About {}: ```first``` and ```second```", question),
                source_documents: vec![SourceDocument::new("notes.md", question)],
            })
        }
    }

    struct SharedClipboard(Arc<Mutex<Vec<String>>>);

    impl ClipboardWriter for SharedClipboard {
        fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
            self.0.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    fn manager() -> (ConversationManager, mpsc::UnboundedReceiver<TurnOutcome>, Arc<Mutex<Vec<String>>>) {
        let (dispatcher, rx) = RequestDispatcher::new(Arc::new(EchoBackend));
        let copied = Arc::new(Mutex::new(Vec::new()));
        let clipboard = ClipboardExporter::new(Box::new(SharedClipboard(copied.clone())));
        let manager = ConversationManager::new(dispatcher, clipboard, &UiConfig::default());
        (manager, rx, copied)
    }

    fn type_line(manager: &mut ConversationManager, text: &str) -> ConversationAction {
        for c in text.chars() {
            manager.handle_key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE));
        }
        manager.handle_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE))
    }

    #[tokio::test]
    async fn submit_then_answer_updates_pending_and_transcript() {
        let (mut manager, mut rx, _) = manager();

        type_line(&mut manager, "X");
        assert_eq!(manager.pending(), 1);
        assert_eq!(manager.store().len(), 1);

        manager.handle_turn(rx.recv().await.unwrap());
        assert_eq!(manager.pending(), 0);
        assert_eq!(manager.store().latest_bot_id(), Some(MessageId(1)));
    }

    #[tokio::test]
    async fn failed_turn_leaves_question_and_sets_notice() {
        let (mut manager, mut rx, _) = manager();

        type_line(&mut manager, "fail");
        manager.handle_turn(rx.recv().await.unwrap());
        assert_eq!(manager.store().len(), 1);
        assert!(manager.notice().unwrap().contains("failed"));
    }

    #[tokio::test]
    async fn sources_command_toggles_visibility() {
        let (mut manager, mut rx, _) = manager();
        type_line(&mut manager, "X");
        manager.handle_turn(rx.recv().await.unwrap());

        type_line(&mut manager, "/sources 1");
        assert!(manager.store().is_visible(MessageId(1)));
        type_line(&mut manager, "/sources 1");
        assert!(!manager.store().is_visible(MessageId(1)));

        type_line(&mut manager, "/sources 9");
        assert_eq!(manager.notice(), Some("No answer #9"));
        assert!(!manager.store().is_visible(MessageId(9)));
        assert!(!manager.store().is_visible(MessageId(1)));
    }

    #[tokio::test]
    async fn copy_command_exports_raw_code() {
        let (mut manager, mut rx, copied) = manager();
        type_line(&mut manager, "X");
        manager.handle_turn(rx.recv().await.unwrap());

        type_line(&mut manager, "/copy 2");
        type_line(&mut manager, "/copy 1 1");
        assert_eq!(copied.lock().unwrap().as_slice(), ["second", "first"]);

        type_line(&mut manager, "/copy 3");
        assert_eq!(manager.notice(), Some("#1 has 2 code block(s)"));
        assert_eq!(copied.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn copy_without_answers_reports_it() {
        let (mut manager, _rx, copied) = manager();
        type_line(&mut manager, "/copy");
        assert_eq!(manager.notice(), Some("No answer to copy from yet"));
        assert!(copied.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn bye_and_escape_exit() {
        let (mut manager, _rx, _) = manager();
        assert_eq!(type_line(&mut manager, "/bye"), ConversationAction::Exit);
        assert_eq!(
            manager.handle_key(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE)),
            ConversationAction::Exit
        );
    }

    #[tokio::test]
    async fn render_fits_small_terminals() {
        let (mut manager, mut rx, _) = manager();
        type_line(&mut manager, "X");
        manager.handle_turn(rx.recv().await.unwrap());
        type_line(&mut manager, "/help");

        let area = Rect::new(0, 0, 30, 12);
        let mut buf = Buffer::empty(area);
        manager.render(area, &mut buf);
    }
}
