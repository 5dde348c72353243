use std::io::{self, Stdout};
use std::sync::Arc;

use anyhow::{Context, Result};
use crossterm::event::{DisableBracketedPaste, EnableBracketedPaste, Event, EventStream};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use futures::StreamExt;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tokio::sync::mpsc;

use crate::backend::HttpBackend;
use crate::clipboard::ClipboardExporter;
use crate::config::Config;
use crate::dispatcher::RequestDispatcher;
use crate::events::{AppEvent, TurnOutcome};
use crate::ui::conversation::{ConversationAction, ConversationManager};

type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Run the interactive chat until the user exits
pub async fn run(config: Config) -> Result<()> {
    let backend = HttpBackend::new(&config.backend);
    tracing::info!(url = backend.url(), "starting interactive session");

    let (dispatcher, mut outcomes) = RequestDispatcher::new(Arc::new(backend));
    let mut manager = ConversationManager::new(dispatcher, ClipboardExporter::system(), &config.ui);

    let mut terminal = setup_terminal()?;
    let result = event_loop(&mut terminal, &mut manager, &mut outcomes).await;
    restore_terminal(&mut terminal)?;

    tracing::info!(
        messages = manager.store().len(),
        unanswered = manager.pending(),
        "session ended"
    );
    result
}

fn setup_terminal() -> Result<Tui> {
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)
        .context("Failed to enter alternate screen")?;
    Terminal::new(CrosstermBackend::new(stdout)).context("Failed to create terminal")
}

fn restore_terminal(terminal: &mut Tui) -> Result<()> {
    disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableBracketedPaste)
        .context("Failed to leave alternate screen")?;
    terminal.show_cursor().context("Failed to show cursor")?;
    Ok(())
}

async fn event_loop(
    terminal: &mut Tui,
    manager: &mut ConversationManager,
    outcomes: &mut mpsc::UnboundedReceiver<TurnOutcome>,
) -> Result<()> {
    let mut input = EventStream::new();

    loop {
        terminal.draw(|frame| manager.render(frame.size(), frame.buffer_mut()))?;

        let event = tokio::select! {
            maybe = input.next() => input_event(maybe)?,
            Some(outcome) = outcomes.recv() => AppEvent::TurnFinished(outcome),
        };

        match event {
            AppEvent::Terminal(Event::Key(key)) => {
                if manager.handle_key(key) == ConversationAction::Exit {
                    return Ok(());
                }
            }
            AppEvent::Terminal(Event::Paste(text)) => manager.handle_paste(&text),
            AppEvent::Terminal(_) => {}
            AppEvent::TurnFinished(outcome) => manager.handle_turn(outcome),
            AppEvent::ExitRequest => return Ok(()),
        }
    }
}

/// A closed input stream ends the session.
fn input_event(maybe: Option<io::Result<Event>>) -> Result<AppEvent> {
    match maybe {
        Some(event) => Ok(AppEvent::Terminal(
            event.context("Failed to read terminal event")?,
        )),
        None => Ok(AppEvent::ExitRequest),
    }
}
