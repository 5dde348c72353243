use chrono::{DateTime, Utc};
use std::fmt;

use crate::backend::BackendError;

/// Internal application events for coordinating the event loop
#[derive(Debug)]
pub enum AppEvent {
    /// Terminal input (keyboard, paste, resize)
    Terminal(crossterm::event::Event),

    /// A backend round-trip finished, successfully or not
    TurnFinished(TurnOutcome),

    /// Request to exit the application
    ExitRequest,
}

/// Result of one dispatched question, delivered back to the owner of the transcript.
#[derive(Debug)]
pub struct TurnOutcome {
    pub request_id: uuid::Uuid,
    pub question: String,
    pub result: Result<BotReply, BackendError>,
}

/// Answer text and cited documents returned by the backend for one question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotReply {
    pub answer: String,
    pub source_documents: Vec<SourceDocument>,
}

/// Identifier of a bot message, unique within a transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageId(pub u64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Author of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    User,
    Bot,
}

impl MessageKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            MessageKind::User => "You",
            MessageKind::Bot => "Bot",
        }
    }
}

/// One entry of the transcript. Only bot messages carry an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub kind: MessageKind,
    pub text: String,
    pub id: Option<MessageId>,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::User,
            text: text.into(),
            id: None,
            timestamp: Utc::now(),
        }
    }

    pub fn bot(id: MessageId, text: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::Bot,
            text: text.into(),
            id: Some(id),
            timestamp: Utc::now(),
        }
    }
}

/// Excerpt cited as evidence for a bot answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    pub source_path: String,
    pub content: String,
}

impl SourceDocument {
    pub fn new(source_path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            source_path: source_path.into(),
            content: content.into(),
        }
    }
}
