use std::collections::HashMap;

use crate::events::{Message, MessageId, SourceDocument};
use crate::segment::{self, Segment};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("no bot message with id {0}")]
    UnknownMessage(MessageId),
}

/// Owns the transcript, the source-document index and per-message panel visibility.
///
/// The transcript is append-only. Bot ids come from a counter advanced exactly
/// once per `append_bot`, so two bot messages never share an id regardless of
/// how their requests overlapped.
#[derive(Debug, Default)]
pub struct ConversationStore {
    messages: Vec<Message>,
    source_docs: HashMap<MessageId, Vec<SourceDocument>>,
    visibility: HashMap<MessageId, bool>,
    last_id: u64,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a user message. User messages never carry an id.
    pub fn append_user(&mut self, text: impl Into<String>) {
        self.messages.push(Message::user(text));
    }

    /// Append a bot message, assigning its id and indexing its source documents.
    pub fn append_bot(
        &mut self,
        text: impl Into<String>,
        source_docs: Vec<SourceDocument>,
    ) -> MessageId {
        self.last_id += 1;
        let id = MessageId(self.last_id);

        self.messages.push(Message::bot(id, text));
        self.source_docs.insert(id, source_docs);
        self.visibility.insert(id, false);
        id
    }

    /// Flip the source panel of bot message `id`, returning the new state.
    pub fn toggle_visibility(&mut self, id: MessageId) -> Result<bool, StoreError> {
        let visible = self
            .visibility
            .get(&id)
            .copied()
            .ok_or(StoreError::UnknownMessage(id))?;
        self.visibility.insert(id, !visible);
        Ok(!visible)
    }

    /// Whether the source panel of `id` is shown. Unknown ids read as hidden.
    pub fn is_visible(&self, id: MessageId) -> bool {
        self.visibility.get(&id).copied().unwrap_or(false)
    }

    /// Source documents recorded for `id`, empty when absent.
    pub fn source_docs(&self, id: MessageId) -> &[SourceDocument] {
        self.source_docs.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn message(&self, id: MessageId) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == Some(id))
    }

    pub fn latest_bot_id(&self) -> Option<MessageId> {
        self.messages.iter().rev().find_map(|m| m.id)
    }

    /// Segments of the message with `id`, for rendering or export.
    pub fn segments(&self, id: MessageId) -> Option<Vec<Segment>> {
        self.message(id).map(|m| segment::segment(&m.text))
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::MessageKind;

    #[test]
    fn user_messages_have_no_id_or_documents() {
        let mut store = ConversationStore::new();
        store.append_user("What is X?");

        let message = &store.messages()[0];
        assert_eq!(message.kind, MessageKind::User);
        assert_eq!(message.id, None);
        assert!(store.latest_bot_id().is_none());
    }

    #[test]
    fn bot_ids_start_at_one_and_increase() {
        let mut store = ConversationStore::new();
        store.append_user("q1");
        let first = store.append_bot("a1", vec![]);
        store.append_user("q2");
        store.append_user("q3");
        let second = store.append_bot("a2", vec![]);
        let third = store.append_bot("a3", vec![]);

        assert_eq!(first, MessageId(1));
        assert_eq!(second, MessageId(2));
        assert_eq!(third, MessageId(3));
        assert_eq!(store.len(), 6);
        assert_eq!(store.latest_bot_id(), Some(third));
    }

    #[test]
    fn source_documents_keep_backend_order() {
        let mut store = ConversationStore::new();
        let docs = vec![
            SourceDocument::new("b.rs", "second"),
            SourceDocument::new("a.rs", "first"),
        ];
        let id = store.append_bot("answer", docs.clone());

        assert_eq!(store.source_docs(id), docs.as_slice());
        assert!(store.source_docs(MessageId(99)).is_empty());
    }

    #[test]
    fn empty_source_list_is_recorded() {
        let mut store = ConversationStore::new();
        let id = store.append_bot("answer", Vec::new());
        assert!(store.source_docs(id).is_empty());
        assert!(!store.is_visible(id));
    }

    #[test]
    fn double_toggle_restores_visibility() {
        let mut store = ConversationStore::new();
        let id = store.append_bot("answer", vec![]);

        assert_eq!(store.toggle_visibility(id), Ok(true));
        assert!(store.is_visible(id));
        assert_eq!(store.toggle_visibility(id), Ok(false));
        assert!(!store.is_visible(id));
    }

    #[test]
    fn toggle_only_touches_its_own_message() {
        let mut store = ConversationStore::new();
        let first = store.append_bot("one", vec![]);
        let second = store.append_bot("two", vec![]);

        store.toggle_visibility(second).unwrap();
        assert!(!store.is_visible(first));
        assert!(store.is_visible(second));
    }

    #[test]
    fn toggle_unknown_id_fails_without_change() {
        let mut store = ConversationStore::new();
        store.append_user("hi");
        assert_eq!(
            store.toggle_visibility(MessageId(7)),
            Err(StoreError::UnknownMessage(MessageId(7)))
        );
        assert!(!store.is_visible(MessageId(7)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn segments_are_derived_from_message_text() {
        let mut store = ConversationStore::new();
        let id = store.append_bot("X is ```code``` end", vec![]);

        let segments = store.segments(id).unwrap();
        assert_eq!(segments, vec![Segment::prose("X is  end"), Segment::code("code")]);
        assert!(store.segments(MessageId(2)).is_none());
    }
}
