use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::Instrument;
use uuid::Uuid;

use crate::backend::Backend;
use crate::events::{MessageId, TurnOutcome};
use crate::store::ConversationStore;

/// How a single awaited turn ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnStatus {
    /// Empty input; nothing was sent or recorded
    Rejected,
    /// The answer was appended under this id
    Answered(MessageId),
    /// The backend call failed; the question stays unanswered
    Failed,
}

/// Runs question/answer round-trips against the backend.
///
/// `send` appends the question immediately and resolves the network call on a
/// spawned task; the outcome comes back over the channel returned by `new`
/// and is folded into the store with `apply`. Bot ids are therefore assigned
/// when the answer is appended, never when the question was sent.
pub struct RequestDispatcher {
    backend: Arc<dyn Backend>,
    outcomes: mpsc::UnboundedSender<TurnOutcome>,
}

impl RequestDispatcher {
    pub fn new(backend: Arc<dyn Backend>) -> (Self, mpsc::UnboundedReceiver<TurnOutcome>) {
        let (outcomes, rx) = mpsc::unbounded_channel();
        (Self { backend, outcomes }, rx)
    }

    fn accepts(text: &str) -> bool {
        !text.trim().is_empty()
    }

    /// Append `text` as a user message and start its backend call.
    ///
    /// Returns the request id, or `None` when the input is empty. Calls may
    /// overlap; each outcome is delivered independently.
    pub fn send(&self, store: &mut ConversationStore, text: &str) -> Option<Uuid> {
        if !Self::accepts(text) {
            return None;
        }

        store.append_user(text);

        let request_id = Uuid::new_v4();
        let backend = Arc::clone(&self.backend);
        let outcomes = self.outcomes.clone();
        let question = text.to_string();
        let span = tracing::info_span!("turn", %request_id);

        tokio::spawn(
            async move {
                tracing::info!("question dispatched");
                let result = backend.ask(&question).await;
                let outcome = TurnOutcome {
                    request_id,
                    question,
                    result,
                };
                if outcomes.send(outcome).is_err() {
                    tracing::debug!("conversation closed before the answer arrived");
                }
            }
            .instrument(span),
        );

        Some(request_id)
    }

    /// Fold a finished turn into the store.
    ///
    /// Success appends the bot message with its documents. Failure is logged
    /// and leaves the transcript untouched.
    pub fn apply(store: &mut ConversationStore, outcome: TurnOutcome) -> Option<MessageId> {
        let TurnOutcome {
            request_id,
            question,
            result,
        } = outcome;

        match result {
            Ok(reply) => {
                let docs = reply.source_documents.len();
                let id = store.append_bot(reply.answer, reply.source_documents);
                tracing::info!(%request_id, %id, docs, "answer received");
                Some(id)
            }
            Err(err) => {
                tracing::error!(%request_id, question = %question, error = %err, "backend request failed");
                None
            }
        }
    }

    /// Run one turn to completion on the caller's task.
    pub async fn ask(&self, store: &mut ConversationStore, text: &str) -> TurnStatus {
        if !Self::accepts(text) {
            return TurnStatus::Rejected;
        }

        store.append_user(text);

        let request_id = Uuid::new_v4();
        let result = self
            .backend
            .ask(text)
            .instrument(tracing::info_span!("turn", %request_id))
            .await;
        let outcome = TurnOutcome {
            request_id,
            question: text.to_string(),
            result,
        };

        match Self::apply(store, outcome) {
            Some(id) => TurnStatus::Answered(id),
            None => TurnStatus::Failed,
        }
    }
}
