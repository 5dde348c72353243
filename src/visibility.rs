use crate::events::MessageId;
use crate::store::ConversationStore;

/// View over the source-panel flag of bot messages. Holds no state of its own.
pub struct VisibilityController;

impl VisibilityController {
    /// Flip the panel of `id`. Returns the new state, or `None` when no bot
    /// message has that id.
    pub fn toggle(store: &mut ConversationStore, id: MessageId) -> Option<bool> {
        match store.toggle_visibility(id) {
            Ok(visible) => {
                tracing::debug!(%id, visible, "toggled source documents");
                Some(visible)
            }
            Err(err) => {
                tracing::error!(%id, error = %err, "toggle requested for a message that does not exist");
                None
            }
        }
    }

    pub fn is_visible(store: &ConversationStore, id: MessageId) -> bool {
        store.is_visible(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_reports_new_state() {
        let mut store = ConversationStore::new();
        let id = store.append_bot("answer", vec![]);

        assert!(!VisibilityController::is_visible(&store, id));
        assert_eq!(VisibilityController::toggle(&mut store, id), Some(true));
        assert!(VisibilityController::is_visible(&store, id));
        assert_eq!(VisibilityController::toggle(&mut store, id), Some(false));
        assert!(!VisibilityController::is_visible(&store, id));
    }

    #[test]
    fn unknown_id_is_absorbed() {
        let mut store = ConversationStore::new();
        assert_eq!(VisibilityController::toggle(&mut store, MessageId(3)), None);
        assert!(store.is_empty());
    }
}
