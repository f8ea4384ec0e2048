use ocpp_core::v21::types::{
    ClearMessageStatus, DisplayMessageStatus, MessageInfo, MessagePriority, MessageState,
};

use super::EntityStore;

pub type DisplayMessageRecord = MessageInfo;

impl EntityStore {
    /// Stores or replaces the message with the same id. A message bound to a
    /// transaction is only accepted while that transaction runs.
    pub fn set_display_message(&self, message: DisplayMessageRecord) -> DisplayMessageStatus {
        if let Some(transaction_id) = &message.transaction_id {
            if !self.is_transaction_active(transaction_id) {
                return DisplayMessageStatus::UnknownTransaction;
            }
        }
        if self.display_messages.upsert(message.id, message).is_some() {
            log::debug!("display message replaced");
        }
        DisplayMessageStatus::Accepted
    }

    /// Messages matching every given criterion, ordered by id.
    pub fn query_display_messages(
        &self,
        ids: Option<&[i32]>,
        priority: Option<MessagePriority>,
        state: Option<MessageState>,
    ) -> Vec<DisplayMessageRecord> {
        self.display_messages
            .values()
            .into_iter()
            .filter(|message| ids.map(|ids| ids.contains(&message.id)).unwrap_or(true))
            .filter(|message| priority.map(|p| message.priority == p).unwrap_or(true))
            .filter(|message| state.map(|s| message.state == Some(s)).unwrap_or(true))
            .collect()
    }

    pub fn clear_display_message(&self, id: i32) -> ClearMessageStatus {
        match self.display_messages.try_remove(&id) {
            Some(_) => ClearMessageStatus::Accepted,
            None => ClearMessageStatus::Unknown,
        }
    }
}
