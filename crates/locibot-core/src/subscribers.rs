//! Opt-in subscriber registry for broadcasts.

use std::sync::Arc;

use crate::{domain::ChatId, ports::SubscriberStore, Result};

#[derive(Clone)]
pub struct SubscriberRegistry {
    store: Arc<dyn SubscriberStore>,
}

impl SubscriberRegistry {
    pub fn new(store: Arc<dyn SubscriberStore>) -> Self {
        Self { store }
    }

    /// Returns `true` for a new subscription, `false` if already subscribed.
    pub fn add(&self, chat_id: ChatId) -> Result<bool> {
        let added = self.store.insert_subscriber(chat_id)?;
        if added {
            tracing::info!(chat_id = chat_id.0, "subscriber added");
        }
        Ok(added)
    }

    /// Returns `true` if the chat was subscribed and has been removed.
    pub fn remove(&self, chat_id: ChatId) -> Result<bool> {
        let removed = self.store.delete_subscriber(chat_id)?;
        if removed {
            tracing::info!(chat_id = chat_id.0, "subscriber removed");
        }
        Ok(removed)
    }

    pub fn count(&self) -> Result<u64> {
        self.store.subscriber_count()
    }

    /// Every subscribed chat, oldest subscription first.
    pub fn list_all(&self) -> Result<Vec<ChatId>> {
        Ok(self
            .store
            .subscribers()?
            .into_iter()
            .map(|s| s.chat_id)
            .collect())
    }
}
