use crate::{domain::ChatId, Result};

/// One row of the counter table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CounterEntry {
    pub label: String,
    pub count: u64,
}

/// A subscriber row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Subscriber {
    pub chat_id: ChatId,
    pub created_at: String,
}

/// Persistence port for the event counter table.
///
/// Implementations must make `increment` a single atomic upsert.
pub trait CounterStore: Send + Sync {
    /// Add one to `label`, creating it at 1. Returns the new count.
    fn increment(&self, label: &str) -> Result<u64>;

    /// All entries, highest count first.
    fn counters(&self) -> Result<Vec<CounterEntry>>;
}

/// Persistence port for the subscriber table.
pub trait SubscriberStore: Send + Sync {
    /// Insert if absent. Returns `true` when a row was created.
    fn insert_subscriber(&self, chat_id: ChatId) -> Result<bool>;

    /// Delete by key. Returns `true` when a row was removed.
    fn delete_subscriber(&self, chat_id: ChatId) -> Result<bool>;

    fn subscriber_count(&self) -> Result<u64>;

    /// Full scan in subscription order.
    fn subscribers(&self) -> Result<Vec<Subscriber>>;
}
