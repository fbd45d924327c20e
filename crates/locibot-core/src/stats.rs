//! Event counter: one named counter per tracked user action.

use std::sync::Arc;

use crate::{
    formatting::escape_html,
    ports::{CounterEntry, CounterStore},
    subscribers::SubscriberRegistry,
    Result,
};

/// Counter labels recorded by the bot.
pub mod labels {
    pub const START: &str = "start";
    pub const OPEN_FINANCE: &str = "open_finance";
    pub const OPEN_DESK: &str = "open_desk";
    pub const SUB_NEW: &str = "sub_new";
    pub const SUB_EXISTING: &str = "sub_existing";
    pub const SUB_NEW_CMD: &str = "sub_new_cmd";
    pub const SUB_EXISTING_CMD: &str = "sub_existing_cmd";
    pub const SUB_REMOVED_CMD: &str = "sub_removed_cmd";
    pub const SUB_REMOVED_NOOP_CMD: &str = "sub_removed_noop_cmd";
    pub const BROADCAST_SENT: &str = "broadcast_sent";
}

#[derive(Clone)]
pub struct EventCounter {
    store: Arc<dyn CounterStore>,
}

impl EventCounter {
    pub fn new(store: Arc<dyn CounterStore>) -> Self {
        Self { store }
    }

    /// Record one occurrence of `label`.
    ///
    /// Never fails: a storage error is logged and the triggering action goes on.
    pub fn increment(&self, label: &str) {
        match self.store.increment(label) {
            Ok(count) => tracing::debug!(label, count, "counter incremented"),
            Err(e) => tracing::error!(label, error = %e, "failed to increment counter"),
        }
    }

    /// All counters (highest first) plus the current subscriber total.
    pub fn snapshot(&self, registry: &SubscriberRegistry) -> Result<StatsSnapshot> {
        Ok(StatsSnapshot {
            entries: self.store.counters()?,
            subscribers: registry.count()?,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub entries: Vec<CounterEntry>,
    pub subscribers: u64,
}

impl StatsSnapshot {
    pub fn to_html(&self) -> String {
        let body = if self.entries.is_empty() {
            "Sem dados ainda.".to_string()
        } else {
            self.entries
                .iter()
                .map(|e| format!("• {}: {}", escape_html(&e.label), e.count))
                .collect::<Vec<_>>()
                .join("\n")
        };
        format!(
            "📊 <b>Stats</b>\n\n{body}\n\n👥 inscritos: {}",
            self.subscribers
        )
    }
}
