//! Admin-triggered fan-out of one message to every subscriber.

use std::{sync::Arc, time::Duration};

use tokio::time::sleep;

use crate::{
    config::Links,
    domain::ChatId,
    formatting::convert_markdown_to_html,
    menu::promo_keyboard,
    messaging::{port::MessagingPort, types::OutgoingMessage},
    stats::{labels, EventCounter},
    subscribers::SubscriberRegistry,
    Result,
};

/// Fixed outbound pacing: a pause after every `batch_size` recipients.
#[derive(Clone, Copy, Debug)]
pub struct Pacing {
    pub batch_size: usize,
    pub pause: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        // Stays under Telegram's ~30 msg/s bulk limit.
        Self {
            batch_size: 25,
            pause: Duration::from_millis(1100),
        }
    }
}

impl Pacing {
    /// Whether to pause after sending to recipient `idx` (0-based) of `total`.
    fn pause_after(&self, idx: usize, total: usize) -> bool {
        self.batch_size > 0 && (idx + 1) % self.batch_size == 0 && idx + 1 < total
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub succeeded: usize,
    pub failed: usize,
    pub total: usize,
    pub pauses: usize,
}

impl BroadcastReport {
    pub fn to_html(&self) -> String {
        format!(
            "✅ Broadcast concluído.\n\nEnviados: {}\nFalhas: {}\nTotal: {}",
            self.succeeded, self.failed, self.total
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BroadcastOutcome {
    /// Caller is not the configured admin (or no admin is configured).
    Denied,
    /// Message text was empty after trimming.
    EmptyMessage,
    Completed(BroadcastReport),
}

#[derive(Clone)]
pub struct BroadcastDispatcher {
    messenger: Arc<dyn MessagingPort>,
    registry: SubscriberRegistry,
    counter: EventCounter,
    links: Arc<Links>,
    admin_chat_id: Option<ChatId>,
    pacing: Pacing,
}

impl BroadcastDispatcher {
    pub fn new(
        messenger: Arc<dyn MessagingPort>,
        registry: SubscriberRegistry,
        counter: EventCounter,
        links: Arc<Links>,
        admin_chat_id: Option<ChatId>,
    ) -> Self {
        Self {
            messenger,
            registry,
            counter,
            links,
            admin_chat_id,
            pacing: Pacing::default(),
        }
    }

    pub fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn is_admin(&self, chat_id: ChatId) -> bool {
        self.admin_chat_id == Some(chat_id)
    }

    /// Send `text` (legacy Markdown) to every subscriber, one at a time.
    ///
    /// Per-recipient failures are counted, never propagated. Only a failure to
    /// read the subscriber list is an error.
    pub async fn broadcast(&self, caller: ChatId, text: &str) -> Result<BroadcastOutcome> {
        if !self.is_admin(caller) {
            tracing::warn!(caller = caller.0, "broadcast denied");
            return Ok(BroadcastOutcome::Denied);
        }

        let text = text.trim();
        if text.is_empty() {
            return Ok(BroadcastOutcome::EmptyMessage);
        }

        self.counter.increment(labels::BROADCAST_SENT);

        let recipients = self.registry.list_all()?;
        let msg = OutgoingMessage::html(convert_markdown_to_html(text))
            .with_keyboard(promo_keyboard(&self.links))
            .without_link_preview();

        let mut report = BroadcastReport {
            total: recipients.len(),
            ..Default::default()
        };
        tracing::info!(total = report.total, "broadcast started");

        for (idx, chat_id) in recipients.iter().enumerate() {
            match self.messenger.send_message(*chat_id, &msg).await {
                Ok(_) => report.succeeded += 1,
                Err(e) => {
                    tracing::warn!(chat_id = chat_id.0, error = %e, "broadcast send failed");
                    report.failed += 1;
                }
            }

            if self.pacing.pause_after(idx, report.total) {
                report.pauses += 1;
                sleep(self.pacing.pause).await;
            }
        }

        tracing::info!(
            succeeded = report.succeeded,
            failed = report.failed,
            total = report.total,
            "broadcast finished"
        );
        Ok(BroadcastOutcome::Completed(report))
    }
}
