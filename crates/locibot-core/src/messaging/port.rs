use async_trait::async_trait;

use crate::{
    domain::{ChatId, MessageRef},
    messaging::types::OutgoingMessage,
    Result,
};

/// Outbound messaging port.
///
/// Every call may fail (message too old, chat blocked the bot, network error);
/// callers decide whether a failure is soft.
#[async_trait]
pub trait MessagingPort: Send + Sync {
    async fn send_message(&self, chat_id: ChatId, msg: &OutgoingMessage) -> Result<MessageRef>;

    /// Replace text and keyboard of an existing message.
    async fn edit_message(&self, target: MessageRef, msg: &OutgoingMessage) -> Result<()>;

    async fn answer_callback_query(&self, callback_id: &str, text: Option<&str>) -> Result<()>;
}
