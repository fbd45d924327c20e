//! Telegram update handlers.
//!
//! Each handler converts a teloxide update into a `locibot-core`
//! `IncomingUpdate` and hands it to `BotCore`. Core errors are logged here and
//! never reach the user.

use std::sync::Arc;

use teloxide::{
    prelude::*,
    types::{CallbackQuery, Message},
};

use locibot_core::{
    domain::{ChatId, MessageId, MessageRef, UserId},
    messaging::types::{self as core_types, Command, IncomingUpdate},
};

use crate::router::AppState;

pub async fn handle_message(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    if let Some(update) = message_to_update(&msg) {
        dispatch(&state, update).await;
    }
    Ok(())
}

pub async fn handle_callback(q: CallbackQuery, state: Arc<AppState>) -> ResponseResult<()> {
    match callback_to_update(&q) {
        Some(update) => dispatch(&state, update).await,
        // Inline-mode presses carry no chat; just stop the spinner.
        None => {
            let _ = state.bot.answer_callback_query(q.id).await;
        }
    }
    Ok(())
}

async fn dispatch(state: &AppState, update: IncomingUpdate) {
    let (kind, chat_id) = match &update {
        IncomingUpdate::Command(c) => ("command", c.chat_id),
        IncomingUpdate::Callback(q) => ("callback", q.chat_id),
    };
    if let Err(e) = state.core.handle(update).await {
        tracing::error!(kind, chat_id = chat_id.0, error = %e, "update handling failed");
    }
}

/// Only `/commands` are routed; plain text is ignored.
pub(crate) fn message_to_update(msg: &Message) -> Option<IncomingUpdate> {
    let text = msg.text()?;
    Command::parse(ChatId(msg.chat.id.0), text).map(IncomingUpdate::Command)
}

pub(crate) fn callback_to_update(q: &CallbackQuery) -> Option<IncomingUpdate> {
    let message = q.message.as_ref()?;
    let chat_id = ChatId(message.chat.id.0);
    Some(IncomingUpdate::Callback(core_types::CallbackQuery {
        chat_id,
        user_id: UserId(q.from.id.0 as i64),
        callback_id: q.id.clone(),
        data: q.data.clone().unwrap_or_default(),
        message: Some(MessageRef {
            chat_id,
            message_id: MessageId(message.id.0),
        }),
    }))
}
