//! Telegram adapter (teloxide).
//!
//! This crate implements the `locibot-core` MessagingPort over the Telegram
//! Bot API and feeds Telegram updates into `BotCore`.

use async_trait::async_trait;

use teloxide::{
    prelude::*,
    types::{InlineKeyboardButton, InlineKeyboardMarkup, ParseMode},
};
use url::Url;

pub mod handlers;
pub mod router;

use locibot_core::{
    domain::{ChatId, MessageId, MessageRef},
    errors::Error,
    messaging::{
        port::MessagingPort,
        types::{InlineButton, InlineKeyboard, OutgoingMessage},
    },
    Result,
};

#[derive(Clone)]
pub struct TelegramMessenger {
    bot: Bot,
}

impl TelegramMessenger {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    fn tg_chat(chat_id: ChatId) -> teloxide::types::ChatId {
        teloxide::types::ChatId(chat_id.0)
    }

    fn tg_msg_id(message_id: MessageId) -> teloxide::types::MessageId {
        teloxide::types::MessageId(message_id.0)
    }

    fn map_err(e: teloxide::RequestError) -> Error {
        Error::External(format!("telegram error: {e}"))
    }
}

fn tg_button(button: &InlineButton) -> Result<InlineKeyboardButton> {
    match button {
        InlineButton::Callback { label, action } => {
            Ok(InlineKeyboardButton::callback(label.clone(), action.clone()))
        }
        InlineButton::Url { label, url } => {
            let parsed = Url::parse(url)
                .map_err(|e| Error::External(format!("invalid button url {url}: {e}")))?;
            Ok(InlineKeyboardButton::url(label.clone(), parsed))
        }
    }
}

pub(crate) fn tg_keyboard(keyboard: &InlineKeyboard) -> Result<InlineKeyboardMarkup> {
    let rows = keyboard
        .rows
        .iter()
        .map(|row| row.iter().map(tg_button).collect::<Result<Vec<_>>>())
        .collect::<Result<Vec<_>>>()?;
    Ok(InlineKeyboardMarkup::new(rows))
}

#[async_trait]
impl MessagingPort for TelegramMessenger {
    async fn send_message(&self, chat_id: ChatId, msg: &OutgoingMessage) -> Result<MessageRef> {
        let mut req = self
            .bot
            .send_message(Self::tg_chat(chat_id), msg.html.clone())
            .parse_mode(ParseMode::Html)
            .disable_web_page_preview(!msg.link_preview);
        if let Some(kb) = &msg.keyboard {
            req = req.reply_markup(tg_keyboard(kb)?);
        }

        let sent = req.await.map_err(Self::map_err)?;
        Ok(MessageRef {
            chat_id,
            message_id: MessageId(sent.id.0),
        })
    }

    async fn edit_message(&self, target: MessageRef, msg: &OutgoingMessage) -> Result<()> {
        let mut req = self
            .bot
            .edit_message_text(
                Self::tg_chat(target.chat_id),
                Self::tg_msg_id(target.message_id),
                msg.html.clone(),
            )
            .parse_mode(ParseMode::Html)
            .disable_web_page_preview(!msg.link_preview);
        if let Some(kb) = &msg.keyboard {
            req = req.reply_markup(tg_keyboard(kb)?);
        }

        req.await.map_err(Self::map_err)?;
        Ok(())
    }

    async fn answer_callback_query(&self, callback_id: &str, text: Option<&str>) -> Result<()> {
        let mut req = self.bot.answer_callback_query(callback_id.to_string());
        if let Some(t) = text {
            req = req.text(t.to_string());
        }
        req.await.map_err(Self::map_err)?;
        Ok(())
    }
}
