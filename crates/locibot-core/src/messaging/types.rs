use crate::domain::{ChatId, MessageRef, UserId};

/// Incoming update model, already stripped of Telegram specifics.
#[derive(Clone, Debug)]
pub enum IncomingUpdate {
    Command(Command),
    Callback(CallbackQuery),
}

/// A `/command args` message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Command {
    pub chat_id: ChatId,
    /// Lowercased command name without the leading `/` or `@botname` suffix.
    pub name: String,
    /// Everything after the first whitespace, trimmed.
    pub args: String,
}

impl Command {
    /// Parse a message text into a command. Returns `None` for non-commands.
    pub fn parse(chat_id: ChatId, text: &str) -> Option<Self> {
        let text = text.trim_start();
        if !text.starts_with('/') {
            return None;
        }

        // Telegram may send `/cmd@botname arg1 ...`
        let mut parts = text.splitn(2, char::is_whitespace);
        let first = parts.next().unwrap_or("");
        let args = parts.next().unwrap_or("").trim().to_string();

        let name = first
            .trim_start_matches('/')
            .split('@')
            .next()
            .unwrap_or("")
            .to_lowercase();
        if name.is_empty() {
            return None;
        }

        Some(Self {
            chat_id,
            name,
            args,
        })
    }
}

#[derive(Clone, Debug)]
pub struct CallbackQuery {
    pub chat_id: ChatId,
    pub user_id: UserId,
    pub callback_id: String,
    pub data: String,
    /// The message carrying the pressed keyboard.
    pub message: Option<MessageRef>,
}

/// A single inline keyboard button.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InlineButton {
    /// Routed back to the bot as a callback query carrying `action`.
    Callback { label: String, action: String },
    /// Opens `url` on the client.
    Url { label: String, url: String },
}

impl InlineButton {
    pub fn callback(label: impl Into<String>, action: impl Into<String>) -> Self {
        Self::Callback {
            label: label.into(),
            action: action.into(),
        }
    }

    pub fn url(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self::Url {
            label: label.into(),
            url: url.into(),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Callback { label, .. } | Self::Url { label, .. } => label,
        }
    }
}

/// Inline keyboard, row by row.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InlineKeyboard {
    pub rows: Vec<Vec<InlineButton>>,
}

impl InlineKeyboard {
    /// Convenience for "one button per row" layouts.
    pub fn one_per_row(buttons: impl IntoIterator<Item = InlineButton>) -> Self {
        Self {
            rows: buttons.into_iter().map(|b| vec![b]).collect(),
        }
    }

    pub fn buttons(&self) -> impl Iterator<Item = &InlineButton> {
        self.rows.iter().flatten()
    }
}

/// An outbound HTML message with optional keyboard.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub html: String,
    pub keyboard: Option<InlineKeyboard>,
    pub link_preview: bool,
}

impl OutgoingMessage {
    pub fn html(html: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            keyboard: None,
            link_preview: true,
        }
    }

    pub fn with_keyboard(mut self, keyboard: InlineKeyboard) -> Self {
        self.keyboard = Some(keyboard);
        self
    }

    pub fn without_link_preview(mut self) -> Self {
        self.link_preview = false;
        self
    }
}
