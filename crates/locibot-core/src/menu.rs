//! Static product menu: screens, button layouts and in-place re-rendering.

use std::sync::Arc;

use crate::{
    config::Links,
    domain::{ChatId, MessageRef},
    messaging::{
        port::MessagingPort,
        types::{InlineButton, InlineKeyboard, OutgoingMessage},
    },
    stats::{labels, EventCounter},
    Result,
};

/// Callback actions carried by the menu buttons.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    OpenFinance,
    OpenDesk,
    Subscribe,
    Back,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OpenFinance => "app_finance",
            Self::OpenDesk => "app_desk",
            Self::Subscribe => "sub_on",
            Self::Back => "back",
        }
    }

    pub fn parse(data: &str) -> Option<Self> {
        match data {
            "app_finance" => Some(Self::OpenFinance),
            "app_desk" => Some(Self::OpenDesk),
            "sub_on" => Some(Self::Subscribe),
            "back" => Some(Self::Back),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Screen {
    Home,
    Finance,
    Desk,
}

impl Screen {
    /// Product screen addressed by a `/start <payload>` deep link.
    pub fn from_start_payload(payload: &str) -> Option<Self> {
        match payload.trim() {
            "finance" => Some(Self::Finance),
            "desk" => Some(Self::Desk),
            _ => None,
        }
    }

    pub fn counter_label(self) -> &'static str {
        match self {
            Self::Home => labels::START,
            Self::Finance => labels::OPEN_FINANCE,
            Self::Desk => labels::OPEN_DESK,
        }
    }
}

pub const MENU_PROMPT: &str = "Escolha o app que você quer conhecer:";

/// Where a rendered screen goes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Target {
    /// Reply with a new message (commands).
    Chat(ChatId),
    /// Edit the message whose button was pressed; falls back to a new message.
    InPlace(MessageRef),
}

impl Target {
    pub fn chat_id(self) -> ChatId {
        match self {
            Self::Chat(id) => id,
            Self::InPlace(msg) => msg.chat_id,
        }
    }
}

fn subscribe_button() -> InlineButton {
    InlineButton::callback("🔔 Receber novidades", Action::Subscribe.as_str())
}

fn back_button() -> InlineButton {
    InlineButton::callback("⬅️ Voltar", Action::Back.as_str())
}

/// Keyboard of the home screen.
pub fn main_menu(links: &Links) -> InlineKeyboard {
    InlineKeyboard::one_per_row([
        InlineButton::callback("📱 LociOne Finance", Action::OpenFinance.as_str()),
        InlineButton::callback("💻 LociOne Desk", Action::OpenDesk.as_str()),
        InlineButton::url("🌐 Site oficial", links.site.as_str()),
        InlineButton::url("📣 Canal de novidades", links.canal.as_str()),
        subscribe_button(),
    ])
}

/// Link-only keyboard attached to broadcasts.
pub fn promo_keyboard(links: &Links) -> InlineKeyboard {
    InlineKeyboard::one_per_row([
        InlineButton::url("🍎 iOS (App Store)", links.finance_ios.as_str()),
        InlineButton::url("💻 Desk (Download)", links.desk_download.as_str()),
        InlineButton::url("🌐 Site", links.site.as_str()),
        InlineButton::url("📣 Canal", links.canal.as_str()),
    ])
}

/// Pure rendering of a screen.
pub fn render(screen: Screen, links: &Links) -> OutgoingMessage {
    match screen {
        Screen::Home => OutgoingMessage::html(format!(
            "👋 <b>Bem-vindo à LociOne!</b>\n\n{MENU_PROMPT}"
        ))
        .with_keyboard(main_menu(links)),
        Screen::Finance => OutgoingMessage::html(
            "<b>LociOne Finance 📱</b>\n\n\
             • Controle financeiro rápido\n\
             • Offline-first (dados no aparelho)\n\
             • Relatórios e organização\n\n\
             Baixe no iOS:",
        )
        .with_keyboard(InlineKeyboard::one_per_row([
            InlineButton::url("🍎 App Store (iOS)", links.finance_ios.as_str()),
            subscribe_button(),
            back_button(),
        ])),
        Screen::Desk => OutgoingMessage::html(
            "<b>LociOne Desk 💻</b>\n\n\
             • App desktop offline-first\n\
             • Produtividade com privacidade\n\
             • Downloads oficiais no site\n\n\
             Faça o download:",
        )
        .with_keyboard(InlineKeyboard::one_per_row([
            InlineButton::url("💻 Download Desktop", links.desk_download.as_str()),
            subscribe_button(),
            back_button(),
        ])),
    }
}

/// Renders screens and delivers them, preferring in-place edits.
#[derive(Clone)]
pub struct MenuPresenter {
    messenger: Arc<dyn MessagingPort>,
    counter: EventCounter,
    links: Arc<Links>,
}

impl MenuPresenter {
    pub fn new(messenger: Arc<dyn MessagingPort>, counter: EventCounter, links: Arc<Links>) -> Self {
        Self {
            messenger,
            counter,
            links,
        }
    }

    pub fn links(&self) -> &Links {
        &self.links
    }

    /// Render `screen`, record its counter and deliver it.
    pub async fn show(&self, screen: Screen, target: Target) -> Result<MessageRef> {
        self.counter.increment(screen.counter_label());
        self.deliver(target, &render(screen, &self.links)).await
    }

    /// Re-draw the home keyboard with a plain prompt (no counter).
    pub async fn show_menu(&self, target: Target) -> Result<MessageRef> {
        let msg = OutgoingMessage::html(MENU_PROMPT).with_keyboard(main_menu(&self.links));
        self.deliver(target, &msg).await
    }

    /// Deliver an arbitrary message to `target`.
    ///
    /// An in-place edit that fails for any reason (too old, unchanged, gone)
    /// silently becomes a new message in the same chat.
    pub async fn deliver(&self, target: Target, msg: &OutgoingMessage) -> Result<MessageRef> {
        if let Target::InPlace(existing) = target {
            match self.messenger.edit_message(existing, msg).await {
                Ok(()) => return Ok(existing),
                Err(e) => {
                    tracing::debug!(
                        chat_id = existing.chat_id.0,
                        error = %e,
                        "in-place edit failed, sending a new message"
                    );
                }
            }
        }
        self.messenger.send_message(target.chat_id(), msg).await
    }
}
