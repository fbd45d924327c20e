//! Maps inbound commands and button presses to the bot's handlers.

use std::sync::Arc;

use crate::{
    broadcast::{BroadcastDispatcher, BroadcastOutcome},
    config::{Config, Links},
    domain::ChatId,
    menu::{Action, MenuPresenter, Screen, Target},
    messaging::{
        port::MessagingPort,
        types::{CallbackQuery, Command, IncomingUpdate, OutgoingMessage},
    },
    ports::{CounterStore, SubscriberStore},
    stats::{labels, EventCounter},
    subscribers::SubscriberRegistry,
    Result,
};

/// Commands understood by the bot, with the descriptions shown by Telegram.
pub const COMMANDS: &[(&str, &str)] = &[
    ("start", "Menu inicial"),
    ("finance", "LociOne Finance"),
    ("desk", "LociOne Desk"),
    ("site", "Site oficial"),
    ("canal", "Canal de novidades"),
    ("subscribe", "Receber novidades"),
    ("unsubscribe", "Parar de receber novidades"),
    ("stats", "Estatísticas"),
    ("myid", "Mostrar seu chat_id"),
];

/// Explicit state for the bot: one instance per process (or per test).
#[derive(Clone)]
pub struct BotCore {
    messenger: Arc<dyn MessagingPort>,
    counter: EventCounter,
    registry: SubscriberRegistry,
    menu: MenuPresenter,
    broadcaster: BroadcastDispatcher,
}

impl BotCore {
    pub fn new(
        messenger: Arc<dyn MessagingPort>,
        counters: Arc<dyn CounterStore>,
        subscribers: Arc<dyn SubscriberStore>,
        links: Links,
        admin_chat_id: Option<ChatId>,
    ) -> Self {
        let links = Arc::new(links);
        let counter = EventCounter::new(counters);
        let registry = SubscriberRegistry::new(subscribers);
        let menu = MenuPresenter::new(messenger.clone(), counter.clone(), links.clone());
        let broadcaster = BroadcastDispatcher::new(
            messenger.clone(),
            registry.clone(),
            counter.clone(),
            links,
            admin_chat_id,
        );
        Self {
            messenger,
            counter,
            registry,
            menu,
            broadcaster,
        }
    }

    /// Wire the bot from configuration and a store implementing both ports.
    pub fn from_config<S>(cfg: &Config, messenger: Arc<dyn MessagingPort>, store: Arc<S>) -> Self
    where
        S: CounterStore + SubscriberStore + 'static,
    {
        Self::new(
            messenger,
            store.clone(),
            store,
            cfg.links.clone(),
            cfg.admin_chat_id,
        )
    }

    pub fn with_broadcaster(mut self, broadcaster: BroadcastDispatcher) -> Self {
        self.broadcaster = broadcaster;
        self
    }

    pub fn counter(&self) -> &EventCounter {
        &self.counter
    }

    pub fn registry(&self) -> &SubscriberRegistry {
        &self.registry
    }

    pub fn broadcaster(&self) -> &BroadcastDispatcher {
        &self.broadcaster
    }

    pub async fn handle(&self, update: IncomingUpdate) -> Result<()> {
        match update {
            IncomingUpdate::Command(cmd) => self.handle_command(cmd).await,
            IncomingUpdate::Callback(q) => self.handle_callback(q).await,
        }
    }

    /// Unknown commands are ignored.
    pub async fn handle_command(&self, cmd: Command) -> Result<()> {
        let chat = cmd.chat_id;
        let target = Target::Chat(chat);

        match cmd.name.as_str() {
            "start" => {
                let screen = Screen::from_start_payload(&cmd.args).unwrap_or(Screen::Home);
                self.menu.show(screen, target).await?;
            }
            "finance" => {
                self.menu.show(Screen::Finance, target).await?;
            }
            "desk" => {
                self.menu.show(Screen::Desk, target).await?;
            }
            "site" => {
                let text = format!("🌐 Site oficial: {}", self.menu.links().site);
                self.reply(chat, text).await?;
            }
            "canal" => {
                let text = format!("📣 Canal de novidades: {}", self.menu.links().canal);
                self.reply(chat, text).await?;
            }
            "stats" => {
                let snapshot = self.counter.snapshot(&self.registry)?;
                self.reply(chat, snapshot.to_html()).await?;
            }
            "subscribe" => {
                let added = self.registry.add(chat)?;
                self.counter.increment(if added {
                    labels::SUB_NEW_CMD
                } else {
                    labels::SUB_EXISTING_CMD
                });
                let text = if added {
                    "✅ Inscrito nas novidades."
                } else {
                    "✅ Você já está inscrito."
                };
                self.reply(chat, text).await?;
            }
            "unsubscribe" => {
                let removed = self.registry.remove(chat)?;
                self.counter.increment(if removed {
                    labels::SUB_REMOVED_CMD
                } else {
                    labels::SUB_REMOVED_NOOP_CMD
                });
                let text = if removed {
                    "🛑 Inscrição removida."
                } else {
                    "Você não estava inscrito."
                };
                self.reply(chat, text).await?;
            }
            "myid" => {
                self.reply(chat, format!("🆔 Seu chat_id: {chat}")).await?;
            }
            "broadcast" => {
                let reply = match self.broadcaster.broadcast(chat, &cmd.args).await? {
                    BroadcastOutcome::Denied => "⛔ Comando restrito ao admin.".to_string(),
                    BroadcastOutcome::EmptyMessage => {
                        "Uso: /broadcast sua mensagem aqui".to_string()
                    }
                    BroadcastOutcome::Completed(report) => report.to_html(),
                };
                self.reply(chat, reply).await?;
            }
            other => {
                tracing::debug!(command = other, "ignoring unknown command");
            }
        }

        Ok(())
    }

    /// Unknown callback data is ignored.
    pub async fn handle_callback(&self, q: CallbackQuery) -> Result<()> {
        let Some(action) = Action::parse(&q.data) else {
            tracing::debug!(
                chat_id = q.chat_id.0,
                user_id = q.user_id.0,
                data = %q.data,
                "ignoring unknown callback"
            );
            return Ok(());
        };

        let target = match q.message {
            Some(msg) => Target::InPlace(msg),
            None => Target::Chat(q.chat_id),
        };

        match action {
            Action::OpenFinance => {
                self.ack(&q.callback_id, None).await;
                self.menu.show(Screen::Finance, target).await?;
            }
            Action::OpenDesk => {
                self.ack(&q.callback_id, None).await;
                self.menu.show(Screen::Desk, target).await?;
            }
            Action::Subscribe => {
                let added = self.registry.add(q.chat_id)?;
                self.counter.increment(if added {
                    labels::SUB_NEW
                } else {
                    labels::SUB_EXISTING
                });
                let (toast, text) = if added {
                    (
                        "Inscrito ✅",
                        "✅ Pronto! Você vai receber novidades da LociOne.",
                    )
                } else {
                    ("Você já está inscrito ✅", "ℹ️ Você já estava inscrito.")
                };
                self.ack(&q.callback_id, Some(toast)).await;
                let msg = OutgoingMessage::html(text)
                    .with_keyboard(crate::menu::main_menu(self.menu.links()));
                self.menu.deliver(target, &msg).await?;
            }
            Action::Back => {
                self.ack(&q.callback_id, None).await;
                self.menu.show_menu(target).await?;
            }
        }

        Ok(())
    }

    async fn reply(&self, chat_id: ChatId, html: impl Into<String>) -> Result<()> {
        self.messenger
            .send_message(chat_id, &OutgoingMessage::html(html))
            .await?;
        Ok(())
    }

    /// Acknowledge a button press. Failures are ignored.
    async fn ack(&self, callback_id: &str, text: Option<&str>) {
        if let Err(e) = self.messenger.answer_callback_query(callback_id, text).await {
            tracing::debug!(error = %e, "failed to answer callback query");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        broadcast::Pacing,
        domain::{MessageId, MessageRef, UserId},
        store::SqliteStore,
        testing::{FailingStore, FakeMessenger, Sent},
    };
    use std::time::Duration;

    const ADMIN: ChatId = ChatId(1000);
    const USER: ChatId = ChatId(42);

    fn bot() -> (BotCore, Arc<FakeMessenger>) {
        let messenger = Arc::new(FakeMessenger::new());
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let core = BotCore::new(
            messenger.clone(),
            store.clone(),
            store,
            Links::default(),
            Some(ADMIN),
        );
        let fast = core.broadcaster().clone().with_pacing(Pacing {
            batch_size: 25,
            pause: Duration::ZERO,
        });
        (core.with_broadcaster(fast), messenger)
    }

    fn command(chat: ChatId, text: &str) -> IncomingUpdate {
        IncomingUpdate::Command(Command::parse(chat, text).unwrap())
    }

    fn press(chat: ChatId, data: &str) -> IncomingUpdate {
        IncomingUpdate::Callback(CallbackQuery {
            chat_id: chat,
            user_id: UserId(chat.0),
            callback_id: "cb-1".to_string(),
            data: data.to_string(),
            message: Some(MessageRef {
                chat_id: chat,
                message_id: MessageId(500),
            }),
        })
    }

    fn count(core: &BotCore, label: &str) -> u64 {
        core.counter()
            .snapshot(core.registry())
            .unwrap()
            .entries
            .into_iter()
            .find(|e| e.label == label)
            .map(|e| e.count)
            .unwrap_or(0)
    }

    fn last_text(messenger: &FakeMessenger, chat: ChatId) -> String {
        messenger
            .messages_to(chat)
            .last()
            .map(|m| m.html.clone())
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn start_without_payload_shows_home() {
        let (core, messenger) = bot();
        core.handle(command(USER, "/start")).await.unwrap();

        assert!(last_text(&messenger, USER).contains("Bem-vindo"));
        assert_eq!(count(&core, labels::START), 1);
    }

    #[tokio::test]
    async fn start_with_product_payload_records_only_product_label() {
        let (core, messenger) = bot();
        core.handle(command(USER, "/start finance")).await.unwrap();

        assert!(last_text(&messenger, USER).contains("LociOne Finance"));
        assert_eq!(count(&core, labels::OPEN_FINANCE), 1);
        assert_eq!(count(&core, labels::START), 0);

        core.handle(command(USER, "/start desk")).await.unwrap();
        assert_eq!(count(&core, labels::OPEN_DESK), 1);
    }

    #[tokio::test]
    async fn start_with_unknown_payload_falls_back_to_home() {
        let (core, messenger) = bot();
        core.handle(command(USER, "/start promo2024")).await.unwrap();
        assert!(last_text(&messenger, USER).contains("Bem-vindo"));
        assert_eq!(count(&core, labels::START), 1);
    }

    #[tokio::test]
    async fn link_commands_reply_with_urls() {
        let (core, messenger) = bot();
        core.handle(command(USER, "/site")).await.unwrap();
        assert!(last_text(&messenger, USER).contains(&Links::default().site));

        core.handle(command(USER, "/canal")).await.unwrap();
        assert!(last_text(&messenger, USER).contains("t.me/locione_app"));

        core.handle(command(USER, "/myid")).await.unwrap();
        assert_eq!(last_text(&messenger, USER), "🆔 Seu chat_id: 42");
    }

    #[tokio::test]
    async fn subscribe_and_unsubscribe_commands() {
        let (core, messenger) = bot();

        core.handle(command(USER, "/subscribe")).await.unwrap();
        assert_eq!(last_text(&messenger, USER), "✅ Inscrito nas novidades.");
        core.handle(command(USER, "/subscribe")).await.unwrap();
        assert_eq!(last_text(&messenger, USER), "✅ Você já está inscrito.");
        assert_eq!(core.registry().count().unwrap(), 1);
        assert_eq!(count(&core, labels::SUB_NEW_CMD), 1);
        assert_eq!(count(&core, labels::SUB_EXISTING_CMD), 1);

        core.handle(command(USER, "/unsubscribe")).await.unwrap();
        assert_eq!(last_text(&messenger, USER), "🛑 Inscrição removida.");
        core.handle(command(USER, "/unsubscribe")).await.unwrap();
        assert_eq!(last_text(&messenger, USER), "Você não estava inscrito.");
        assert_eq!(core.registry().count().unwrap(), 0);
        assert_eq!(count(&core, labels::SUB_REMOVED_CMD), 1);
        assert_eq!(count(&core, labels::SUB_REMOVED_NOOP_CMD), 1);
    }

    #[tokio::test]
    async fn stats_lists_counters_and_subscribers() {
        let (core, messenger) = bot();
        core.handle(command(USER, "/finance")).await.unwrap();
        core.handle(command(USER, "/subscribe")).await.unwrap();
        core.handle(command(USER, "/stats")).await.unwrap();

        let text = last_text(&messenger, USER);
        assert!(text.contains("• open_finance: 1"));
        assert!(text.contains("• sub_new_cmd: 1"));
        assert!(text.contains("👥 inscritos: 1"));
    }

    #[tokio::test]
    async fn unknown_inputs_are_ignored() {
        let (core, messenger) = bot();
        core.handle(command(USER, "/help")).await.unwrap();
        core.handle(press(USER, "does_not_exist")).await.unwrap();

        assert!(messenger.log().is_empty());
        assert!(core.counter().snapshot(core.registry()).unwrap().entries.is_empty());
    }

    #[tokio::test]
    async fn product_button_edits_in_place() {
        let (core, messenger) = bot();
        core.handle(press(USER, "app_desk")).await.unwrap();

        let log = messenger.log();
        assert!(matches!(&log[0], Sent::CallbackAnswer { text: None, .. }));
        match &log[1] {
            Sent::Edit { target, msg } => {
                assert_eq!(target.message_id, MessageId(500));
                assert!(msg.html.contains("LociOne Desk"));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(count(&core, labels::OPEN_DESK), 1);
    }

    #[tokio::test]
    async fn subscribe_button_survives_callback_and_edit_failures() {
        let (core, messenger) = bot();
        messenger.fail_answers();
        messenger.fail_edits();

        core.handle(press(USER, "sub_on")).await.unwrap();
        assert_eq!(
            last_text(&messenger, USER),
            "✅ Pronto! Você vai receber novidades da LociOne."
        );
        core.handle(press(USER, "sub_on")).await.unwrap();
        assert_eq!(last_text(&messenger, USER), "ℹ️ Você já estava inscrito.");

        assert_eq!(core.registry().count().unwrap(), 1);
        assert_eq!(count(&core, labels::SUB_NEW), 1);
        assert_eq!(count(&core, labels::SUB_EXISTING), 1);
    }

    #[tokio::test]
    async fn subscribe_button_toasts() {
        let (core, messenger) = bot();
        core.handle(press(USER, "sub_on")).await.unwrap();
        assert!(matches!(
            &messenger.log()[0],
            Sent::CallbackAnswer { text: Some(t), .. } if t == "Inscrito ✅"
        ));
    }

    #[tokio::test]
    async fn back_redraws_menu_without_counting() {
        let (core, messenger) = bot();
        core.handle(press(USER, "back")).await.unwrap();

        match messenger.log().last() {
            Some(Sent::Edit { msg, .. }) => {
                assert_eq!(msg.html, crate::menu::MENU_PROMPT);
                assert_eq!(msg.keyboard.as_ref().unwrap().rows.len(), 5);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(core.counter().snapshot(core.registry()).unwrap().entries.is_empty());
    }

    #[tokio::test]
    async fn broadcast_from_non_admin_is_denied() {
        let (core, messenger) = bot();
        core.handle(command(USER, "/subscribe")).await.unwrap();
        core.handle(command(USER, "/broadcast hello")).await.unwrap();

        assert_eq!(last_text(&messenger, USER), "⛔ Comando restrito ao admin.");
        assert_eq!(count(&core, labels::BROADCAST_SENT), 0);
        assert_eq!(messenger.messages_to(USER).len(), 2);
    }

    #[tokio::test]
    async fn broadcast_from_admin_reports_counts() {
        let (core, messenger) = bot();
        core.handle(command(USER, "/subscribe")).await.unwrap();
        core.handle(command(ChatId(7), "/subscribe")).await.unwrap();
        messenger.fail_chats([ChatId(7)]);

        core.handle(command(ADMIN, "/broadcast  Nova *versão*"))
            .await
            .unwrap();

        assert_eq!(last_text(&messenger, USER), "Nova <b>versão</b>");
        assert_eq!(
            last_text(&messenger, ADMIN),
            "✅ Broadcast concluído.\n\nEnviados: 1\nFalhas: 1\nTotal: 2"
        );
        assert_eq!(count(&core, labels::BROADCAST_SENT), 1);
    }

    #[tokio::test]
    async fn broadcast_without_text_shows_usage() {
        let (core, messenger) = bot();
        core.handle(command(ADMIN, "/broadcast")).await.unwrap();
        assert_eq!(
            last_text(&messenger, ADMIN),
            "Uso: /broadcast sua mensagem aqui"
        );
    }

    #[tokio::test]
    async fn counter_failures_do_not_block_replies() {
        let messenger = Arc::new(FakeMessenger::new());
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let core = BotCore::new(
            messenger.clone(),
            Arc::new(FailingStore),
            store,
            Links::default(),
            None,
        );

        core.handle(command(USER, "/finance")).await.unwrap();
        core.handle(command(USER, "/subscribe")).await.unwrap();

        assert_eq!(messenger.messages_to(USER).len(), 2);
        assert_eq!(core.registry().count().unwrap(), 1);
    }
}
