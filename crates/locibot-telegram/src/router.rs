use std::sync::Arc;

use teloxide::{
    dispatching::{Dispatcher, ShutdownToken},
    dptree,
    error_handlers::LoggingErrorHandler,
    prelude::*,
    types::BotCommand,
};

use locibot_core::{
    config::Config, messaging::port::MessagingPort, router::BotCore, router::COMMANDS,
    store::SqliteStore,
};

use crate::handlers;
use crate::TelegramMessenger;

#[derive(Clone)]
pub struct AppState {
    pub bot: Bot,
    pub core: BotCore,
}

pub async fn run_polling(cfg: Arc<Config>, store: Arc<SqliteStore>) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.bot_token.clone());

    match bot.get_me().await {
        Ok(me) => tracing::info!(username = %me.username(), "bot connected"),
        Err(e) => tracing::warn!(error = %e, "getMe failed"),
    }
    if cfg.admin_chat_id.is_none() {
        tracing::warn!("ADMIN_CHAT_ID not set, /broadcast is disabled");
    }

    let commands: Vec<BotCommand> = COMMANDS
        .iter()
        .map(|(name, description)| BotCommand::new(*name, *description))
        .collect();
    if let Err(e) = bot.set_my_commands(commands).await {
        tracing::warn!(error = %e, "failed to register bot commands");
    }

    let messenger: Arc<dyn MessagingPort> = Arc::new(TelegramMessenger::new(bot.clone()));
    let core = BotCore::from_config(&cfg, messenger, store);

    let state = Arc::new(AppState {
        bot: bot.clone(),
        core,
    });

    let handler = dptree::entry()
        .branch(Update::filter_callback_query().endpoint(handlers::handle_callback))
        .branch(Update::filter_message().endpoint(handlers::handle_message));

    let mut dispatcher = Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .default_handler(|_upd| async {})
        .error_handler(LoggingErrorHandler::with_custom_text(
            "An error has occurred in the dispatcher",
        ))
        .enable_ctrlc_handler()
        .build();

    spawn_sigterm_handler(dispatcher.shutdown_token());

    tracing::info!("dispatching updates");
    dispatcher.dispatch().await;
    tracing::info!("bot stopped");

    Ok(())
}

/// Ctrl-C is handled by the dispatcher itself; this covers SIGTERM.
fn spawn_sigterm_handler(token: ShutdownToken) {
    #[cfg(unix)]
    tokio::spawn(async move {
        use tokio::signal::unix::{signal, SignalKind};

        let Ok(mut term) = signal(SignalKind::terminate()) else {
            tracing::warn!("failed to install SIGTERM handler");
            return;
        };
        term.recv().await;
        tracing::info!("SIGTERM received, shutting down");
        if let Ok(done) = token.shutdown() {
            done.await;
        }
    });

    #[cfg(not(unix))]
    let _ = token;
}
