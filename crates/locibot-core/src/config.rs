use std::{
    env,
    path::{Path, PathBuf},
};

use url::Url;

use crate::{domain::ChatId, errors::Error, Result};

const DB_FILE_NAME: &str = "bot.sqlite";

/// Destination URLs shown on the menu and broadcast buttons.
///
/// Fixed at startup; never mutated while the bot runs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Links {
    pub finance_ios: String,
    pub desk_download: String,
    pub site: String,
    pub canal: String,
}

impl Default for Links {
    fn default() -> Self {
        Self {
            finance_ios: "https://apps.apple.com/it/app/locione-finance/id6758838032".to_string(),
            desk_download: "https://locione.com/download?utm_source=telegram&utm_medium=bot&utm_campaign=locione_desk".to_string(),
            site: "https://locione.com?utm_source=telegram&utm_medium=bot&utm_campaign=locione_site"
                .to_string(),
            canal: "https://t.me/locione_app".to_string(),
        }
    }
}

/// Typed configuration for the bot.
#[derive(Clone, Debug)]
pub struct Config {
    pub bot_token: String,
    /// Only this chat may run `/broadcast`. `None` disables broadcasting.
    pub admin_chat_id: Option<ChatId>,
    pub data_dir: PathBuf,
    pub db_path: PathBuf,
    pub links: Links,
}

impl Config {
    /// Load configuration from `.env` (if present) and the process environment.
    pub fn load() -> Result<Self> {
        // Existing env vars win over `.env` entries.
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let bot_token = lookup("BOT_TOKEN")
            .and_then(non_empty)
            .or_else(|| lookup("TELEGRAM_BOT_TOKEN").and_then(non_empty))
            .ok_or_else(|| {
                Error::Config("BOT_TOKEN environment variable is required".to_string())
            })?;

        let admin_chat_id = match lookup("ADMIN_CHAT_ID").and_then(non_empty) {
            Some(raw) => Some(ChatId(raw.trim().parse::<i64>().map_err(|_| {
                Error::Config(format!("ADMIN_CHAT_ID must be an integer chat id, got {raw:?}"))
            })?)),
            None => None,
        };

        let data_dir = match lookup("DATA_DIR").and_then(non_empty) {
            Some(dir) => PathBuf::from(dir),
            None if lookup("RAILWAY_ENVIRONMENT").is_some() => PathBuf::from("/data"),
            None => PathBuf::from(".data"),
        };
        let db_path = data_dir.join(DB_FILE_NAME);

        let defaults = Links::default();
        let links = Links {
            finance_ios: link_override(&lookup, "LINK_FINANCE_IOS", defaults.finance_ios)?,
            desk_download: link_override(&lookup, "LINK_DESK_DOWNLOAD", defaults.desk_download)?,
            site: link_override(&lookup, "LINK_SITE", defaults.site)?,
            canal: link_override(&lookup, "LINK_CANAL", defaults.canal)?,
        };

        Ok(Self {
            bot_token,
            admin_chat_id,
            data_dir,
            db_path,
            links,
        })
    }

    /// Create the data directory if needed.
    pub fn ensure_data_dir(&self) -> Result<&Path> {
        std::fs::create_dir_all(&self.data_dir)?;
        Ok(&self.data_dir)
    }
}

fn link_override(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: String,
) -> Result<String> {
    let Some(raw) = lookup(key).and_then(non_empty) else {
        return Ok(default);
    };
    let raw = raw.trim().to_string();
    Url::parse(&raw).map_err(|e| Error::Config(format!("{key} is not a valid URL: {e}")))?;
    Ok(raw)
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
