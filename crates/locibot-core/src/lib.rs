//! Core domain + application logic for the LociOne Telegram bot.
//!
//! This crate is intentionally framework-agnostic. Telegram and the SQLite file
//! are reached through ports (traits); the Telegram adapter lives in
//! `locibot-telegram`.

pub mod broadcast;
pub mod config;
pub mod domain;
pub mod errors;
pub mod formatting;
pub mod logging;
pub mod menu;
pub mod messaging;
pub mod ports;
pub mod router;
pub mod stats;
pub mod store;
pub mod subscribers;

#[cfg(test)]
pub(crate) mod testing;

pub use errors::{Error, Result};
