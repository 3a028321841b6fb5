//! Telegram session plumbing for the bridge.
//!
//! Uses teloxide against the Bot API: a manual long-polling loop feeding the
//! Telegram → Delta Chat handler, the `/start` and `/id` commands, and the
//! outbound sender used by the Delta Chat → Telegram worker. The update
//! offset is persisted to a session file which token rotation invalidates.

pub mod bot;
pub mod fetch;
pub mod handlers;
pub mod outbound;
pub mod plugin;
pub mod session;

pub use {
    bot::{SessionDeps, start_session},
    fetch::TelegramFetcher,
    outbound::TelegramOutbound,
    plugin::BridgePlugin,
    session::SessionState,
};
