//! Telegram channel plugin for pixelbot.
//!
//! Implements `ChannelPlugin` with teloxide: long-polls `getUpdates`, turns
//! messages and callback queries into inbound units, and sends text, inline
//! keyboards and the command menu back.

pub mod bot;
pub mod config;
pub mod error;
pub mod handlers;
pub mod outbound;
pub mod plugin;
pub mod state;

pub use {
    config::TelegramAccountConfig,
    error::{Error, Result},
    outbound::TelegramOutbound,
    plugin::TelegramPlugin,
};
