use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use {pixelbot_channels::InboundSink, tokio_util::sync::CancellationToken};

use crate::config::TelegramAccountConfig;

/// Shared account state map.
pub type AccountStateMap = Arc<RwLock<HashMap<String, AccountState>>>;

/// Per-account runtime state.
pub struct AccountState {
    pub bot: teloxide::Bot,
    pub bot_username: Option<String>,
    pub account_id: String,
    pub config: TelegramAccountConfig,
    pub cancel: CancellationToken,
    /// Where polled updates go, already converted to inbound units.
    pub sink: Arc<dyn InboundSink>,
}
