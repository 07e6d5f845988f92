use std::sync::Arc;

use {
    async_trait::async_trait,
    pixelbot_common::types::InlineKeyboard,
    serde::{Deserialize, Serialize},
};

use crate::Result;

// ── Channel events (pub/sub) ────────────────────────────────────────────────

/// Lifecycle events emitted by channel plugins.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChannelEvent {
    AccountStarted {
        channel_type: String,
        account_id: String,
        bot_username: Option<String>,
    },
    /// A channel account stopped itself after an unrecoverable error.
    AccountDisabled {
        channel_type: String,
        account_id: String,
        reason: String,
    },
}

/// A bot command as advertised to the chat platform's command menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    /// Token without the leading slash, e.g. `start`.
    pub command: String,
    pub description: String,
}

impl CommandSpec {
    pub fn new(command: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            description: description.into(),
        }
    }
}

/// Core channel plugin trait. Each messaging platform implements this.
#[async_trait]
pub trait ChannelPlugin: Send + Sync {
    /// Channel identifier (e.g. "telegram").
    fn id(&self) -> &str;

    /// Human-readable channel name.
    fn name(&self) -> &str;

    /// Start an account connection.
    async fn start_account(&mut self, account_id: &str, config: serde_json::Value) -> Result<()>;

    /// Stop an account connection.
    async fn stop_account(&mut self, account_id: &str) -> Result<()>;

    /// Get outbound adapter for sending messages.
    fn outbound(&self) -> Option<Arc<dyn ChannelOutbound>>;
}

/// Send messages to a channel.
#[async_trait]
pub trait ChannelOutbound: Send + Sync {
    async fn send_text(&self, account_id: &str, to: &str, text: &str) -> Result<()>;

    async fn send_keyboard(
        &self,
        account_id: &str,
        to: &str,
        keyboard: &InlineKeyboard,
    ) -> Result<()>;

    /// Publish the command menu. Platforms without one ignore it.
    async fn set_commands(&self, _account_id: &str, _commands: &[CommandSpec]) -> Result<()> {
        Ok(())
    }
}
