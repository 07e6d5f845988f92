//! In-memory outbound channel for tests.

use std::sync::Mutex;

use {async_trait::async_trait, pixelbot_common::types::InlineKeyboard};

use crate::{ChannelOutbound, CommandSpec, Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Text { to: String, text: String },
    Keyboard { to: String, keyboard: InlineKeyboard },
}

/// Records everything sent through it.
#[derive(Default)]
pub struct RecordingOutbound {
    sent: Mutex<Vec<Sent>>,
    commands: Mutex<Vec<CommandSpec>>,
    fail: bool,
}

impl RecordingOutbound {
    /// An outbound whose every delivery fails.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Texts sent to `to`, in order.
    pub fn texts_to(&self, to: &str) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Text { to: t, text } if t == to => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn keyboards_to(&self, to: &str) -> Vec<InlineKeyboard> {
        self.sent()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Keyboard { to: t, keyboard } if t == to => Some(keyboard),
                _ => None,
            })
            .collect()
    }

    pub fn commands(&self) -> Vec<CommandSpec> {
        self.commands
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }

    fn push(&self, to: &str, item: Sent) -> Result<()> {
        if self.fail {
            return Err(Error::delivery(to, "recording outbound set to fail"));
        }
        self.sent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(item);
        Ok(())
    }
}

#[async_trait]
impl ChannelOutbound for RecordingOutbound {
    async fn send_text(&self, _account_id: &str, to: &str, text: &str) -> Result<()> {
        self.push(to, Sent::Text {
            to: to.to_string(),
            text: text.to_string(),
        })
    }

    async fn send_keyboard(
        &self,
        _account_id: &str,
        to: &str,
        keyboard: &InlineKeyboard,
    ) -> Result<()> {
        self.push(to, Sent::Keyboard {
            to: to.to_string(),
            keyboard: keyboard.clone(),
        })
    }

    async fn set_commands(&self, _account_id: &str, commands: &[CommandSpec]) -> Result<()> {
        *self.commands.lock().unwrap_or_else(|e| e.into_inner()) = commands.to_vec();
        Ok(())
    }
}
