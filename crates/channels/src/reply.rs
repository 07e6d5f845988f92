use std::sync::Arc;

use {
    pixelbot_common::types::{OutboundContent, SessionId},
    tracing::{debug, warn},
};

use crate::{ChannelOutbound, Result};

/// Sends content to sessions of one channel account.
///
/// Delivery is fire-and-forget for callers: failures are logged and never
/// retried.
#[derive(Clone)]
pub struct Replier {
    outbound: Arc<dyn ChannelOutbound>,
    account_id: String,
}

impl Replier {
    pub fn new(outbound: Arc<dyn ChannelOutbound>, account_id: impl Into<String>) -> Self {
        Self {
            outbound,
            account_id: account_id.into(),
        }
    }

    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    pub fn outbound(&self) -> &Arc<dyn ChannelOutbound> {
        &self.outbound
    }

    pub async fn send(&self, to: &SessionId, content: impl Into<OutboundContent>) {
        if let Err(e) = self.try_send(to, content).await {
            warn!(
                account_id = %self.account_id,
                session = %to,
                error = %e,
                "failed to send message"
            );
        }
    }

    pub async fn try_send(&self, to: &SessionId, content: impl Into<OutboundContent>) -> Result<()> {
        match content.into() {
            OutboundContent::Text(text) => {
                debug!(session = %to, len = text.len(), "sending text");
                self.outbound
                    .send_text(&self.account_id, to.as_str(), &text)
                    .await
            },
            OutboundContent::Keyboard(keyboard) => {
                debug!(session = %to, title = %keyboard.title, "sending keyboard");
                self.outbound
                    .send_keyboard(&self.account_id, to.as_str(), &keyboard)
                    .await
            },
        }
    }
}
