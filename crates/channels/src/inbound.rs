//! Inbound units of work and their precedence classification.

use {
    async_trait::async_trait,
    pixelbot_common::types::{DeviceId, NotifyFrame, SessionId},
    serde::{Deserialize, Serialize},
};

/// Everything a single inbound update may carry. Transports fill in what
/// they have; the router decides which part wins via [`InboundUnit::classify`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InboundUnit {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<SessionId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<DeviceId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notify: Vec<NotifyFrame>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// What an inbound unit means, after precedence is applied.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// Device notification frames. Wins over everything else in the unit.
    Notify {
        session: Option<SessionId>,
        device: Option<DeviceId>,
        frames: Vec<NotifyFrame>,
    },
    Callback {
        session: SessionId,
        value: String,
    },
    Message {
        session: SessionId,
        text: String,
    },
    Unknown,
}

impl InboundUnit {
    pub fn message(session: SessionId, text: impl Into<String>) -> Self {
        Self {
            session: Some(session),
            message: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn callback(session: SessionId, value: impl Into<String>) -> Self {
        Self {
            session: Some(session),
            callback: Some(value.into()),
            ..Default::default()
        }
    }

    pub fn notify(device: Option<DeviceId>, frames: Vec<NotifyFrame>) -> Self {
        Self {
            device,
            notify: frames,
            ..Default::default()
        }
    }

    /// Precedence: notify frames, then callback value, then message text.
    /// Empty callback values and texts count as absent; callbacks and
    /// messages need a session.
    pub fn classify(self) -> Inbound {
        let callback = self.callback.filter(|v| !v.is_empty());
        let message = self.message.filter(|t| !t.is_empty());
        match (self.notify.is_empty(), self.session, callback, message) {
            (false, session, ..) => Inbound::Notify {
                session,
                device: self.device,
                frames: self.notify,
            },
            (true, Some(session), Some(value), _) => Inbound::Callback { session, value },
            (true, Some(session), None, Some(text)) => Inbound::Message { session, text },
            _ => Inbound::Unknown,
        }
    }

    /// Session this unit should be serialized on, if any.
    pub fn session_key(&self) -> Option<&SessionId> {
        self.session.as_ref()
    }
}

/// Receiver of inbound units (the router's dispatcher).
#[async_trait]
pub trait InboundSink: Send + Sync {
    async fn submit(&self, unit: InboundUnit);
}
