use std::error::Error as StdError;

use pixelbot_common::types::{DeviceId, SessionId};

/// Crate-wide result type for device operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Typed device errors shared by the registry, the bridge and the link.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The session has no binding to the device. Programmer error: never
    /// retried, and no frame is sent.
    #[error("device {device} is not bound to session {session}")]
    UnboundDevice { session: SessionId, device: DeviceId },

    /// The channel could not deliver the request.
    #[error("device transport failed: {context}")]
    Transport {
        context: String,
        #[source]
        source: Option<Box<dyn StdError + Send + Sync>>,
    },

    /// No reply arrived within the bounded wait.
    #[error("device did not answer '{method}' within {timeout_ms}ms")]
    DeviceTimeout { method: String, timeout_ms: u64 },

    /// The request is not part of the device's catalogue or is malformed.
    #[error("invalid device request: {message}")]
    InvalidRequest { message: String },

    /// A reply arrived but does not line up with the request batch.
    #[error("malformed device reply: {message}")]
    MalformedReply { message: String },

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    #[must_use]
    pub fn unbound(session: &SessionId, device: &DeviceId) -> Self {
        Self::UnboundDevice {
            session: session.clone(),
            device: device.clone(),
        }
    }

    #[must_use]
    pub fn transport(context: impl Into<String>) -> Self {
        Self::Transport {
            context: context.into(),
            source: None,
        }
    }

    #[must_use]
    pub fn transport_with(
        context: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::Transport {
            context: context.into(),
            source: Some(Box::new(source)),
        }
    }

    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn malformed_reply(message: impl Into<String>) -> Self {
        Self::MalformedReply {
            message: message.into(),
        }
    }

    /// Whether retrying the same call could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::DeviceTimeout { .. })
    }
}
