use std::future::Future;

use {
    async_trait::async_trait,
    pixelbot_common::types::{DeviceId, SessionId},
    pixelbot_devices::NotifyEvent,
    pixelbot_sessions::SessionGuard,
};

/// What a handler gets: the session, exclusive access to its state and the
/// input that triggered it.
pub struct Context<S> {
    pub session: SessionId,
    pub state: SessionGuard<S>,
    /// Message text or callback value.
    pub input: String,
    /// Text after the command token; empty for callbacks and free text.
    pub args: String,
}

/// Chat-side handler (command, callback or free-form text).
#[async_trait]
pub trait Handler<S>: Send + Sync {
    async fn handle(&self, ctx: Context<S>) -> anyhow::Result<()>;
}

#[async_trait]
impl<S, F, Fut> Handler<S> for F
where
    S: Send + 'static,
    F: Fn(Context<S>) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    async fn handle(&self, ctx: Context<S>) -> anyhow::Result<()> {
        self(ctx).await
    }
}

/// Where a batch of notify events came from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotifyOrigin {
    pub session: Option<SessionId>,
    pub device: Option<DeviceId>,
}

/// Receives decoded device notifications. Fan-out to subscribers is the
/// handler's job.
#[async_trait]
pub trait NotifyHandler: Send + Sync {
    async fn on_notify(&self, origin: NotifyOrigin, events: Vec<NotifyEvent>)
    -> anyhow::Result<()>;
}
