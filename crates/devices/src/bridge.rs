//! RPC Bridge: send calls to a bound device and correlate the reply.
//!
//! Every call resolves its binding before touching the link, holds a
//! per-device lock for the whole round trip (one frame in flight per
//! device) and waits a bounded time for the reply. Replies either come back
//! synchronously from the link or later through [`RpcBridge::complete`].

use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex, MutexGuard,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use {
    pixelbot_common::types::{DeviceId, SessionId},
    tokio::sync::{Mutex as AsyncMutex, oneshot},
    tracing::{debug, warn},
};

use crate::{
    Error, Result,
    link::DeviceLink,
    registry::DeviceRegistry,
    types::{RpcEnvelope, RpcReply, RpcRequest, RpcResponse},
};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

type PendingMap = HashMap<u64, oneshot::Sender<RpcReply>>;

pub struct RpcBridge {
    registry: Arc<DeviceRegistry>,
    link: Arc<dyn DeviceLink>,
    pending: Mutex<PendingMap>,
    next_id: AtomicU64,
    timeout: Duration,
    device_locks: Mutex<HashMap<DeviceId, Arc<AsyncMutex<()>>>>,
}

impl RpcBridge {
    pub fn new(registry: Arc<DeviceRegistry>, link: Arc<dyn DeviceLink>) -> Self {
        Self {
            registry,
            link,
            pending: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            timeout: DEFAULT_TIMEOUT,
            device_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Bound the wait for a reply. Zero is clamped to one millisecond so a
    /// call can never wait forever.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout.max(Duration::from_millis(1));
        self
    }

    pub fn registry(&self) -> &Arc<DeviceRegistry> {
        &self.registry
    }

    /// Issue one call.
    pub async fn call(
        &self,
        session: &SessionId,
        device: &DeviceId,
        request: RpcRequest,
    ) -> Result<RpcResponse> {
        self.call_batch(session, device, vec![request]).await
    }

    /// Issue several calls in one frame. Results keep submission order.
    pub async fn call_batch(
        &self,
        session: &SessionId,
        device: &DeviceId,
        calls: Vec<RpcRequest>,
    ) -> Result<RpcResponse> {
        let binding = self.registry.resolve_binding(session, device)?;
        if calls.is_empty() {
            return Err(Error::invalid_request("empty rpc batch"));
        }

        let lock = self.device_lock(device);
        let _guard = lock.lock().await;

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let method = calls
            .iter()
            .map(RpcRequest::method)
            .collect::<Vec<_>>()
            .join(",");
        let expected = calls.len();
        let envelope = RpcEnvelope {
            id,
            session: binding.session,
            device: binding.device,
            calls,
        };

        let (tx, rx) = oneshot::channel();
        self.pending_map().insert(id, tx);

        debug!(id, session = %session, device = %device, method = %method, "device rpc");

        let reply = match self.link.send(&envelope).await {
            Err(e) => {
                self.pending_map().remove(&id);
                warn!(id, device = %device, method = %method, error = %e, "device rpc not delivered");
                return Err(e);
            },
            Ok(Some(reply)) => {
                self.pending_map().remove(&id);
                reply
            },
            Ok(None) => match tokio::time::timeout(self.timeout, rx).await {
                Ok(Ok(reply)) => reply,
                Ok(Err(_)) => {
                    return Err(Error::transport(format!(
                        "reply channel for rpc {id} closed"
                    )));
                },
                Err(_) => {
                    self.pending_map().remove(&id);
                    warn!(id, device = %device, method = %method, "device rpc timed out");
                    return Err(Error::DeviceTimeout {
                        method,
                        timeout_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
                    });
                },
            },
        };

        if reply.id != id {
            return Err(Error::malformed_reply(format!(
                "reply id {} does not match request {id}",
                reply.id
            )));
        }
        if reply.results.len() != expected {
            return Err(Error::malformed_reply(format!(
                "expected {expected} results, got {}",
                reply.results.len()
            )));
        }

        self.registry.associate(session);
        Ok(RpcResponse {
            results: reply.results,
        })
    }

    /// Deliver an asynchronous reply. Returns `false` when no call is waiting
    /// for this id (unknown, already timed out or already answered).
    pub fn complete(&self, reply: RpcReply) -> bool {
        let Some(tx) = self.pending_map().remove(&reply.id) else {
            debug!(id = reply.id, "reply for unknown rpc id");
            return false;
        };
        tx.send(reply).is_ok()
    }

    pub fn pending_count(&self) -> usize {
        self.pending_map().len()
    }

    fn pending_map(&self) -> MutexGuard<'_, PendingMap> {
        self.pending.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn device_lock(&self, device: &DeviceId) -> Arc<AsyncMutex<()>> {
        let mut locks = self.device_locks.lock().unwrap_or_else(|e| e.into_inner());
        Arc::clone(locks.entry(device.clone()).or_default())
    }
}
