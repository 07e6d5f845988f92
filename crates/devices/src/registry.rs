//! Which devices are bound to the runtime, to which sessions, and which
//! session device-originated activity currently belongs to.

use std::{
    collections::{BTreeSet, HashMap, HashSet},
    sync::{Arc, RwLock},
};

use {
    pixelbot_common::types::{DeviceId, SessionId},
    serde::Serialize,
    tokio::sync::broadcast,
    tracing::{debug, info},
};

use crate::{Error, Result, device::Device};

/// Where a binding applies.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "session", rename_all = "snake_case")]
pub enum BindScope {
    /// Every session may route RPCs to the device.
    Global,
    Session(SessionId),
}

/// Proof that `session` may route RPCs to `device`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Binding {
    pub session: SessionId,
    pub device: DeviceId,
    pub scope: BindScope,
}

/// Out-of-band events the controlling application reacts to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeviceEvent {
    /// A device was newly bound; the hosting platform must run its attach
    /// flow (e.g. the user attaching real hardware to the bot).
    AttachRequested {
        scope: BindScope,
        device: DeviceId,
        class: String,
    },
}

/// Snapshot of one device for listings.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceSummary {
    pub device: DeviceId,
    pub class: String,
    pub global: bool,
    pub sessions: Vec<SessionId>,
}

#[derive(Default)]
struct Inner {
    devices: HashMap<DeviceId, Arc<dyn Device>>,
    global: HashSet<DeviceId>,
    /// session → devices bound to it alone
    by_session: HashMap<SessionId, HashSet<DeviceId>>,
    associated: Option<SessionId>,
}

/// Registry of bound devices. Read-mostly; the lock is never held across an
/// await point.
pub struct DeviceRegistry {
    inner: RwLock<Inner>,
    events: broadcast::Sender<DeviceEvent>,
}

impl Default for DeviceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceRegistry {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            inner: RwLock::new(Inner::default()),
            events,
        }
    }

    /// Receive attach requests emitted by [`bind`](Self::bind).
    pub fn subscribe(&self) -> broadcast::Receiver<DeviceEvent> {
        self.events.subscribe()
    }

    /// Make devices eligible for RPC routing within `scope`.
    ///
    /// Idempotent: re-binding an already bound device in the same scope is a
    /// no-op. Returns the ids that were newly bound.
    pub fn bind(&self, scope: BindScope, devices: &[Arc<dyn Device>]) -> Vec<DeviceId> {
        let mut fresh = Vec::new();
        {
            let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
            for device in devices {
                let id = device.id().clone();
                inner
                    .devices
                    .entry(id.clone())
                    .or_insert_with(|| Arc::clone(device));
                let inserted = match &scope {
                    BindScope::Global => inner.global.insert(id.clone()),
                    BindScope::Session(session) => inner
                        .by_session
                        .entry(session.clone())
                        .or_default()
                        .insert(id.clone()),
                };
                if inserted {
                    fresh.push((id, device.class().to_string()));
                } else {
                    debug!(device = %id, "device already bound, ignoring");
                }
            }
        }

        fresh
            .into_iter()
            .map(|(device, class)| {
                info!(device = %device, class, scope = ?scope, "device bound");
                // No receivers is fine: nobody is driving an attach flow.
                let _ = self.events.send(DeviceEvent::AttachRequested {
                    scope: scope.clone(),
                    device: device.clone(),
                    class,
                });
                device
            })
            .collect()
    }

    /// Resolve the binding that permits `session` to reach `device`.
    pub fn resolve_binding(&self, session: &SessionId, device: &DeviceId) -> Result<Binding> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        let scope = if inner
            .by_session
            .get(session)
            .is_some_and(|set| set.contains(device))
        {
            BindScope::Session(session.clone())
        } else if inner.global.contains(device) {
            BindScope::Global
        } else {
            return Err(Error::unbound(session, device));
        };
        Ok(Binding {
            session: session.clone(),
            device: device.clone(),
            scope,
        })
    }

    pub fn device(&self, id: &DeviceId) -> Option<Arc<dyn Device>> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner.devices.get(id).cloned()
    }

    /// Record the session that device-originated activity belongs to.
    pub fn associate(&self, session: &SessionId) {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        if inner.associated.as_ref() != Some(session) {
            debug!(session = %session, "device activity now associated with session");
            inner.associated = Some(session.clone());
        }
    }

    pub fn associated_session(&self) -> Option<SessionId> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner.associated.clone()
    }

    pub fn list(&self) -> Vec<DeviceSummary> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        let mut out: Vec<DeviceSummary> = inner
            .devices
            .iter()
            .map(|(id, device)| {
                let sessions: BTreeSet<SessionId> = inner
                    .by_session
                    .iter()
                    .filter(|(_, set)| set.contains(id))
                    .map(|(s, _)| s.clone())
                    .collect();
                DeviceSummary {
                    device: id.clone(),
                    class: device.class().to_string(),
                    global: inner.global.contains(id),
                    sessions: sessions.into_iter().collect(),
                }
            })
            .collect();
        out.sort_by(|a, b| a.device.cmp(&b.device));
        out
    }

    pub fn count(&self) -> usize {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner.devices.len()
    }
}
