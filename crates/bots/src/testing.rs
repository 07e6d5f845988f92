//! In-memory device link, content source and a wired-up bot for tests.

use std::{
    collections::{HashMap, HashSet},
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use {
    async_trait::async_trait,
    pixelbot_channels::{InboundUnit, Replier, testing::RecordingOutbound},
    pixelbot_common::types::{DeviceId, NotifyFrame, SessionId},
    pixelbot_config::BotKind,
    pixelbot_devices::{
        BindScope, Device, DeviceLink, DeviceRegistry, PixelMug, RpcBridge, RpcCallResult,
        RpcEnvelope, RpcErrorKind, RpcReply, RpcRequest,
    },
    pixelbot_media::{ContentSource, ValidatedContent, ValidationRules, validate},
    pixelbot_routing::Routed,
    pixelbot_sessions::{SessionStore, Subscriptions},
    serde_json::Value,
};

use crate::{
    Installed, install,
    services::{BotServices, PlayerSettings},
    text::ShowTextEncoder,
};

pub(crate) const CHAT: i64 = 42;

pub(crate) fn chat() -> SessionId {
    SessionId::from(CHAT)
}

/// Answers every call synchronously from a table of canned values.
#[derive(Default)]
pub(crate) struct ScriptedLink {
    calls: Mutex<Vec<(DeviceId, RpcRequest)>>,
    values: Mutex<HashMap<String, Value>>,
    rejected: Mutex<HashSet<String>>,
    delay: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedLink {
    pub(crate) fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Default::default()
        }
    }

    pub(crate) fn answer(&self, method: &str, value: Value) {
        self.values
            .lock()
            .unwrap()
            .insert(method.to_string(), value);
    }

    pub(crate) fn reject(&self, method: &str) {
        self.rejected.lock().unwrap().insert(method.to_string());
    }

    pub(crate) fn calls(&self) -> Vec<(DeviceId, RpcRequest)> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn methods(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .map(|(_, r)| r.method().to_string())
            .collect()
    }

    /// `url` of every `talPlayGif` sent, in order.
    pub(crate) fn played(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|(_, r)| r.method() == "talPlayGif")
            .filter_map(|(_, r)| r.params()["gifContent"]["url"].as_str().map(String::from))
            .collect()
    }

    pub(crate) fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DeviceLink for ScriptedLink {
    async fn send(&self, envelope: &RpcEnvelope) -> pixelbot_devices::Result<Option<RpcReply>> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let mut results = Vec::new();
        for call in &envelope.calls {
            self.calls
                .lock()
                .unwrap()
                .push((envelope.device.clone(), call.clone()));
            let result = if self.rejected.lock().unwrap().contains(call.method()) {
                RpcCallResult::failed(RpcErrorKind::Busy)
            } else {
                let value = self
                    .values
                    .lock()
                    .unwrap()
                    .get(call.method())
                    .cloned()
                    .unwrap_or(Value::Null);
                RpcCallResult::ok(value)
            };
            results.push(result);
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(Some(RpcReply {
            id: envelope.id,
            results,
        }))
    }
}

/// Serves canned bytes by source string, validated like the real fetcher.
#[derive(Default)]
pub(crate) struct FakeContent {
    items: HashMap<String, Vec<u8>>,
    rules: ValidationRules,
}

impl FakeContent {
    #[must_use]
    pub(crate) fn with(mut self, source: &str, bytes: Vec<u8>) -> Self {
        self.items.insert(source.to_string(), bytes);
        self
    }
}

#[async_trait]
impl ContentSource for FakeContent {
    async fn load(&self, source: &str) -> pixelbot_media::Result<ValidatedContent> {
        let Some(bytes) = self.items.get(source) else {
            return Err(pixelbot_media::Error::Status {
                url: source.to_string(),
                status: 404,
            });
        };
        Ok(validate(bytes, &self.rules)?)
    }
}

/// A GIF89a header declaring `width`x`height`, padded to `len` bytes.
pub(crate) fn gif(width: u16, height: u16, len: usize) -> Vec<u8> {
    let mut buf = b"GIF89a".to_vec();
    buf.extend_from_slice(&width.to_le_bytes());
    buf.extend_from_slice(&height.to_le_bytes());
    buf.resize(len.max(buf.len()), 0);
    buf
}

pub(crate) struct Harness {
    pub outbound: Arc<RecordingOutbound>,
    pub link: Arc<ScriptedLink>,
    pub svc: Arc<BotServices>,
    pub installed: Installed,
}

impl Harness {
    pub(crate) fn new(kind: BotKind) -> Self {
        Self::build(
            kind,
            ScriptedLink::default(),
            PlayerSettings::default(),
            FakeContent::default(),
        )
    }

    pub(crate) fn build(
        kind: BotKind,
        link: ScriptedLink,
        player: PlayerSettings,
        content: FakeContent,
    ) -> Self {
        let registry = Arc::new(DeviceRegistry::new());
        let mugs: Vec<Arc<PixelMug>> = ["mug-1", "mug-2"]
            .into_iter()
            .map(|id| Arc::new(PixelMug::new(DeviceId::new(id).unwrap())))
            .collect();
        let devices: Vec<Arc<dyn Device>> = mugs
            .iter()
            .map(|m| Arc::clone(m) as Arc<dyn Device>)
            .collect();
        registry.bind(BindScope::Global, &devices);

        let link = Arc::new(link);
        let bridge = Arc::new(RpcBridge::new(
            registry,
            Arc::clone(&link) as Arc<dyn DeviceLink>,
        ));
        let outbound = Arc::new(RecordingOutbound::default());
        let svc = Arc::new(BotServices {
            replier: Replier::new(outbound.clone(), "test"),
            bridge,
            sessions: Arc::new(SessionStore::new()),
            subscriptions: Arc::new(Subscriptions::new()),
            content: Arc::new(content),
            text: Arc::new(ShowTextEncoder),
            mugs,
            player,
        });
        let installed = install(kind, Arc::clone(&svc)).unwrap();
        Self {
            outbound,
            link,
            svc,
            installed,
        }
    }

    pub(crate) async fn message(&self, text: &str) -> Routed {
        self.installed
            .router
            .dispatch(InboundUnit::message(chat(), text))
            .await
    }

    pub(crate) async fn click(&self, value: &str) -> Routed {
        self.installed
            .router
            .dispatch(InboundUnit::callback(chat(), value))
            .await
    }

    pub(crate) async fn notify(&self, frames: Vec<NotifyFrame>) -> Routed {
        let unit = InboundUnit::notify(DeviceId::new("mug-1").ok(), frames);
        self.installed.router.dispatch(unit).await
    }

    pub(crate) fn texts(&self) -> Vec<String> {
        self.outbound.texts_to(&CHAT.to_string())
    }

    pub(crate) fn last_text(&self) -> Option<String> {
        self.texts().pop()
    }
}
