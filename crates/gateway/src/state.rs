use std::sync::Arc;

use {
    pixelbot_channels::InboundSink,
    pixelbot_devices::{DeviceRegistry, RpcBridge},
    secrecy::{ExposeSecret, Secret},
};

/// Everything the device callback routes need.
#[derive(Clone)]
pub struct GatewayState {
    pub sink: Arc<dyn InboundSink>,
    pub bridge: Arc<RpcBridge>,
    pub registry: Arc<DeviceRegistry>,
    pub version: String,
    /// Bearer token the device gateway must present. `None` leaves the
    /// routes open (loopback deployments).
    token: Option<Arc<Secret<String>>>,
}

impl GatewayState {
    pub fn new(sink: Arc<dyn InboundSink>, bridge: Arc<RpcBridge>) -> Self {
        let registry = Arc::clone(bridge.registry());
        Self {
            sink,
            bridge,
            registry,
            version: env!("CARGO_PKG_VERSION").to_string(),
            token: None,
        }
    }

    #[must_use]
    pub fn with_token(mut self, token: Option<Secret<String>>) -> Self {
        self.token = token
            .filter(|t| !t.expose_secret().is_empty())
            .map(Arc::new);
        self
    }

    /// Check an `Authorization` header value against the configured token.
    pub fn authorized(&self, header: Option<&str>) -> bool {
        let Some(expected) = &self.token else {
            return true;
        };
        header
            .and_then(|h| h.strip_prefix("Bearer "))
            .is_some_and(|given| given == expected.expose_secret())
    }
}
