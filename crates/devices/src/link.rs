//! Delivery of RPC envelopes to the device gateway.

use std::time::Duration;

use {
    async_trait::async_trait,
    reqwest::{Client, StatusCode},
    secrecy::{ExposeSecret, Secret},
    tracing::debug,
};

use crate::{
    Error, Result,
    types::{RpcEnvelope, RpcReply},
};

/// Channel that carries RPC frames to devices.
///
/// A link either answers synchronously (`Some(reply)`) or accepts the frame
/// and lets the reply arrive later through [`RpcBridge::complete`](crate::RpcBridge::complete).
#[async_trait]
pub trait DeviceLink: Send + Sync {
    async fn send(&self, envelope: &RpcEnvelope) -> Result<Option<RpcReply>>;
}

/// Device gateway reached over HTTP: `POST {base_url}/rpc`.
pub struct HttpDeviceLink {
    client: Client,
    endpoint: String,
    token: Option<Secret<String>>,
}

impl HttpDeviceLink {
    pub fn new(base_url: &str, token: Option<Secret<String>>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::transport_with("failed to build device gateway client", e))?;
        Ok(Self {
            client,
            endpoint: format!("{}/rpc", base_url.trim_end_matches('/')),
            token,
        })
    }
}

#[async_trait]
impl DeviceLink for HttpDeviceLink {
    async fn send(&self, envelope: &RpcEnvelope) -> Result<Option<RpcReply>> {
        let mut req = self.client.post(&self.endpoint).json(envelope);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token.expose_secret());
        }

        debug!(
            id = envelope.id,
            device = %envelope.device,
            calls = envelope.calls.len(),
            "sending rpc envelope"
        );

        let resp = req
            .send()
            .await
            .map_err(|e| Error::transport_with(format!("POST {} failed", self.endpoint), e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::transport(format!(
                "device gateway answered {status} for envelope {}",
                envelope.id
            )));
        }
        if status == StatusCode::ACCEPTED || status == StatusCode::NO_CONTENT {
            return Ok(None);
        }

        let body = resp
            .bytes()
            .await
            .map_err(|e| Error::transport_with("failed to read device gateway reply", e))?;
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }

        let reply: RpcReply = serde_json::from_slice(&body)
            .map_err(|e| Error::malformed_reply(format!("unparseable gateway reply: {e}")))?;
        Ok(Some(reply))
    }
}
