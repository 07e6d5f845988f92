//! Wire and domain types for device RPC.

use {
    pixelbot_common::types::{DeviceId, SessionId},
    serde::{Deserialize, Serialize},
    serde_json::{Map, Value},
};

/// A single device call. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcRequest {
    method: String,
    #[serde(default)]
    params: Map<String, Value>,
}

impl RpcRequest {
    /// Build a request. Non-object `params` are treated as "no parameters".
    pub fn new(method: impl Into<String>, params: Value) -> Self {
        let params = match params {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self {
            method: method.into(),
            params,
        }
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn params(&self) -> &Map<String, Value> {
        &self.params
    }

    /// Copy of this request with one parameter replaced or added.
    #[must_use]
    pub fn with_param(&self, key: impl Into<String>, value: Value) -> Self {
        let mut next = self.clone();
        next.params.insert(key.into(), value);
        next
    }
}

/// Failure categories a device may report for one call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RpcErrorKind {
    InvalidParams,
    MethodNotFound,
    Busy,
    Internal,
    #[serde(untagged)]
    Other(String),
}

/// Result of one call inside a (possibly batched) request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcCallResult {
    pub ok: bool,
    #[serde(default)]
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcErrorKind>,
}

impl RpcCallResult {
    pub fn ok(value: Value) -> Self {
        Self {
            ok: true,
            value,
            error: None,
        }
    }

    pub fn failed(error: RpcErrorKind) -> Self {
        Self {
            ok: false,
            value: Value::Null,
            error: Some(error),
        }
    }
}

/// Ordered per-call results; order matches request submission order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RpcResponse {
    pub results: Vec<RpcCallResult>,
}

impl RpcResponse {
    /// Value of the first call, if it succeeded.
    pub fn first_value(&self) -> Option<&Value> {
        self.results.first().filter(|r| r.ok).map(|r| &r.value)
    }

    pub fn number(&self) -> Option<f64> {
        self.first_value().and_then(Value::as_f64)
    }

    pub fn boolean(&self) -> Option<bool> {
        self.first_value().and_then(Value::as_bool)
    }

    pub fn all_ok(&self) -> bool {
        self.results.iter().all(|r| r.ok)
    }
}

/// Frame sent to the device gateway: one correlation id, one or more calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcEnvelope {
    pub id: u64,
    pub session: SessionId,
    pub device: DeviceId,
    pub calls: Vec<RpcRequest>,
}

/// Reply frame correlated to an [`RpcEnvelope`] by `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcReply {
    pub id: u64,
    pub results: Vec<RpcCallResult>,
}

/// A decoded device notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotifyEvent {
    pub name: String,
    #[serde(default)]
    pub params: Map<String, Value>,
}

impl NotifyEvent {
    /// The conventional `value` parameter most notifications carry.
    pub fn value(&self) -> Option<&Value> {
        self.params.get("value")
    }
}
