//! Device side of the runtime: RPC types, the device catalogue, the
//! notification decoder, the session/device binding registry and the RPC
//! bridge that correlates replies with the requests that caused them.

pub mod bridge;
pub mod device;
pub mod error;
pub mod link;
pub mod notify;
pub mod registry;
pub mod retry;
pub mod types;

pub use {
    bridge::RpcBridge,
    device::{Device, GifContent, PIXELMUG_CLASS, PixelMug},
    error::{Error, Result},
    link::{DeviceLink, HttpDeviceLink},
    registry::{BindScope, Binding, DeviceEvent, DeviceRegistry, DeviceSummary},
    types::{
        NotifyEvent, RpcCallResult, RpcEnvelope, RpcErrorKind, RpcReply, RpcRequest, RpcResponse,
    },
};
