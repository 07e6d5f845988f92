//! Device handles and the PixelMug method catalogue.

use {
    pixelbot_common::types::{DeviceId, NotifyFrame},
    serde::Serialize,
    serde_json::{Value, json},
};

use crate::{
    Error, Result, notify,
    types::{NotifyEvent, RpcRequest},
};

/// A controllable peripheral. Created once by the integrator and referenced
/// (not owned) by the registry.
pub trait Device: Send + Sync {
    fn id(&self) -> &DeviceId;

    /// Device class, e.g. `"pixelmug"`.
    fn class(&self) -> &str;

    /// Names of the RPC methods this device understands.
    fn methods(&self) -> &[&'static str];

    /// Decode raw notify frames pushed by this device.
    fn parse_notify(&self, frames: &[NotifyFrame]) -> Vec<NotifyEvent> {
        notify::decode(frames)
    }

    /// Build a catalogue request by name, rejecting unknown methods.
    fn call(&self, method: &str, params: Value) -> Result<RpcRequest> {
        if !self.methods().iter().any(|m| *m == method) {
            return Err(Error::invalid_request(format!(
                "{} has no method '{method}'",
                self.class()
            )));
        }
        Ok(RpcRequest::new(method, params))
    }
}

pub const PIXELMUG_CLASS: &str = "pixelmug";

const PIXELMUG_METHODS: &[&str] = &[
    "talGetCupTemperature",
    "talGetBrightness",
    "talSetBrightness",
    "talGetBatteryLevel",
    "talGetWifiInfo",
    "talReturn2Home",
    "talGetSwitch",
    "talSetDisplayOnOff",
    "talSetHomeSwipeEnable",
    "talRebootDevice",
    "talPlayGif",
    "talShowText",
];

/// Remote GIF reference handed to `talPlayGif`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GifContent {
    pub size: usize,
    #[serde(rename = "type")]
    pub mime: String,
    pub url: String,
}

/// PixelMug: a mug with a 32x16 pixel display.
#[derive(Debug, Clone)]
pub struct PixelMug {
    id: DeviceId,
}

impl PixelMug {
    pub fn new(id: DeviceId) -> Self {
        Self { id }
    }

    pub fn cup_temperature(&self) -> RpcRequest {
        RpcRequest::new("talGetCupTemperature", json!({}))
    }

    pub fn brightness(&self) -> RpcRequest {
        RpcRequest::new("talGetBrightness", json!({}))
    }

    pub fn set_brightness(&self, percent: u8) -> RpcRequest {
        RpcRequest::new("talSetBrightness", json!({ "percent": percent }))
    }

    pub fn battery_level(&self) -> RpcRequest {
        RpcRequest::new("talGetBatteryLevel", json!({}))
    }

    pub fn wifi_info(&self) -> RpcRequest {
        RpcRequest::new("talGetWifiInfo", json!({}))
    }

    pub fn return_home(&self) -> RpcRequest {
        RpcRequest::new("talReturn2Home", json!({}))
    }

    pub fn display_switch(&self) -> RpcRequest {
        RpcRequest::new("talGetSwitch", json!({}))
    }

    pub fn set_display(&self, onoff: bool) -> RpcRequest {
        RpcRequest::new("talSetDisplayOnOff", json!({ "onoff": onoff }))
    }

    pub fn set_home_swipe(&self, is_swipe: bool) -> RpcRequest {
        RpcRequest::new("talSetHomeSwipeEnable", json!({ "isSwipe": is_swipe }))
    }

    pub fn reboot(&self) -> RpcRequest {
        RpcRequest::new("talRebootDevice", json!({}))
    }

    pub fn play_gif(&self, content: &GifContent) -> RpcRequest {
        RpcRequest::new("talPlayGif", json!({ "gifContent": content }))
    }
}

impl Device for PixelMug {
    fn id(&self) -> &DeviceId {
        &self.id
    }

    fn class(&self) -> &str {
        PIXELMUG_CLASS
    }

    fn methods(&self) -> &[&'static str] {
        PIXELMUG_METHODS
    }
}
