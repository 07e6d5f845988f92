//! Decode raw notify frames into `{name, params}` events.
//!
//! A notify frame is a JSON-RPC style notification: an object with a
//! non-empty string `method` (the event name), an optional object `params`
//! and no `id`. Frames may also arrive as JSON text inside a string.
//! Anything else is dropped; decoding never fails.

use {
    pixelbot_common::types::NotifyFrame,
    serde_json::{Map, Value},
    tracing::debug,
};

use crate::types::NotifyEvent;

/// Decode frames, keeping input order and silently filtering malformed ones.
pub fn decode(frames: &[NotifyFrame]) -> Vec<NotifyEvent> {
    frames.iter().filter_map(|f| decode_frame(&f.0)).collect()
}

fn decode_frame(raw: &Value) -> Option<NotifyEvent> {
    if let Value::String(text) = raw {
        return match serde_json::from_str::<Value>(text) {
            Ok(inner @ Value::Object(_)) => decode_frame(&inner),
            _ => {
                debug!("dropping notify frame: string payload is not a JSON object");
                None
            },
        };
    }

    let obj = raw.as_object()?;
    if obj.contains_key("id") {
        debug!("dropping notify frame: carries a request id");
        return None;
    }

    let name = match obj.get("method").and_then(Value::as_str).map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => {
            debug!("dropping notify frame: missing method");
            return None;
        },
    };

    let params = match obj.get("params") {
        None | Some(Value::Null) => Map::new(),
        Some(Value::Object(map)) => map.clone(),
        Some(_) => {
            debug!(name, "dropping notify frame: params is not an object");
            return None;
        },
    };

    Some(NotifyEvent { name, params })
}
