//! Text-to-device encoding.
//!
//! Turning a string into pixels is the device gateway's business; bots only
//! describe what to show and how, and an encoder turns that into the RPC.

use {
    async_trait::async_trait,
    pixelbot_devices::RpcRequest,
    serde::Serialize,
    serde_json::json,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TextSize {
    #[default]
    Small,
    Large,
}

/// How a text is rendered on the display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextStyle {
    pub size: TextSize,
    /// `#rrggbb`.
    pub color: String,
    /// Scroll direction, `0` keeps the text static.
    pub direction: u8,
    pub speed: Option<u8>,
}

impl TextStyle {
    /// Small static text in `color`.
    pub fn small(color: impl Into<String>) -> Self {
        Self {
            size: TextSize::Small,
            color: color.into(),
            direction: 0,
            speed: None,
        }
    }

    #[must_use]
    pub fn with_speed(mut self, speed: u8) -> Self {
        self.speed = Some(speed);
        self
    }
}

#[async_trait]
pub trait TextEncoder: Send + Sync {
    async fn encode(&self, text: &str, style: &TextStyle) -> anyhow::Result<RpcRequest>;
}

/// Builds `talShowText` and leaves rasterizing to the gateway.
#[derive(Debug, Default, Clone, Copy)]
pub struct ShowTextEncoder;

#[async_trait]
impl TextEncoder for ShowTextEncoder {
    async fn encode(&self, text: &str, style: &TextStyle) -> anyhow::Result<RpcRequest> {
        if text.trim().is_empty() {
            anyhow::bail!("nothing to display");
        }
        let mut params = json!({
            "text": text,
            "size": style.size,
            "color": style.color,
            "direction": style.direction,
        });
        if let Some(speed) = style.speed {
            params["speed"] = json!(speed);
        }
        Ok(RpcRequest::new("talShowText", params))
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn encodes_static_small_text() {
        let req = ShowTextEncoder
            .encode("Hi Mug", &TextStyle::small("#00ff00"))
            .await
            .unwrap();
        assert_eq!(req.method(), "talShowText");
        assert_eq!(req.params()["text"], "Hi Mug");
        assert_eq!(req.params()["size"], "small");
        assert_eq!(req.params()["color"], "#00ff00");
        assert_eq!(req.params()["direction"], 0);
        assert!(!req.params().contains_key("speed"));
    }

    #[tokio::test]
    async fn speed_is_optional() {
        let req = ShowTextEncoder
            .encode("Boy", &TextStyle::small("#00ff00").with_speed(1))
            .await
            .unwrap();
        assert_eq!(req.params()["speed"], 1);
    }

    #[tokio::test]
    async fn blank_text_is_rejected() {
        assert!(
            ShowTextEncoder
                .encode("  ", &TextStyle::small("#fff"))
                .await
                .is_err()
        );
    }
}
