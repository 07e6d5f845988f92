use std::{sync::Arc, time::Duration};

use {
    anyhow::Context as _,
    pixelbot_channels::Replier,
    pixelbot_common::types::SessionId,
    pixelbot_config::PlayerConfig,
    pixelbot_cron::PlayOrder,
    pixelbot_devices::{Device, PixelMug, RpcBridge, RpcRequest, RpcResponse},
    pixelbot_media::ContentSource,
    pixelbot_sessions::{SessionStore, Subscriptions},
};

use crate::{
    Error, Result,
    session::BotSession,
    text::{TextEncoder, TextStyle},
};

/// Initial GIF player settings; each session copies them on first use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerSettings {
    pub playlist: Vec<String>,
    pub interval: Duration,
    pub order: PlayOrder,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            playlist: Vec::new(),
            interval: Duration::from_secs(120),
            order: PlayOrder::Sequential,
        }
    }
}

impl PlayerSettings {
    pub fn from_config(config: &PlayerConfig) -> Result<Self> {
        if config.interval_ms == 0 {
            return Err(Error::invalid_setting("interval_ms must be greater than zero"));
        }
        let order = config.order.parse().map_err(Error::invalid_setting)?;
        Ok(Self {
            playlist: config.playlist.clone(),
            interval: Duration::from_millis(config.interval_ms),
            order,
        })
    }
}

/// Shared collaborators every bot handler reaches through.
pub struct BotServices {
    pub replier: Replier,
    pub bridge: Arc<RpcBridge>,
    pub sessions: Arc<SessionStore<BotSession>>,
    pub subscriptions: Arc<Subscriptions>,
    pub content: Arc<dyn ContentSource>,
    pub text: Arc<dyn TextEncoder>,
    /// Devices in configuration order; two-device bots use the first two.
    pub mugs: Vec<Arc<PixelMug>>,
    pub player: PlayerSettings,
}

impl BotServices {
    pub fn mug(&self, index: usize) -> anyhow::Result<&PixelMug> {
        self.mugs
            .get(index)
            .map(Arc::as_ref)
            .with_context(|| format!("no device #{}", index + 1))
    }

    /// One call to a device; the raw response, whatever its per-call status.
    pub async fn query(
        &self,
        session: &SessionId,
        mug: &PixelMug,
        request: RpcRequest,
    ) -> pixelbot_devices::Result<RpcResponse> {
        self.bridge.call(session, mug.id(), request).await
    }

    /// One call that must succeed on the device too.
    pub async fn apply(
        &self,
        session: &SessionId,
        mug: &PixelMug,
        request: RpcRequest,
    ) -> anyhow::Result<RpcResponse> {
        let method = request.method().to_string();
        let response = self.query(session, mug, request).await?;
        if !response.all_ok() {
            let reason = response
                .results
                .iter()
                .find_map(|r| r.error.as_ref())
                .map(|e| format!("{e:?}"))
                .unwrap_or_else(|| "unknown error".into());
            anyhow::bail!("{method} rejected by {}: {reason}", mug.id());
        }
        Ok(response)
    }

    pub async fn show_text(
        &self,
        session: &SessionId,
        mug: &PixelMug,
        text: &str,
        style: &TextStyle,
    ) -> anyhow::Result<()> {
        let request = self.text.encode(text, style).await?;
        self.apply(session, mug, request).await?;
        Ok(())
    }

    pub async fn say(&self, session: &SessionId, text: impl Into<String>) {
        self.replier.send(session, text.into()).await;
    }
}

/// Render a device reading the way people write numbers: `60`, not `60.0`.
pub(crate) fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    #[test]
    fn settings_from_config() {
        let settings = PlayerSettings::from_config(&PlayerConfig {
            playlist: vec!["https://x/a.gif".into()],
            interval_ms: 30_000,
            order: "seq".into(),
        })
        .unwrap();
        assert_eq!(settings.interval, Duration::from_secs(30));
        assert_eq!(settings.order, PlayOrder::Sequential);
    }

    #[test]
    fn bad_settings_are_rejected() {
        let zero = PlayerConfig {
            interval_ms: 0,
            ..Default::default()
        };
        assert!(matches!(
            PlayerSettings::from_config(&zero),
            Err(Error::InvalidSetting { .. })
        ));
        let shuffle = PlayerConfig {
            order: "shuffle".into(),
            ..Default::default()
        };
        assert!(PlayerSettings::from_config(&shuffle).is_err());
    }

    #[rstest]
    #[case(60.0, "60")]
    #[case(98.6, "98.6")]
    #[case(-3.0, "-3")]
    fn numbers_render_without_trailing_zero(#[case] value: f64, #[case] expected: &str) {
        assert_eq!(format_number(value), expected);
    }
}
