use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use {
    async_trait::async_trait,
    pixelbot_channels::{ChannelOutbound, ChannelPlugin, Error as ChannelError, InboundSink},
    secrecy::ExposeSecret,
    tracing::{info, warn},
};

use crate::{bot, config::TelegramAccountConfig, outbound::TelegramOutbound, state::AccountStateMap};

/// Telegram channel plugin.
pub struct TelegramPlugin {
    accounts: AccountStateMap,
    sink: Arc<dyn InboundSink>,
}

impl TelegramPlugin {
    /// Updates from every account started on this plugin go to `sink`.
    pub fn new(sink: Arc<dyn InboundSink>) -> Self {
        Self {
            accounts: Arc::new(RwLock::new(HashMap::new())),
            sink,
        }
    }

    /// Get a shared reference to the outbound sender (for use outside the plugin).
    pub fn shared_outbound(&self) -> Arc<TelegramOutbound> {
        Arc::new(TelegramOutbound::new(Arc::clone(&self.accounts)))
    }

    /// List all active account IDs.
    pub fn account_ids(&self) -> Vec<String> {
        let accounts = self.accounts.read().unwrap_or_else(|e| e.into_inner());
        let mut ids: Vec<String> = accounts.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn bot_username(&self, account_id: &str) -> Option<String> {
        let accounts = self.accounts.read().unwrap_or_else(|e| e.into_inner());
        accounts.get(account_id).and_then(|s| s.bot_username.clone())
    }
}

#[async_trait]
impl ChannelPlugin for TelegramPlugin {
    fn id(&self) -> &str {
        "telegram"
    }

    fn name(&self) -> &str {
        "Telegram"
    }

    async fn start_account(
        &mut self,
        account_id: &str,
        config: serde_json::Value,
    ) -> pixelbot_channels::Result<()> {
        let tg_config: TelegramAccountConfig = serde_json::from_value(config)?;

        if tg_config.token.expose_secret().is_empty() {
            return Err(ChannelError::invalid_input("telegram bot token is required"));
        }

        info!(account_id, "starting telegram account");

        bot::start_polling(
            account_id.to_string(),
            tg_config,
            Arc::clone(&self.accounts),
            Arc::clone(&self.sink),
        )
        .await?;

        Ok(())
    }

    async fn stop_account(&mut self, account_id: &str) -> pixelbot_channels::Result<()> {
        let removed = {
            let mut accounts = self.accounts.write().unwrap_or_else(|e| e.into_inner());
            accounts.remove(account_id)
        };

        match removed {
            Some(state) => {
                info!(account_id, "stopping telegram account");
                state.cancel.cancel();
            },
            None => warn!(account_id, "telegram account not found"),
        }

        Ok(())
    }

    fn outbound(&self) -> Option<Arc<dyn ChannelOutbound>> {
        Some(self.shared_outbound())
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, pixelbot_channels::InboundUnit, serde_json::json};

    struct NullSink;

    #[async_trait]
    impl InboundSink for NullSink {
        async fn submit(&self, _unit: InboundUnit) {}
    }

    #[tokio::test]
    async fn empty_token_is_rejected_before_any_request() {
        let mut plugin = TelegramPlugin::new(Arc::new(NullSink));
        let err = plugin
            .start_account("main", json!({ "token": "" }))
            .await
            .unwrap_err();
        assert!(matches!(err, ChannelError::InvalidInput { .. }));
        assert!(plugin.account_ids().is_empty());
    }

    #[tokio::test]
    async fn bad_config_shape_is_a_serde_error() {
        let mut plugin = TelegramPlugin::new(Arc::new(NullSink));
        let err = plugin
            .start_account("main", json!({ "token": 5 }))
            .await
            .unwrap_err();
        assert!(matches!(err, ChannelError::SerdeJson(_)));
    }

    #[tokio::test]
    async fn stopping_unknown_account_is_not_an_error() {
        let mut plugin = TelegramPlugin::new(Arc::new(NullSink));
        plugin.stop_account("ghost").await.unwrap();
        assert_eq!(plugin.id(), "telegram");
        assert!(plugin.outbound().is_some());
    }
}
