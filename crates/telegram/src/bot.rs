use std::{sync::Arc, time::Duration};

use {
    pixelbot_channels::InboundSink,
    secrecy::ExposeSecret,
    teloxide::{
        ApiError, RequestError,
        prelude::*,
        types::AllowedUpdate,
    },
    tokio_util::sync::CancellationToken,
    tracing::{debug, info, warn},
};

use crate::{
    Result,
    config::TelegramAccountConfig,
    handlers,
    state::{AccountState, AccountStateMap},
};

/// Start polling for a single bot account.
///
/// Spawns a background task that turns updates into inbound units until the
/// returned `CancellationToken` is cancelled.
pub async fn start_polling(
    account_id: String,
    config: TelegramAccountConfig,
    accounts: AccountStateMap,
    sink: Arc<dyn InboundSink>,
) -> Result<CancellationToken> {
    let client = teloxide::net::default_reqwest_settings()
        .timeout(config.client_timeout())
        .build()?;
    let bot = Bot::with_client(config.token.expose_secret(), client);

    // Verify credentials and get bot username.
    let me = bot.get_me().await?;
    let bot_username = me.username.clone();

    // Long polling does not work while a webhook is set.
    bot.delete_webhook().send().await?;

    info!(
        account_id,
        username = ?bot_username,
        "telegram bot connected (webhook cleared)"
    );

    let cancel = CancellationToken::new();
    let poll_timeout = config.poll_timeout_secs;
    let retry_delay = Duration::from_millis(config.retry_delay_ms);

    {
        let mut map = accounts.write().unwrap_or_else(|e| e.into_inner());
        map.insert(account_id.clone(), AccountState {
            bot: bot.clone(),
            bot_username,
            account_id: account_id.clone(),
            config,
            cancel: cancel.clone(),
            sink: Arc::clone(&sink),
        });
    }

    let cancel_clone = cancel.clone();
    let aid = account_id;
    tokio::spawn(async move {
        info!(account_id = aid, "starting telegram polling loop");
        let mut offset: i32 = 0;

        loop {
            let result = tokio::select! {
                biased;
                () = cancel_clone.cancelled() => break,
                result = bot
                    .get_updates()
                    .offset(offset)
                    .timeout(poll_timeout)
                    .allowed_updates(vec![AllowedUpdate::Message, AllowedUpdate::CallbackQuery])
                    .send() => result,
            };

            match result {
                Ok(updates) => {
                    debug!(
                        account_id = aid,
                        count = updates.len(),
                        "got telegram updates"
                    );
                    for update in updates {
                        offset = update.id.as_offset();
                        handlers::handle_update(update.kind, &bot, &aid, sink.as_ref()).await;
                    }
                },
                Err(e) => {
                    // Another process is polling with the same token.
                    if matches!(&e, RequestError::Api(ApiError::TerminatedByOtherGetUpdates)) {
                        warn!(
                            account_id = aid,
                            "telegram bot disabled: another instance is already running with this token"
                        );
                        cancel_clone.cancel();
                        break;
                    }

                    warn!(account_id = aid, error = %e, "telegram getUpdates failed");
                    tokio::select! {
                        () = cancel_clone.cancelled() => break,
                        () = tokio::time::sleep(retry_delay) => {},
                    }
                },
            }
        }
        info!(account_id = aid, "telegram polling stopped");
    });

    Ok(cancel)
}
