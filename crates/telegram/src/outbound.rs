use std::{future::Future, time::Duration};

use {
    async_trait::async_trait,
    pixelbot_channels::{ChannelOutbound, CommandSpec},
    pixelbot_common::types::InlineKeyboard,
    teloxide::{
        RequestError,
        payloads::SendMessageSetters,
        prelude::*,
        types::{BotCommand, ChatId, InlineKeyboardButton, InlineKeyboardMarkup},
    },
    tracing::{debug, warn},
};

use crate::{Error, Result, state::AccountStateMap};

/// Outbound message sender for Telegram.
pub struct TelegramOutbound {
    pub(crate) accounts: AccountStateMap,
}

const TELEGRAM_RETRY_AFTER_MAX_RETRIES: usize = 4;

impl TelegramOutbound {
    pub fn new(accounts: AccountStateMap) -> Self {
        Self { accounts }
    }

    fn get_bot(&self, account_id: &str) -> Result<Bot> {
        let accounts = self.accounts.read().unwrap_or_else(|e| e.into_inner());
        accounts
            .get(account_id)
            .map(|s| s.bot.clone())
            .ok_or_else(|| Error::unknown_account(account_id))
    }

    /// Run a request, sleeping through `RetryAfter` rate limits a bounded
    /// number of times. Every other error is returned at once.
    async fn run_with_retry<T, F, Fut>(
        &self,
        account_id: &str,
        to: &str,
        operation: &'static str,
        mut request: F,
    ) -> std::result::Result<T, RequestError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, RequestError>>,
    {
        let mut retries = 0usize;

        loop {
            match request().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    let Some(wait) = retry_after_duration(&err) else {
                        return Err(err);
                    };

                    if retries >= TELEGRAM_RETRY_AFTER_MAX_RETRIES {
                        warn!(
                            account_id,
                            chat_id = to,
                            operation,
                            retries,
                            "telegram rate limit persisted after retries"
                        );
                        return Err(err);
                    }

                    retries += 1;
                    warn!(
                        account_id,
                        chat_id = to,
                        operation,
                        retries,
                        retry_after_secs = wait.as_secs(),
                        "telegram rate limited, waiting before retry"
                    );
                    tokio::time::sleep(wait).await;
                },
            }
        }
    }

    async fn deliver_text(&self, account_id: &str, to: &str, text: &str) -> Result<()> {
        let bot = self.get_bot(account_id)?;
        let chat_id = parse_chat_id(to)?;
        self.run_with_retry(account_id, to, "send message", || {
            let req = bot.send_message(chat_id, text);
            async move { req.await }
        })
        .await?;
        debug!(account_id, chat_id = to, "telegram text sent");
        Ok(())
    }

    async fn deliver_keyboard(
        &self,
        account_id: &str,
        to: &str,
        keyboard: &InlineKeyboard,
    ) -> Result<()> {
        let bot = self.get_bot(account_id)?;
        let chat_id = parse_chat_id(to)?;
        let markup = keyboard_markup(keyboard);
        let title = keyboard.title.as_str();
        self.run_with_retry(account_id, to, "send keyboard", || {
            let req = bot.send_message(chat_id, title).reply_markup(markup.clone());
            async move { req.await }
        })
        .await?;
        debug!(account_id, chat_id = to, "telegram keyboard sent");
        Ok(())
    }

    async fn publish_commands(&self, account_id: &str, commands: &[CommandSpec]) -> Result<()> {
        let bot = self.get_bot(account_id)?;
        let commands = bot_commands(commands);
        let count = commands.len();
        bot.set_my_commands(commands).await?;
        debug!(account_id, count, "telegram command menu registered");
        Ok(())
    }
}

fn retry_after_duration(error: &RequestError) -> Option<Duration> {
    match error {
        RequestError::RetryAfter(wait) => Some(wait.duration()),
        _ => None,
    }
}

fn parse_chat_id(to: &str) -> Result<ChatId> {
    to.parse::<i64>()
        .map(ChatId)
        .map_err(|_| Error::invalid_chat_id(to))
}

/// One Telegram keyboard row per descriptor row; the button value travels
/// as callback data. Empty rows are dropped since Telegram rejects them.
pub fn keyboard_markup(keyboard: &InlineKeyboard) -> InlineKeyboardMarkup {
    let rows: Vec<Vec<InlineKeyboardButton>> = keyboard
        .non_empty_rows()
        .map(|row| {
            row.iter()
                .map(|b| InlineKeyboardButton::callback(b.label.clone(), b.value.clone()))
                .collect()
        })
        .collect();
    InlineKeyboardMarkup::new(rows)
}

pub fn bot_commands(commands: &[CommandSpec]) -> Vec<BotCommand> {
    commands
        .iter()
        .map(|c| BotCommand::new(c.command.clone(), c.description.clone()))
        .collect()
}

#[async_trait]
impl ChannelOutbound for TelegramOutbound {
    async fn send_text(
        &self,
        account_id: &str,
        to: &str,
        text: &str,
    ) -> pixelbot_channels::Result<()> {
        Ok(self.deliver_text(account_id, to, text).await?)
    }

    async fn send_keyboard(
        &self,
        account_id: &str,
        to: &str,
        keyboard: &InlineKeyboard,
    ) -> pixelbot_channels::Result<()> {
        Ok(self.deliver_keyboard(account_id, to, keyboard).await?)
    }

    async fn set_commands(
        &self,
        account_id: &str,
        commands: &[CommandSpec],
    ) -> pixelbot_channels::Result<()> {
        Ok(self.publish_commands(account_id, commands).await?)
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{config::TelegramAccountConfig, state::AccountState},
        axum::{Json, Router, body::Bytes, extract::State, http::Uri, routing::post},
        pixelbot_channels::InboundUnit,
        serde_json::{Value, json},
        std::{
            collections::HashMap,
            sync::{Arc, Mutex, RwLock},
        },
        teloxide::types::InlineKeyboardButtonKind,
        tokio::sync::oneshot,
        tokio_util::sync::CancellationToken,
    };

    #[test]
    fn keyboard_rows_map_to_callback_buttons() {
        let kb = InlineKeyboard::new("Scoreboard")
            .text("Home", "score_home")
            .text("Visit", "score_visit")
            .row()
            .text("Reset", "score_reset")
            .row();
        let markup = keyboard_markup(&kb);
        assert_eq!(markup.inline_keyboard.len(), 2);
        assert_eq!(markup.inline_keyboard[0].len(), 2);
        let button = &markup.inline_keyboard[1][0];
        assert_eq!(button.text, "Reset");
        assert!(matches!(
            &button.kind,
            InlineKeyboardButtonKind::CallbackData(data) if data == "score_reset"
        ));
    }

    #[test]
    fn commands_keep_order() {
        let cmds = bot_commands(&[
            CommandSpec::new("start", "Show the panel"),
            CommandSpec::new("stop", "Stop playback"),
        ]);
        assert_eq!(cmds.len(), 2);
        assert_eq!(cmds[0].command, "start");
        assert_eq!(cmds[1].description, "Stop playback");
    }

    #[test]
    fn chat_ids_must_be_numeric() {
        assert_eq!(parse_chat_id("-100123").unwrap(), ChatId(-100_123));
        assert!(matches!(
            parse_chat_id("alice"),
            Err(Error::InvalidChatId { .. })
        ));
    }

    #[derive(Clone, Default)]
    struct MockTelegramApi {
        requests: Arc<Mutex<Vec<(String, Value)>>>,
    }

    async fn telegram_api_handler(
        State(state): State<MockTelegramApi>,
        uri: Uri,
        body: Bytes,
    ) -> Json<Value> {
        let method = uri.path().rsplit('/').next().unwrap_or_default().to_string();
        let body: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
        state.requests.lock().unwrap().push((method.clone(), body));
        let result = if method == "SendMessage" {
            json!({
                "message_id": 1,
                "date": 0,
                "chat": { "id": 42, "type": "private" },
                "text": "ok"
            })
        } else {
            json!(true)
        };
        Json(json!({ "ok": true, "result": result }))
    }

    struct NullSink;

    #[async_trait]
    impl pixelbot_channels::InboundSink for NullSink {
        async fn submit(&self, _unit: InboundUnit) {}
    }

    async fn outbound_with_mock_api() -> (TelegramOutbound, MockTelegramApi, oneshot::Sender<()>)
    {
        let api = MockTelegramApi::default();
        let app = Router::new()
            .route("/{*path}", post(telegram_api_handler))
            .with_state(api.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .unwrap();
        });

        let api_url = reqwest::Url::parse(&format!("http://{addr}/")).unwrap();
        let bot = Bot::new("test-token").set_api_url(api_url);
        let accounts: AccountStateMap = Arc::new(RwLock::new(HashMap::new()));
        accounts.write().unwrap().insert("main".into(), AccountState {
            bot,
            bot_username: Some("mug_bot".into()),
            account_id: "main".into(),
            config: TelegramAccountConfig::default(),
            cancel: CancellationToken::new(),
            sink: Arc::new(NullSink),
        });
        (TelegramOutbound::new(accounts), api, shutdown_tx)
    }

    #[tokio::test]
    async fn send_keyboard_posts_reply_markup() {
        let (outbound, api, shutdown) = outbound_with_mock_api().await;
        let kb = InlineKeyboard::new("Try wordby").text("Boy Girl", "Boy Girl");
        outbound.send_keyboard("main", "42", &kb).await.unwrap();

        let requests = api.requests.lock().unwrap().clone();
        let (method, body) = requests.last().unwrap();
        assert_eq!(method, "SendMessage");
        assert_eq!(body["chat_id"], 42);
        assert_eq!(body["text"], "Try wordby");
        assert_eq!(
            body["reply_markup"]["inline_keyboard"][0][0]["callback_data"],
            "Boy Girl"
        );
        let _ = shutdown.send(());
    }

    #[tokio::test]
    async fn set_commands_posts_menu() {
        let (outbound, api, shutdown) = outbound_with_mock_api().await;
        outbound
            .set_commands("main", &[CommandSpec::new("start", "Show the panel")])
            .await
            .unwrap();

        let requests = api.requests.lock().unwrap().clone();
        let (method, body) = requests.last().unwrap();
        assert_eq!(method, "SetMyCommands");
        assert_eq!(body["commands"][0]["command"], "start");
        let _ = shutdown.send(());
    }

    #[tokio::test]
    async fn unknown_account_is_reported() {
        let (outbound, api, shutdown) = outbound_with_mock_api().await;
        let err = outbound.send_text("other", "42", "hi").await.unwrap_err();
        assert!(matches!(
            err,
            pixelbot_channels::Error::UnknownAccount { .. }
        ));
        assert!(api.requests.lock().unwrap().is_empty());
        let _ = shutdown.send(());
    }
}
