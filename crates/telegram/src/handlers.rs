//! Telegram updates to inbound units.

use {
    pixelbot_channels::{InboundSink, InboundUnit},
    pixelbot_common::types::SessionId,
    teloxide::{
        prelude::*,
        types::{CallbackQuery, Message, UpdateKind},
    },
    tracing::{debug, warn},
};

/// Text messages become message units keyed by chat id. Anything without
/// text (stickers, photos, service messages) is skipped.
pub fn message_unit(msg: &Message) -> Option<InboundUnit> {
    let text = msg.text().or_else(|| msg.caption())?;
    if text.trim().is_empty() {
        return None;
    }
    Some(InboundUnit::message(SessionId::from(msg.chat.id.0), text))
}

/// Callback queries become callback units keyed by the chat of the message
/// that carried the keyboard.
pub fn callback_unit(query: &CallbackQuery) -> Option<InboundUnit> {
    let data = query.data.as_deref().filter(|d| !d.is_empty())?;
    let chat_id = query.message.as_ref().map(|m| m.chat().id.0)?;
    Some(InboundUnit::callback(SessionId::from(chat_id), data))
}

/// Handle one polled update: convert, acknowledge callbacks, hand to the sink.
pub async fn handle_update(kind: UpdateKind, bot: &Bot, account_id: &str, sink: &dyn InboundSink) {
    match kind {
        UpdateKind::Message(msg) => {
            debug!(account_id, chat_id = msg.chat.id.0, "received telegram message");
            match message_unit(&msg) {
                Some(unit) => sink.submit(unit).await,
                None => debug!(account_id, "ignoring telegram message without text"),
            }
        },
        UpdateKind::CallbackQuery(query) => {
            debug!(
                account_id,
                callback_data = ?query.data,
                "received telegram callback query"
            );
            // Stops the client-side spinner; the answer carries no text.
            if let Err(e) = bot.answer_callback_query(&query.id).await {
                warn!(account_id, error = %e, "failed to answer callback query");
            }
            match callback_unit(&query) {
                Some(unit) => sink.submit(unit).await,
                None => debug!(account_id, "ignoring callback query without data or chat"),
            }
        },
        other => {
            debug!(account_id, "ignoring non-message update: {other:?}");
        },
    }
}
