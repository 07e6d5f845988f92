//! Hello: a one-button keyboard that puts a greeting on the mug.

use std::sync::Arc;

use {
    pixelbot_common::types::InlineKeyboard,
    pixelbot_routing::{Context, EventRouter},
};

use crate::{BotServices, BotSession, Result, handler, text::TextStyle};

pub const HELLO: &str = "hi_bot";

pub fn keyboard() -> InlineKeyboard {
    InlineKeyboard::new("Click to show on PixelMug").text("Hello bot", HELLO)
}

pub fn register(router: &mut EventRouter<BotSession>, svc: &Arc<BotServices>) -> Result<()> {
    router.command("start", "Show hello bot keyboard", handler(svc, start))?;
    router.callback(HELLO, handler(svc, show_greeting));
    Ok(())
}

async fn start(svc: Arc<BotServices>, ctx: Context<BotSession>) -> anyhow::Result<()> {
    svc.replier.send(&ctx.session, keyboard()).await;
    Ok(())
}

async fn show_greeting(svc: Arc<BotServices>, ctx: Context<BotSession>) -> anyhow::Result<()> {
    let mug = svc.mug(0)?;
    svc.show_text(&ctx.session, mug, "Hi Mug", &TextStyle::small("#00ff00"))
        .await?;
    svc.say(&ctx.session, "Displayed on PixelMug!").await;
    Ok(())
}
