//! Wordby: two words, one per mug.

use std::sync::Arc;

use {
    pixelbot_common::types::InlineKeyboard,
    pixelbot_routing::{Context, EventRouter},
};

use crate::{BotServices, BotSession, Result, handler, text::TextStyle};

pub const BOY_GIRL: &str = "pair_boy_girl";
pub const BRIDE_GROOM: &str = "pair_bride_groom";
pub const DAD_MOM: &str = "pair_dad_mom";
pub const CLEAR: &str = "clear_display";

const USAGE: &str = "Please send at least two words (e.g., `Boy Girl`).";

pub fn keyboard() -> InlineKeyboard {
    InlineKeyboard::new("Try wordby")
        .text("Boy Girl", BOY_GIRL)
        .row()
        .text("Bride Groom", BRIDE_GROOM)
        .row()
        .text("Dad Mom", DAD_MOM)
        .row()
        .text("Clear Display", CLEAR)
}

fn style() -> TextStyle {
    TextStyle::small("#00ff00").with_speed(1)
}

pub fn register(router: &mut EventRouter<BotSession>, svc: &Arc<BotServices>) -> Result<()> {
    router.command("start", "Open wordby", handler(svc, start))?;
    router.callbacks([BOY_GIRL, BRIDE_GROOM, DAD_MOM], handler(svc, pair));
    router.callback(CLEAR, handler(svc, clear));
    router.fallback(handler(svc, words));
    Ok(())
}

/// First two whitespace-separated words, if there are two.
pub fn split_pair(text: &str) -> Option<(&str, &str)> {
    let mut words = text.split_whitespace();
    Some((words.next()?, words.next()?))
}

async fn show_pair(
    svc: &BotServices,
    ctx: &Context<BotSession>,
    first: &str,
    second: &str,
) -> anyhow::Result<()> {
    let style = style();
    svc.show_text(&ctx.session, svc.mug(0)?, first, &style)
        .await?;
    svc.show_text(&ctx.session, svc.mug(1)?, second, &style)
        .await?;
    Ok(())
}

async fn start(svc: Arc<BotServices>, ctx: Context<BotSession>) -> anyhow::Result<()> {
    svc.replier.send(&ctx.session, keyboard()).await;
    Ok(())
}

async fn pair(svc: Arc<BotServices>, ctx: Context<BotSession>) -> anyhow::Result<()> {
    let (first, second) = match ctx.input.as_str() {
        BOY_GIRL => ("Boy", "Girl"),
        BRIDE_GROOM => ("Bride", "Groom"),
        _ => ("Dad", "Mom"),
    };
    show_pair(&svc, &ctx, first, second).await
}

async fn words(svc: Arc<BotServices>, ctx: Context<BotSession>) -> anyhow::Result<()> {
    match split_pair(&ctx.input) {
        Some((first, second)) => {
            show_pair(&svc, &ctx, first, second).await?;
            svc.say(
                &ctx.session,
                format!("Displayed: \"{first}\" on one mug, \"{second}\" on the other."),
            )
            .await;
            Ok(())
        },
        None => {
            svc.say(&ctx.session, USAGE).await;
            Ok(())
        },
    }
}

async fn clear(svc: Arc<BotServices>, ctx: Context<BotSession>) -> anyhow::Result<()> {
    for index in 0..2 {
        let mug = svc.mug(index)?;
        svc.apply(&ctx.session, mug, mug.return_home()).await?;
    }
    svc.say(&ctx.session, "Display cleared.").await;
    Ok(())
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{BotKind, testing::Harness},
        rstest::rstest,
    };

    #[rstest]
    #[case("Boy Girl", Some(("Boy", "Girl")))]
    #[case("  cat \t dog  bird", Some(("cat", "dog")))]
    #[case("alone", None)]
    #[case("   ", None)]
    fn pairs(#[case] text: &str, #[case] expected: Option<(&str, &str)>) {
        assert_eq!(split_pair(text), expected);
    }

    #[tokio::test]
    async fn words_go_to_separate_mugs() {
        let h = Harness::new(BotKind::Wordby);
        h.message("Sun Moon").await;
        let calls = h.link.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].0.as_str(), "mug-1");
        assert_eq!(calls[0].1.params()["text"], "Sun");
        assert_eq!(calls[1].0.as_str(), "mug-2");
        assert_eq!(calls[1].1.params()["text"], "Moon");
        assert_eq!(calls[1].1.params()["speed"], 1);
        assert_eq!(
            h.last_text().as_deref(),
            Some("Displayed: \"Sun\" on one mug, \"Moon\" on the other.")
        );
    }

    #[tokio::test]
    async fn one_word_gets_usage() {
        let h = Harness::new(BotKind::Wordby);
        h.message("hello").await;
        assert!(h.link.calls().is_empty());
        assert_eq!(h.last_text().as_deref(), Some(USAGE));
    }

    #[tokio::test]
    async fn preset_pairs_and_clear() {
        let h = Harness::new(BotKind::Wordby);
        h.message("/start").await;
        assert_eq!(h.outbound.keyboards_to("42")[0].rows.len(), 4);

        h.click(BRIDE_GROOM).await;
        assert!(h.texts().is_empty(), "presets show silently: {:?}", h.texts());
        h.click(CLEAR).await;
        let calls = h.link.calls();
        assert_eq!(calls[0].1.params()["text"], "Bride");
        assert_eq!(calls[1].1.params()["text"], "Groom");
        assert_eq!(&h.link.methods()[2..], ["talReturn2Home", "talReturn2Home"]);
        assert_eq!(calls[3].0.as_str(), "mug-2");
        assert_eq!(h.last_text().as_deref(), Some("Display cleared."));
    }
}
