//! Scoreboard: two counters kept per chat and mirrored on the mug.

use std::sync::Arc;

use {
    pixelbot_common::types::{InlineKeyboard, SessionId},
    pixelbot_routing::{Context, EventRouter},
};

use crate::{BotServices, BotSession, Result, Score, handler, text::TextStyle};

pub const HOME: &str = "score_home";
pub const VISIT: &str = "score_visit";
pub const RESET: &str = "score_reset";
pub const EXIT: &str = "exit_game";

pub fn keyboard() -> InlineKeyboard {
    InlineKeyboard::new("Scoreboard")
        .text("Home", HOME)
        .text("Visit", VISIT)
        .row()
        .text("Reset", RESET)
        .row()
        .text("Exit", EXIT)
}

pub fn register(router: &mut EventRouter<BotSession>, svc: &Arc<BotServices>) -> Result<()> {
    router.command("start", "Scoreboard demo", handler(svc, start))?;
    router.callbacks([HOME, VISIT, RESET], handler(svc, score));
    router.callback(EXIT, handler(svc, exit));
    Ok(())
}

async fn show(svc: &BotServices, session: &SessionId, score: Score) -> anyhow::Result<()> {
    let text = score.to_string();
    svc.show_text(session, svc.mug(0)?, &text, &TextStyle::small("#ff0000"))
        .await?;
    svc.say(session, format!("Score updated: `{text}`")).await;
    Ok(())
}

async fn start(svc: Arc<BotServices>, ctx: Context<BotSession>) -> anyhow::Result<()> {
    svc.replier.send(&ctx.session, keyboard()).await;
    show(&svc, &ctx.session, ctx.state.score).await
}

async fn score(svc: Arc<BotServices>, mut ctx: Context<BotSession>) -> anyhow::Result<()> {
    let score = &mut ctx.state.score;
    match ctx.input.as_str() {
        HOME => score.home += 1,
        VISIT => score.visit += 1,
        _ => *score = Score::default(),
    }
    let score = *score;
    show(&svc, &ctx.session, score).await
}

async fn exit(svc: Arc<BotServices>, ctx: Context<BotSession>) -> anyhow::Result<()> {
    let mug = svc.mug(0)?;
    svc.apply(&ctx.session, mug, mug.return_home()).await?;
    svc.say(&ctx.session, "Game exited.").await;
    Ok(())
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{BotKind, testing::Harness},
    };

    fn shown(h: &Harness) -> Vec<String> {
        h.link
            .calls()
            .into_iter()
            .filter(|(_, r)| r.method() == "talShowText")
            .map(|(_, r)| r.params()["text"].as_str().unwrap().to_string())
            .collect()
    }

    #[tokio::test]
    async fn start_shows_zero_score() {
        let h = Harness::new(BotKind::Scoreboard);
        h.message("/start").await;
        assert_eq!(h.outbound.keyboards_to("42")[0].title, "Scoreboard");
        assert_eq!(shown(&h), vec!["0 : 0"]);
        assert_eq!(h.last_text().as_deref(), Some("Score updated: `0 : 0`"));

        let (_, request) = &h.link.calls()[0];
        assert_eq!(request.params()["color"], "#ff0000");
        assert_eq!(request.params()["direction"], 0);
    }

    #[tokio::test]
    async fn buttons_count_and_reset() {
        let h = Harness::new(BotKind::Scoreboard);
        h.click(HOME).await;
        h.click(HOME).await;
        h.click(VISIT).await;
        assert_eq!(shown(&h), vec!["1 : 0", "2 : 0", "2 : 1"]);

        h.click(RESET).await;
        assert_eq!(h.last_text().as_deref(), Some("Score updated: `0 : 0`"));
    }

    #[tokio::test]
    async fn scores_are_per_chat() {
        let h = Harness::new(BotKind::Scoreboard);
        h.click(HOME).await;
        h.installed
            .router
            .dispatch(pixelbot_channels::InboundUnit::callback(SessionId::from(7), VISIT))
            .await;
        assert_eq!(shown(&h), vec!["1 : 0", "0 : 1"]);
    }

    #[tokio::test]
    async fn exit_returns_home() {
        let h = Harness::new(BotKind::Scoreboard);
        h.click(EXIT).await;
        assert_eq!(h.link.methods(), vec!["talReturn2Home"]);
        assert_eq!(h.last_text().as_deref(), Some("Game exited."));
    }
}
