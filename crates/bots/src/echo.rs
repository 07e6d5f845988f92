//! Echo: every message comes back prefixed.

use std::sync::Arc;

use pixelbot_routing::{Context, EventRouter};

use crate::{BotServices, BotSession, handler};

pub fn register(router: &mut EventRouter<BotSession>, svc: &Arc<BotServices>) {
    router.fallback(handler(svc, echo));
}

async fn echo(svc: Arc<BotServices>, ctx: Context<BotSession>) -> anyhow::Result<()> {
    svc.say(&ctx.session, format!("Echo your message: {}", ctx.input))
        .await;
    Ok(())
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        crate::{BotKind, testing::Harness},
        pixelbot_routing::Routed,
    };

    #[tokio::test]
    async fn echoes_text_and_commands() {
        let h = Harness::new(BotKind::Echo);
        assert_eq!(h.message("hello there").await, Routed::Message);
        assert_eq!(h.message("/start").await, Routed::Message);
        assert_eq!(h.texts(), vec![
            "Echo your message: hello there",
            "Echo your message: /start",
        ]);
        assert!(h.link.calls().is_empty());
    }

    #[tokio::test]
    async fn callbacks_are_ignored() {
        let h = Harness::new(BotKind::Echo);
        assert_eq!(h.click("anything").await, Routed::Ignored);
        assert!(h.texts().is_empty());
    }
}
