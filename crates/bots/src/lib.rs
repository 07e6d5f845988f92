//! The PixelMug bots.
//!
//! Each bot is a set of router registrations over shared [`BotServices`]:
//! commands, callback values, a free-text fallback and, for some, a notify
//! handler or a per-session timer. [`install`] picks one by [`BotKind`].

pub mod control_panel;
pub mod echo;
pub mod error;
pub mod gif_player;
pub mod hello;
pub mod power;
pub mod scoreboard;
pub mod services;
pub mod session;
pub mod text;
pub mod wordby;

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod testing;

use std::{future::Future, sync::Arc};

use {
    pixelbot_cron::ScheduleController,
    pixelbot_routing::{Context, EventRouter, Handler},
    tracing::info,
};

pub use {
    error::{Error, Result},
    pixelbot_config::BotKind,
    services::{BotServices, PlayerSettings},
    session::{BotSession, Score},
    text::{ShowTextEncoder, TextEncoder, TextSize, TextStyle},
};

/// A bot ready to receive inbound units.
pub struct Installed {
    pub router: EventRouter<BotSession>,
    /// Timers the bot arms; stop them all on shutdown.
    pub scheduler: Option<Arc<ScheduleController<BotSession>>>,
}

/// Build the router for `kind`.
pub fn install(kind: BotKind, svc: Arc<BotServices>) -> Result<Installed> {
    let required = kind.required_devices();
    if svc.mugs.len() < required {
        return Err(Error::NotEnoughDevices {
            kind,
            required,
            found: svc.mugs.len(),
        });
    }

    let mut router = EventRouter::new(Arc::clone(&svc.sessions))
        .with_registry(Arc::clone(svc.bridge.registry()))
        .with_replier(svc.replier.clone());

    let mut scheduler = None;
    match kind {
        BotKind::Echo => echo::register(&mut router, &svc),
        BotKind::Hello => hello::register(&mut router, &svc)?,
        BotKind::PowerNotify => power::register(&mut router, &svc),
        BotKind::ControlPanel => control_panel::register(&mut router, &svc)?,
        BotKind::GifPlayer => scheduler = Some(gif_player::register(&mut router, &svc)?),
        BotKind::Scoreboard => scoreboard::register(&mut router, &svc)?,
        BotKind::Wordby => wordby::register(&mut router, &svc)?,
    }

    info!(bot = %kind, commands = router.commands().len(), "bot installed");
    Ok(Installed { router, scheduler })
}

/// Adapt `async fn(svc, ctx)` into a router handler.
pub(crate) fn handler<F, Fut>(svc: &Arc<BotServices>, f: F) -> impl Handler<BotSession> + 'static
where
    F: Fn(Arc<BotServices>, Context<BotSession>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    let svc = Arc::clone(svc);
    move |ctx: Context<BotSession>| f(Arc::clone(&svc), ctx)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::testing::Harness,
        pixelbot_channels::CommandSpec,
        rstest::rstest,
    };

    #[rstest]
    #[case(BotKind::Echo, vec![])]
    #[case(BotKind::Hello, vec![CommandSpec::new("start", "Show hello bot keyboard")])]
    #[case(BotKind::PowerNotify, vec![])]
    #[case(BotKind::ControlPanel, vec![CommandSpec::new("start", "Open control panel")])]
    #[case(BotKind::GifPlayer, vec![
        CommandSpec::new("start", "Open GIF Player"),
        CommandSpec::new("stop", "Stop GIF playback"),
    ])]
    #[case(BotKind::Scoreboard, vec![CommandSpec::new("start", "Scoreboard demo")])]
    #[case(BotKind::Wordby, vec![CommandSpec::new("start", "Open wordby")])]
    fn command_tables(#[case] kind: BotKind, #[case] expected: Vec<CommandSpec>) {
        let h = Harness::new(kind);
        assert_eq!(h.installed.router.commands(), expected);
        assert_eq!(h.installed.scheduler.is_some(), kind == BotKind::GifPlayer);
    }

    #[test]
    fn wordby_needs_two_devices() {
        let h = Harness::new(BotKind::Echo);
        let mut mugs = h.svc.mugs.clone();
        mugs.truncate(1);
        let svc = Arc::new(BotServices {
            replier: h.svc.replier.clone(),
            bridge: Arc::clone(&h.svc.bridge),
            sessions: Arc::clone(&h.svc.sessions),
            subscriptions: Arc::clone(&h.svc.subscriptions),
            content: Arc::clone(&h.svc.content),
            text: Arc::clone(&h.svc.text),
            mugs,
            player: PlayerSettings::default(),
        });
        assert!(matches!(
            install(BotKind::Wordby, Arc::clone(&svc)),
            Err(Error::NotEnoughDevices {
                required: 2,
                found: 1,
                ..
            })
        ));
        assert!(install(BotKind::Scoreboard, svc).is_ok());
    }
}
