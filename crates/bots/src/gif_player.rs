//! GIF player: rotates a playlist on the mug from a per-session timer.
//!
//! Interval and order changes restart the timer so they apply at once.
//! Queries, manual steps and clearing the display leave it alone.

use std::{future::Future, sync::Arc, time::Duration};

use {
    pixelbot_common::types::{InlineKeyboard, SessionId},
    pixelbot_cron::{FailureFn, PlayOrder, ScheduleController, TickFn},
    pixelbot_devices::GifContent,
    pixelbot_routing::{Context, EventRouter, Handler},
    pixelbot_sessions::SessionGuard,
    tracing::{debug, info},
};

use crate::{BotServices, BotSession, Result};

pub const GET_INTERVAL: &str = "get_interval";
pub const INTERVAL_LONG: &str = "gif_int_5m";
pub const INTERVAL_MEDIUM: &str = "gif_int_2m";
pub const INTERVAL_SHORT: &str = "gif_int_30s";
pub const GET_ORDER: &str = "get_order";
pub const ORDER_RANDOM: &str = "gif_order_random";
pub const ORDER_SEQUENTIAL: &str = "gif_order_seq";
pub const PREV: &str = "gif_prev";
pub const NEXT: &str = "gif_next";
pub const CLEAR: &str = "gif_clear";

const LONG: Duration = Duration::from_secs(5 * 60);
const MEDIUM: Duration = Duration::from_secs(2 * 60);
const SHORT: Duration = Duration::from_secs(30);

pub fn keyboard() -> InlineKeyboard {
    InlineKeyboard::new("GIF Player")
        .text("Interval", GET_INTERVAL)
        .text("Long (5m)", INTERVAL_LONG)
        .text("Medium (2m)", INTERVAL_MEDIUM)
        .text("Short (30s)", INTERVAL_SHORT)
        .row()
        .text("Order", GET_ORDER)
        .text("Random", ORDER_RANDOM)
        .text("Sequential", ORDER_SEQUENTIAL)
        .row()
        .text("Prev", PREV)
        .text("Next", NEXT)
        .row()
        .text("Clear Display", CLEAR)
}

/// Human label for an interval; presets by name, anything else in ms.
pub fn interval_label(interval: Duration) -> String {
    if interval == LONG {
        "Long (5m)".into()
    } else if interval == MEDIUM {
        "Medium (2m)".into()
    } else if interval == SHORT {
        "Short (30s)".into()
    } else {
        format!("{}ms", interval.as_millis())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Next,
    Prev,
}

struct Player {
    svc: Arc<BotServices>,
    scheduler: Arc<ScheduleController<BotSession>>,
}

fn on<F, Fut>(player: &Arc<Player>, f: F) -> impl Handler<BotSession> + 'static
where
    F: Fn(Arc<Player>, Context<BotSession>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    let player = Arc::clone(player);
    move |ctx: Context<BotSession>| f(Arc::clone(&player), ctx)
}

pub fn register(
    router: &mut EventRouter<BotSession>,
    svc: &Arc<BotServices>,
) -> Result<Arc<ScheduleController<BotSession>>> {
    let scheduler = ScheduleController::with_failure(
        Arc::clone(&svc.sessions),
        tick(svc),
        Some(report_failure(svc)),
    );
    let player = Arc::new(Player {
        svc: Arc::clone(svc),
        scheduler: Arc::clone(&scheduler),
    });

    router.command("start", "Open GIF Player", on(&player, start))?;
    router.command("stop", "Stop GIF playback", on(&player, stop))?;
    router.callback(GET_INTERVAL, on(&player, show_interval));
    router.callbacks(
        [INTERVAL_LONG, INTERVAL_MEDIUM, INTERVAL_SHORT],
        on(&player, set_interval),
    );
    router.callback(GET_ORDER, on(&player, show_order));
    router.callbacks([ORDER_RANDOM, ORDER_SEQUENTIAL], on(&player, set_order));
    router.callbacks([PREV, NEXT], on(&player, step));
    router.callback(CLEAR, on(&player, clear));
    Ok(scheduler)
}

/// Pick the next item and put it on the mug. `Ok(None)` when the playlist
/// is empty.
async fn play(
    svc: &BotServices,
    session: &SessionId,
    state: &mut BotSession,
    step: Step,
) -> anyhow::Result<Option<String>> {
    let source = {
        let playlist = state.playlist_mut(&svc.player);
        let mut rng = rand::rng();
        let index = match step {
            Step::Next => playlist.pick_next(&mut rng),
            Step::Prev => playlist.pick_prev(&mut rng),
        };
        index.and_then(|i| playlist.item(i)).map(String::from)
    };
    let Some(source) = source else {
        return Ok(None);
    };

    let content = svc.content.load(&source).await?;
    let mug = svc.mug(0)?;
    let gif = GifContent {
        size: content.size,
        mime: content.mime,
        url: source.clone(),
    };
    svc.apply(session, mug, mug.play_gif(&gif)).await?;
    info!(session = %session, url = %source, size = gif.size, "gif played");
    Ok(Some(source))
}

fn tick(svc: &Arc<BotServices>) -> TickFn<BotSession> {
    let svc = Arc::clone(svc);
    Arc::new(move |session: SessionId, mut state: SessionGuard<BotSession>| {
        let svc = Arc::clone(&svc);
        Box::pin(async move {
            let played = play(&svc, &session, &mut state, Step::Next).await?;
            if played.is_none() {
                debug!(session = %session, "playlist empty, nothing to play");
            }
            anyhow::Ok(())
        })
    })
}

fn report_failure(svc: &Arc<BotServices>) -> FailureFn {
    let replier = svc.replier.clone();
    Arc::new(move |session: SessionId, err: anyhow::Error| {
        let replier = replier.clone();
        Box::pin(async move {
            replier
                .send(&session, format!("GIF play failed: {err}"))
                .await;
        })
    })
}

async fn start(player: Arc<Player>, mut ctx: Context<BotSession>) -> anyhow::Result<()> {
    let svc = &player.svc;
    svc.replier.send(&ctx.session, keyboard()).await;
    let (interval, order) = {
        let playlist = ctx.state.playlist_mut(&svc.player);
        (playlist.interval, playlist.order)
    };
    // The first tick waits for this handler to release the session.
    player.scheduler.start(&ctx.session, interval);
    svc.say(
        &ctx.session,
        format!(
            "GIF Player started. Interval: {}. Order: {order}.",
            interval_label(interval)
        ),
    )
    .await;
    Ok(())
}

async fn stop(player: Arc<Player>, ctx: Context<BotSession>) -> anyhow::Result<()> {
    let reply = if player.scheduler.stop(&ctx.session) {
        "GIF playback stopped."
    } else {
        "GIF playback is not running."
    };
    player.svc.say(&ctx.session, reply).await;
    Ok(())
}

async fn show_interval(player: Arc<Player>, mut ctx: Context<BotSession>) -> anyhow::Result<()> {
    let interval = ctx.state.playlist_mut(&player.svc.player).interval;
    player
        .svc
        .say(
            &ctx.session,
            format!("Current interval: {}.", interval_label(interval)),
        )
        .await;
    Ok(())
}

async fn set_interval(player: Arc<Player>, mut ctx: Context<BotSession>) -> anyhow::Result<()> {
    let interval = match ctx.input.as_str() {
        INTERVAL_LONG => LONG,
        INTERVAL_MEDIUM => MEDIUM,
        _ => SHORT,
    };
    ctx.state.playlist_mut(&player.svc.player).interval = interval;
    player.scheduler.restart(&ctx.session, interval);
    player
        .svc
        .say(
            &ctx.session,
            format!("Updated interval: {}.", interval_label(interval)),
        )
        .await;
    Ok(())
}

async fn show_order(player: Arc<Player>, mut ctx: Context<BotSession>) -> anyhow::Result<()> {
    let order = ctx.state.playlist_mut(&player.svc.player).order;
    player
        .svc
        .say(&ctx.session, format!("Current order: {order}."))
        .await;
    Ok(())
}

async fn set_order(player: Arc<Player>, mut ctx: Context<BotSession>) -> anyhow::Result<()> {
    let order = if ctx.input == ORDER_RANDOM {
        PlayOrder::Random
    } else {
        PlayOrder::Sequential
    };
    let interval = {
        let playlist = ctx.state.playlist_mut(&player.svc.player);
        playlist.order = order;
        playlist.interval
    };
    player.scheduler.restart(&ctx.session, interval);
    player
        .svc
        .say(&ctx.session, format!("Updated order: {order}."))
        .await;
    Ok(())
}

async fn step(player: Arc<Player>, mut ctx: Context<BotSession>) -> anyhow::Result<()> {
    let direction = if ctx.input == PREV {
        Step::Prev
    } else {
        Step::Next
    };
    let svc = &player.svc;
    match play(svc, &ctx.session, &mut ctx.state, direction).await {
        Ok(Some(_)) => {},
        Ok(None) => svc.say(&ctx.session, "Playlist is empty.").await,
        Err(e) => {
            svc.say(&ctx.session, format!("GIF play failed: {e}"))
                .await;
        },
    }
    Ok(())
}

async fn clear(player: Arc<Player>, ctx: Context<BotSession>) -> anyhow::Result<()> {
    let svc = &player.svc;
    let mug = svc.mug(0)?;
    svc.apply(&ctx.session, mug, mug.return_home()).await?;
    svc.say(&ctx.session, "Display cleared (returned to home).")
        .await;
    Ok(())
}
