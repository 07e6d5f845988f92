//! Control panel: device readings and settings behind a seven-row keyboard.

use std::sync::Arc;

use {
    pixelbot_common::types::{InlineKeyboard, SessionId},
    pixelbot_devices::{PixelMug, retry::retry_value},
    pixelbot_routing::{Context, EventRouter},
    tracing::warn,
};

use crate::{BotServices, BotSession, Result, handler, services::format_number};

pub const TEMPERATURE: &str = "cp_temp";
pub const BRIGHTNESS_GET: &str = "cp_brightness_get";
pub const BRIGHTNESS_UP: &str = "cp_brightness_inc";
pub const BRIGHTNESS_DOWN: &str = "cp_brightness_dec";
pub const BATTERY: &str = "cp_battery";
pub const WIFI: &str = "cp_wifi";
pub const CLEAR: &str = "cp_clear";
pub const DISPLAY_GET: &str = "cp_display_get";
pub const DISPLAY_ON: &str = "cp_display_on";
pub const DISPLAY_OFF: &str = "cp_display_off";
pub const SWIPE_ON: &str = "cp_swipe_on";
pub const SWIPE_OFF: &str = "cp_swipe_off";
pub const REBOOT: &str = "cp_reboot";

pub const BRIGHTNESS_STEP: u8 = 10;
pub const BRIGHTNESS_MIN: u8 = 20;
pub const BRIGHTNESS_MAX: u8 = 100;
/// Reads attempted before a step falls back to [`BRIGHTNESS_MIN`].
const BRIGHTNESS_READ_ATTEMPTS: usize = 2;

pub fn keyboard() -> InlineKeyboard {
    InlineKeyboard::new("Control Panel")
        .text("Water Temperature", TEMPERATURE)
        .row()
        .text("Brightness", BRIGHTNESS_GET)
        .text("UP+", BRIGHTNESS_UP)
        .text("Down-", BRIGHTNESS_DOWN)
        .row()
        .text("Battery Level", BATTERY)
        .text("WiFi Info", WIFI)
        .row()
        .text("Clear Display", CLEAR)
        .row()
        .text("Display", DISPLAY_GET)
        .text("Turn on", DISPLAY_ON)
        .text("Turn off", DISPLAY_OFF)
        .row()
        .text("Enable Swipe", SWIPE_ON)
        .text("Disable Swipe", SWIPE_OFF)
        .row()
        .text("Reboot", REBOOT)
}

pub fn register(router: &mut EventRouter<BotSession>, svc: &Arc<BotServices>) -> Result<()> {
    router.command("start", "Open control panel", handler(svc, start))?;
    router.callback(TEMPERATURE, handler(svc, temperature));
    router.callback(BRIGHTNESS_GET, handler(svc, brightness));
    router.callbacks([BRIGHTNESS_UP, BRIGHTNESS_DOWN], handler(svc, step_brightness));
    router.callback(BATTERY, handler(svc, battery));
    router.callback(WIFI, handler(svc, wifi));
    router.callback(CLEAR, handler(svc, clear));
    router.callback(DISPLAY_GET, handler(svc, display_state));
    router.callbacks([DISPLAY_ON, DISPLAY_OFF], handler(svc, set_display));
    router.callbacks([SWIPE_ON, SWIPE_OFF], handler(svc, set_swipe));
    router.callback(REBOOT, handler(svc, reboot));
    Ok(())
}

/// Next brightness for one step, clamped to the usable range.
pub fn step(current: u8, up: bool) -> u8 {
    let next = if up {
        current.saturating_add(BRIGHTNESS_STEP)
    } else {
        current.saturating_sub(BRIGHTNESS_STEP)
    };
    next.clamp(BRIGHTNESS_MIN, BRIGHTNESS_MAX)
}

async fn start(svc: Arc<BotServices>, ctx: Context<BotSession>) -> anyhow::Result<()> {
    svc.replier.send(&ctx.session, keyboard()).await;
    Ok(())
}

/// Read a number; transport failures count as "no reading".
async fn read_number(
    svc: &BotServices,
    session: &SessionId,
    mug: &PixelMug,
    request: pixelbot_devices::RpcRequest,
) -> Option<f64> {
    let method = request.method().to_string();
    match svc.query(session, mug, request).await {
        Ok(response) => response.number(),
        Err(e) => {
            warn!(session = %session, method = %method, error = %e, "device read failed");
            None
        },
    }
}

async fn temperature(svc: Arc<BotServices>, ctx: Context<BotSession>) -> anyhow::Result<()> {
    let mug = svc.mug(0)?;
    let reply = match read_number(&svc, &ctx.session, mug, mug.cup_temperature()).await {
        Some(v) => format!("Water Temperature: {}°F", format_number(v)),
        None => "Failed to read water temperature.".into(),
    };
    svc.say(&ctx.session, reply).await;
    Ok(())
}

fn to_percent(value: f64) -> u8 {
    value.round().clamp(0.0, f64::from(BRIGHTNESS_MAX)) as u8
}

async fn brightness(svc: Arc<BotServices>, mut ctx: Context<BotSession>) -> anyhow::Result<()> {
    let mug = svc.mug(0)?;
    let reply = match read_number(&svc, &ctx.session, mug, mug.brightness()).await {
        Some(v) => {
            ctx.state.brightness = Some(to_percent(v));
            format!("Brightness: {}", format_number(v))
        },
        None => "Failed to read brightness.".into(),
    };
    svc.say(&ctx.session, reply).await;
    Ok(())
}

async fn step_brightness(
    svc: Arc<BotServices>,
    mut ctx: Context<BotSession>,
) -> anyhow::Result<()> {
    let mug = svc.mug(0)?;
    let current = match ctx.state.brightness {
        Some(cached) => cached,
        None => {
            let read = retry_value(BRIGHTNESS_READ_ATTEMPTS, |_| async {
                svc.query(&ctx.session, mug, mug.brightness())
                    .await
                    .map(|r| r.number())
            })
            .await
            .unwrap_or_else(|e| {
                warn!(session = %ctx.session, error = %e, "brightness read failed");
                None
            });
            read.map(to_percent).unwrap_or(BRIGHTNESS_MIN)
        },
    };

    let next = step(current, ctx.input == BRIGHTNESS_UP);
    ctx.state.brightness = Some(next);
    svc.apply(&ctx.session, mug, mug.set_brightness(next))
        .await?;
    svc.say(&ctx.session, format!("Brightness set to {next}"))
        .await;
    Ok(())
}

async fn battery(svc: Arc<BotServices>, ctx: Context<BotSession>) -> anyhow::Result<()> {
    let mug = svc.mug(0)?;
    let reply = match read_number(&svc, &ctx.session, mug, mug.battery_level()).await {
        Some(v) => format!("Battery Level: {}%", format_number(v)),
        None => "Failed to read battery level.".into(),
    };
    svc.say(&ctx.session, reply).await;
    Ok(())
}

async fn wifi(svc: Arc<BotServices>, ctx: Context<BotSession>) -> anyhow::Result<()> {
    let mug = svc.mug(0)?;
    let response = svc.query(&ctx.session, mug, mug.wifi_info()).await?;
    let info = match response.first_value() {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => "unavailable".into(),
    };
    svc.say(&ctx.session, format!("WiFi: {info}")).await;
    Ok(())
}

async fn clear(svc: Arc<BotServices>, ctx: Context<BotSession>) -> anyhow::Result<()> {
    let mug = svc.mug(0)?;
    svc.apply(&ctx.session, mug, mug.return_home()).await?;
    svc.say(&ctx.session, "Display cleared.").await;
    Ok(())
}

async fn display_state(svc: Arc<BotServices>, mut ctx: Context<BotSession>) -> anyhow::Result<()> {
    let mug = svc.mug(0)?;
    let state = match svc.query(&ctx.session, mug, mug.display_switch()).await {
        Ok(response) => response.boolean(),
        Err(e) => {
            warn!(session = %ctx.session, error = %e, "display state read failed");
            None
        },
    };
    let reply = match state {
        Some(on) => {
            ctx.state.display_on = Some(on);
            format!("Display State: {}", if on { "ON" } else { "OFF" })
        },
        None => "Failed to read display state.".into(),
    };
    svc.say(&ctx.session, reply).await;
    Ok(())
}

async fn set_display(svc: Arc<BotServices>, mut ctx: Context<BotSession>) -> anyhow::Result<()> {
    let mug = svc.mug(0)?;
    let on = ctx.input == DISPLAY_ON;
    ctx.state.display_on = Some(on);
    svc.apply(&ctx.session, mug, mug.set_display(on)).await?;
    let reply = if on {
        "Display turned ON."
    } else {
        "Display turned OFF."
    };
    svc.say(&ctx.session, reply).await;
    Ok(())
}

async fn set_swipe(svc: Arc<BotServices>, ctx: Context<BotSession>) -> anyhow::Result<()> {
    let mug = svc.mug(0)?;
    let enable = ctx.input == SWIPE_ON;
    svc.apply(&ctx.session, mug, mug.set_home_swipe(enable))
        .await?;
    let reply = if enable {
        "You can now switch apps by swiping at the bottom of the screen."
    } else {
        "Bottom swipe app switching has been turned off."
    };
    svc.say(&ctx.session, reply).await;
    Ok(())
}

async fn reboot(svc: Arc<BotServices>, ctx: Context<BotSession>) -> anyhow::Result<()> {
    let mug = svc.mug(0)?;
    svc.apply(&ctx.session, mug, mug.reboot()).await?;
    svc.say(&ctx.session, "PixelMug is rebooting…").await;
    Ok(())
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{BotKind, testing::Harness},
        rstest::rstest,
        serde_json::json,
    };

    #[rstest]
    #[case(50, true, 60)]
    #[case(95, true, 100)]
    #[case(100, true, 100)]
    #[case(50, false, 40)]
    #[case(25, false, 20)]
    #[case(20, false, 20)]
    #[case(5, true, 20)]
    fn brightness_steps_are_clamped(#[case] current: u8, #[case] up: bool, #[case] next: u8) {
        assert_eq!(step(current, up), next);
    }

    #[tokio::test]
    async fn start_sends_seven_row_panel() {
        let h = Harness::new(BotKind::ControlPanel);
        h.message("/start").await;
        let kb = &h.outbound.keyboards_to("42")[0];
        assert_eq!(kb.title, "Control Panel");
        assert_eq!(kb.rows.len(), 7);
        assert_eq!(kb.values().count(), 13);
        assert!(kb.values().all(|v| h.installed.router.has_callback(v)));
    }

    #[tokio::test]
    async fn readings_are_formatted() {
        let h = Harness::new(BotKind::ControlPanel);
        h.link.answer("talGetCupTemperature", json!(98.6));
        h.link.answer("talGetBatteryLevel", json!(80));
        h.link.answer("talGetWifiInfo", json!("HomeNet -51dBm"));
        h.click(TEMPERATURE).await;
        h.click(BATTERY).await;
        h.click(WIFI).await;
        assert_eq!(h.texts(), vec![
            "Water Temperature: 98.6°F",
            "Battery Level: 80%",
            "WiFi: HomeNet -51dBm",
        ]);
    }

    #[tokio::test]
    async fn missing_readings_say_so() {
        let h = Harness::new(BotKind::ControlPanel);
        h.link.reject("talGetCupTemperature");
        h.click(TEMPERATURE).await;
        h.click(BATTERY).await;
        h.click(DISPLAY_GET).await;
        assert_eq!(h.texts(), vec![
            "Failed to read water temperature.",
            "Failed to read battery level.",
            "Failed to read display state.",
        ]);
    }

    #[tokio::test]
    async fn brightness_read_fills_the_cache() {
        let h = Harness::new(BotKind::ControlPanel);
        h.link.answer("talGetBrightness", json!(60));
        h.click(BRIGHTNESS_GET).await;
        h.click(BRIGHTNESS_UP).await;
        assert_eq!(h.texts(), vec!["Brightness: 60", "Brightness set to 70"]);
        assert_eq!(h.link.methods(), vec!["talGetBrightness", "talSetBrightness"]);
        assert_eq!(h.link.calls()[1].1.params()["percent"], 70);
    }

    #[tokio::test]
    async fn cache_miss_reads_before_stepping() {
        let h = Harness::new(BotKind::ControlPanel);
        h.link.answer("talGetBrightness", json!(50));
        h.click(BRIGHTNESS_DOWN).await;
        h.click(BRIGHTNESS_DOWN).await;
        assert_eq!(h.texts(), vec!["Brightness set to 40", "Brightness set to 30"]);
        // Second step used the cached value.
        assert_eq!(h.link.methods(), vec![
            "talGetBrightness",
            "talSetBrightness",
            "talSetBrightness",
        ]);
    }

    #[tokio::test]
    async fn unreadable_brightness_falls_back_to_minimum() {
        let h = Harness::new(BotKind::ControlPanel);
        h.click(BRIGHTNESS_UP).await;
        assert_eq!(h.texts(), vec!["Brightness set to 30"]);
        assert_eq!(h.link.methods(), vec![
            "talGetBrightness",
            "talGetBrightness",
            "talSetBrightness",
        ]);
    }

    #[tokio::test]
    async fn display_and_swipe_settings() {
        let h = Harness::new(BotKind::ControlPanel);
        h.link.answer("talGetSwitch", json!(true));
        h.click(DISPLAY_GET).await;
        h.click(DISPLAY_OFF).await;
        h.click(SWIPE_ON).await;
        h.click(SWIPE_OFF).await;
        assert_eq!(h.texts(), vec![
            "Display State: ON",
            "Display turned OFF.",
            "You can now switch apps by swiping at the bottom of the screen.",
            "Bottom swipe app switching has been turned off.",
        ]);
        let calls = h.link.calls();
        assert_eq!(calls[1].1.params()["onoff"], false);
        assert_eq!(calls[2].1.params()["isSwipe"], true);
        let state = h.svc.sessions.lock(&crate::testing::chat()).await;
        assert_eq!(state.display_on, Some(false));
    }

    #[tokio::test]
    async fn clear_and_reboot() {
        let h = Harness::new(BotKind::ControlPanel);
        h.click(CLEAR).await;
        h.click(REBOOT).await;
        assert_eq!(h.link.methods(), vec!["talReturn2Home", "talRebootDevice"]);
        assert_eq!(h.texts(), vec!["Display cleared.", "PixelMug is rebooting…"]);
    }
}
