//! Power-state reporting: sessions opt in, charging changes fan out to them.

use std::sync::Arc;

use {
    async_trait::async_trait,
    pixelbot_common::types::InlineKeyboard,
    pixelbot_devices::NotifyEvent,
    pixelbot_routing::{Context, EventRouter, NotifyHandler, NotifyOrigin},
    serde_json::Value,
    tracing::debug,
};

use crate::{BotServices, BotSession, handler};

/// Subscription topic for charging-state reports.
pub const TOPIC: &str = "power_state";
pub const CHARGING_STATE: &str = "CurChargingState";
pub const SUBSCRIBE: &str = "y";
pub const UNSUBSCRIBE: &str = "n";

pub fn keyboard() -> InlineKeyboard {
    InlineKeyboard::new("Subscribe to Power State Reporting?")
        .text("Yes", SUBSCRIBE)
        .text("No", UNSUBSCRIBE)
}

/// Chat line for a charging-state value.
pub fn describe(charging: bool) -> &'static str {
    if charging {
        "[Power State] Charging Now"
    } else {
        "[Power State] Not Charging"
    }
}

/// Devices report the state as a bool, a 0/1 number or occasionally a string.
/// Zero, empty, `false`, `null` and a missing value all mean not charging.
pub fn is_charging(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_) | Value::Object(_)) => true,
    }
}

pub fn register(router: &mut EventRouter<BotSession>, svc: &Arc<BotServices>) {
    router.on_notify(PowerReporter {
        svc: Arc::clone(svc),
    });
    router.callbacks([SUBSCRIBE, UNSUBSCRIBE], handler(svc, toggle));
    router.fallback(handler(svc, prompt));
}

async fn toggle(svc: Arc<BotServices>, ctx: Context<BotSession>) -> anyhow::Result<()> {
    let subscribe = ctx.input == SUBSCRIBE;
    svc.subscriptions.set(TOPIC, &ctx.session, subscribe);
    let reply = if subscribe {
        "✅ Subscribed. I will report power state changes."
    } else {
        "❎ Unsubscribed."
    };
    svc.say(&ctx.session, reply).await;
    Ok(())
}

async fn prompt(svc: Arc<BotServices>, ctx: Context<BotSession>) -> anyhow::Result<()> {
    if svc.subscriptions.is_subscribed(TOPIC, &ctx.session) {
        svc.say(&ctx.session, "You're subscribed. Waiting for device reports…")
            .await;
    } else {
        svc.replier.send(&ctx.session, keyboard()).await;
    }
    Ok(())
}

struct PowerReporter {
    svc: Arc<BotServices>,
}

#[async_trait]
impl NotifyHandler for PowerReporter {
    async fn on_notify(&self, origin: NotifyOrigin, events: Vec<NotifyEvent>) -> anyhow::Result<()> {
        for event in events.iter().filter(|e| e.name == CHARGING_STATE) {
            let charging = is_charging(event.value());
            debug!(device = ?origin.device, charging, "charging state reported");
            let subscribers = self.svc.subscriptions.subscribers(TOPIC);
            if subscribers.is_empty() {
                debug!(charging, "no subscribers for power state");
            }
            for session in subscribers {
                self.svc.say(&session, describe(charging)).await;
            }
        }
        Ok(())
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{BotKind, testing::Harness},
        pixelbot_channels::InboundUnit,
        pixelbot_common::types::{NotifyFrame, SessionId},
        pixelbot_routing::Routed,
        rstest::rstest,
        serde_json::json,
    };

    fn charging(value: Value) -> NotifyFrame {
        NotifyFrame(json!({ "method": CHARGING_STATE, "params": { "value": value } }))
    }

    #[tokio::test]
    async fn unsubscribed_chat_gets_the_keyboard() {
        let h = Harness::new(BotKind::PowerNotify);
        h.message("hi").await;
        let keyboards = h.outbound.keyboards_to("42");
        assert_eq!(keyboards.len(), 1);
        assert_eq!(keyboards[0].values().collect::<Vec<_>>(), vec!["y", "n"]);
    }

    #[tokio::test]
    async fn subscribe_then_receive_reports() {
        let h = Harness::new(BotKind::PowerNotify);
        h.click(SUBSCRIBE).await;
        assert_eq!(
            h.notify(vec![charging(json!(true))]).await,
            Routed::Notify(1)
        );
        h.notify(vec![charging(json!(false))]).await;
        h.message("status?").await;
        assert_eq!(h.texts(), vec![
            "✅ Subscribed. I will report power state changes.",
            "[Power State] Charging Now",
            "[Power State] Not Charging",
            "You're subscribed. Waiting for device reports…",
        ]);
    }

    #[tokio::test]
    async fn repeated_subscribe_does_not_duplicate_reports() {
        let h = Harness::new(BotKind::PowerNotify);
        h.click(SUBSCRIBE).await;
        h.click(SUBSCRIBE).await;
        h.outbound.clear();
        h.notify(vec![charging(json!(true))]).await;
        assert_eq!(h.texts(), vec!["[Power State] Charging Now"]);
    }

    #[tokio::test]
    async fn unsubscribed_chats_hear_nothing() {
        let h = Harness::new(BotKind::PowerNotify);
        h.click(SUBSCRIBE).await;
        h.click(UNSUBSCRIBE).await;
        h.outbound.clear();
        h.notify(vec![charging(json!(true))]).await;
        assert!(h.outbound.sent().is_empty());
    }

    #[tokio::test]
    async fn reports_fan_out_to_every_subscriber() {
        let h = Harness::new(BotKind::PowerNotify);
        h.click(SUBSCRIBE).await;
        h.installed
            .router
            .dispatch(InboundUnit::callback(SessionId::from(7), SUBSCRIBE))
            .await;
        h.outbound.clear();
        h.notify(vec![charging(json!(false))]).await;
        assert_eq!(h.outbound.texts_to("7"), vec!["[Power State] Not Charging"]);
        assert_eq!(h.texts(), vec!["[Power State] Not Charging"]);
    }

    #[rstest]
    #[case(Some(json!(true)), true)]
    #[case(Some(json!(false)), false)]
    #[case(Some(json!(1)), true)]
    #[case(Some(json!(0)), false)]
    #[case(Some(json!("yes")), true)]
    #[case(Some(json!("")), false)]
    #[case(Some(json!(null)), false)]
    #[case(None, false)]
    fn charging_values(#[case] value: Option<Value>, #[case] expected: bool) {
        assert_eq!(is_charging(value.as_ref()), expected);
    }

    #[tokio::test]
    async fn numeric_and_missing_values_are_reported() {
        let h = Harness::new(BotKind::PowerNotify);
        h.click(SUBSCRIBE).await;
        h.outbound.clear();
        let frames = vec![
            charging(json!(1)),
            NotifyFrame(json!({ "method": CHARGING_STATE, "params": {} })),
        ];
        h.notify(frames).await;
        assert_eq!(h.texts(), vec![
            "[Power State] Charging Now",
            "[Power State] Not Charging",
        ]);
    }

    #[tokio::test]
    async fn other_events_are_skipped() {
        let h = Harness::new(BotKind::PowerNotify);
        h.click(SUBSCRIBE).await;
        h.outbound.clear();
        let frames = vec![NotifyFrame(
            json!({ "method": "CurBatteryLevel", "params": { "value": 80 } }),
        )];
        assert_eq!(h.notify(frames).await, Routed::Notify(1));
        assert!(h.outbound.sent().is_empty());
    }
}
