//! Wiring for `pixelbot run`: config to devices, bot, dispatcher, Telegram
//! account and the device callback endpoint.

use std::{
    path::Path,
    sync::{Arc, OnceLock},
    time::Duration,
};

use {
    anyhow::{Context as _, Result, bail},
    async_trait::async_trait,
    pixelbot_bots::{BotServices, BotSession, Installed, PlayerSettings, ShowTextEncoder, install},
    pixelbot_channels::{ChannelOutbound, ChannelRegistry, InboundSink, InboundUnit, Replier},
    pixelbot_common::types::{DeviceId, SessionId},
    pixelbot_config::{BridgeConfig, DeviceConfig, PixelbotConfig, discover_and_load, load_config},
    pixelbot_devices::{
        BindScope, Device, DeviceEvent, DeviceLink, DeviceRegistry, HttpDeviceLink, PIXELMUG_CLASS,
        PixelMug, RpcBridge, RpcEnvelope, RpcReply,
    },
    pixelbot_gateway::{GatewayState, start_gateway},
    pixelbot_routing::Dispatcher,
    pixelbot_sessions::{SessionStore, Subscriptions},
    pixelbot_telegram::{TelegramAccountConfig, TelegramPlugin},
    secrecy::Secret,
    tokio::sync::broadcast::{self, error::RecvError},
    tokio_util::sync::CancellationToken,
    tracing::{info, warn},
};

use crate::content_commands;

pub fn load(path: Option<&Path>) -> Result<PixelbotConfig> {
    match path {
        Some(path) => {
            load_config(path).with_context(|| format!("failed to load {}", path.display()))
        },
        None => Ok(discover_and_load()),
    }
}

/// Inbound sink that forwards once the dispatcher exists. The Telegram
/// plugin needs a sink before the router (which needs the plugin's
/// outbound) can be built.
#[derive(Default)]
struct LateSink {
    inner: OnceLock<Arc<dyn InboundSink>>,
}

impl LateSink {
    fn set(&self, sink: Arc<dyn InboundSink>) {
        if self.inner.set(sink).is_err() {
            warn!("inbound sink already connected");
        }
    }
}

#[async_trait]
impl InboundSink for LateSink {
    async fn submit(&self, unit: InboundUnit) {
        match self.inner.get() {
            Some(sink) => sink.submit(unit).await,
            None => warn!("dropping inbound unit received before the bot was ready"),
        }
    }
}

/// Stand-in link when no device gateway is configured.
struct OfflineLink;

#[async_trait]
impl DeviceLink for OfflineLink {
    async fn send(&self, envelope: &RpcEnvelope) -> pixelbot_devices::Result<Option<RpcReply>> {
        Err(pixelbot_devices::Error::transport(format!(
            "no device gateway configured (bridge.url), cannot reach {}",
            envelope.device
        )))
    }
}

fn device_link(config: &BridgeConfig) -> Result<Arc<dyn DeviceLink>> {
    let timeout = Duration::from_millis(config.timeout_ms);
    match config.url.as_deref().map(str::trim).filter(|u| !u.is_empty()) {
        Some(url) => {
            let link = HttpDeviceLink::new(url, config.token.clone(), timeout)?;
            info!(url, "device gateway link ready");
            Ok(Arc::new(link))
        },
        None => {
            warn!("bridge.url is not set; device calls will fail");
            Ok(Arc::new(OfflineLink))
        },
    }
}

/// Register every configured device and bind it globally or to the listed
/// sessions. Returns the mugs in configuration order.
fn bind_devices(registry: &DeviceRegistry, devices: &[DeviceConfig]) -> Result<Vec<Arc<PixelMug>>> {
    let mut mugs = Vec::with_capacity(devices.len());
    for config in devices {
        if config.class != PIXELMUG_CLASS {
            bail!("device '{}' has unsupported class '{}'", config.id, config.class);
        }
        let mug = Arc::new(PixelMug::new(DeviceId::new(config.id.as_str())?));
        let device = [Arc::clone(&mug) as Arc<dyn Device>];
        if config.sessions.is_empty() {
            registry.bind(BindScope::Global, &device);
        } else {
            for session in &config.sessions {
                registry.bind(BindScope::Session(SessionId::new(session.as_str())?), &device);
            }
        }
        mugs.push(mug);
    }
    info!(devices = mugs.len(), "devices bound");
    Ok(mugs)
}

struct Assembled {
    svc: Arc<BotServices>,
    installed: Installed,
    /// Subscribed before binding, so it already holds the startup events.
    events: broadcast::Receiver<DeviceEvent>,
}

fn assemble(config: &PixelbotConfig, outbound: Arc<dyn ChannelOutbound>) -> Result<Assembled> {
    let registry = Arc::new(DeviceRegistry::new());
    let events = registry.subscribe();
    let mugs = bind_devices(&registry, &config.devices)?;
    let bridge = Arc::new(
        RpcBridge::new(registry, device_link(&config.bridge)?)
            .with_timeout(Duration::from_millis(config.bridge.timeout_ms)),
    );

    let svc = Arc::new(BotServices {
        replier: Replier::new(outbound, config.telegram.account.clone()),
        bridge,
        sessions: Arc::new(SessionStore::<BotSession>::new()),
        subscriptions: Arc::new(Subscriptions::new()),
        content: Arc::new(content_commands::fetcher(&config.content)?),
        text: Arc::new(ShowTextEncoder),
        mugs,
        player: PlayerSettings::from_config(&config.player)?,
    });
    let installed = install(config.bot.kind, Arc::clone(&svc))?;
    Ok(Assembled {
        svc,
        installed,
        events,
    })
}

/// Surface registry events until `shutdown` fires. Attach itself happens on
/// the bridge side, so each request is logged for the operator. Returns the
/// number of events seen.
async fn watch_device_events(
    mut events: broadcast::Receiver<DeviceEvent>,
    shutdown: CancellationToken,
) -> usize {
    let mut seen = 0;
    loop {
        let event = tokio::select! {
            biased;
            () = shutdown.cancelled() => break,
            event = events.recv() => event,
        };
        match event {
            Ok(DeviceEvent::AttachRequested {
                scope,
                device,
                class,
            }) => {
                seen += 1;
                info!(device = %device, class, scope = ?scope, "device attach requested");
            },
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "device event watcher fell behind");
            },
            Err(RecvError::Closed) => break,
        }
    }
    seen
}

pub fn print_commands(config: &PixelbotConfig) -> Result<()> {
    let plugin = TelegramPlugin::new(Arc::new(LateSink::default()));
    let assembled = assemble(config, plugin.shared_outbound())?;
    let commands = assembled.installed.router.commands();
    if commands.is_empty() {
        println!("{} bot has no commands", config.bot.kind);
    }
    for spec in commands {
        println!("/{:<12} {}", spec.command, spec.description);
    }
    Ok(())
}

pub async fn run(config: PixelbotConfig) -> Result<()> {
    let token = config
        .telegram
        .token_str()
        .map(String::from)
        .context("telegram.token is not set (try PIXELBOT_TELEGRAM_TOKEN)")?;
    let account = config.telegram.account.clone();

    let late = Arc::new(LateSink::default());
    let plugin = TelegramPlugin::new(Arc::clone(&late) as Arc<dyn InboundSink>);
    let outbound = plugin.shared_outbound();
    let Assembled {
        svc,
        installed,
        events,
    } = assemble(&config, Arc::clone(&outbound) as _)?;
    let shutdown = CancellationToken::new();
    let device_events = tokio::spawn(watch_device_events(events, shutdown.clone()));
    let Installed { router, scheduler } = installed;
    let commands = router.commands();

    let dispatcher = Dispatcher::new(Arc::new(router));
    late.set(Arc::clone(&dispatcher) as Arc<dyn InboundSink>);

    let mut channels = ChannelRegistry::new();
    channels.register(Box::new(plugin));
    let account_config = TelegramAccountConfig {
        token: Secret::new(token),
        poll_timeout_secs: config.telegram.poll_timeout_secs,
        retry_delay_ms: config.telegram.retry_delay_ms,
        register_commands: config.telegram.register_commands,
    };
    let plugin = channels
        .get_mut("telegram")
        .context("telegram channel is not registered")?;
    plugin
        .start_account(&account, serde_json::to_value(&account_config)?)
        .await?;
    if config.telegram.register_commands
        && !commands.is_empty()
        && let Err(e) = outbound.set_commands(&account, &commands).await
    {
        warn!(account = %account, error = %e, "failed to register command menu");
    }

    let gateway_state = GatewayState::new(
        Arc::clone(&dispatcher) as Arc<dyn InboundSink>,
        Arc::clone(&svc.bridge),
    )
    .with_token(config.server.token.clone());
    let bind = config.server.bind.clone();
    let port = config.server.port;
    let mut gateway = tokio::spawn({
        let shutdown = shutdown.clone();
        async move { start_gateway(&bind, port, gateway_state, shutdown).await }
    });

    info!(
        bot = %config.bot.kind,
        account = %account,
        devices = svc.mugs.len(),
        "pixelbot running, press Ctrl-C to stop"
    );
    // The endpoint only returns early when it fails; stop the bot then too.
    let early_exit = tokio::select! {
        res = tokio::signal::ctrl_c() => {
            res.context("failed to listen for Ctrl-C")?;
            None
        },
        res = &mut gateway => Some(res),
    };

    info!("shutting down");
    if let Some(scheduler) = &scheduler {
        scheduler.stop_all().await;
    }
    dispatcher.shutdown();
    channels.stop_all(&[account]).await;
    shutdown.cancel();
    if let Ok(seen) = device_events.await {
        info!(events = seen, "device event watcher stopped");
    }
    let gateway_result = match early_exit {
        Some(res) => res,
        None => gateway.await,
    };
    match gateway_result {
        Ok(Ok(())) => {},
        Ok(Err(e)) => warn!(error = %e, "device callback endpoint failed"),
        Err(e) => warn!(error = %e, "device callback endpoint task panicked"),
    }
    Ok(())
}
