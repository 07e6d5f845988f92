use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use {
    pixelbot_channels::{CommandSpec, Inbound, InboundUnit, Replier},
    pixelbot_common::types::{DeviceId, NotifyFrame, SessionId},
    pixelbot_devices::{DeviceRegistry, NotifyEvent, notify},
    pixelbot_sessions::SessionStore,
    tracing::{debug, warn},
};

use crate::{
    Error, Result,
    command::{is_valid_token, parse_command},
    handler::{Context, Handler, NotifyHandler, NotifyOrigin},
};

/// Which path a dispatched unit took.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Routed {
    /// Notify frames decoded into this many events.
    Notify(usize),
    Callback(String),
    Command(String),
    /// Free-form text handled by the fallback handler.
    Message,
    Ignored,
}

struct CommandEntry<S> {
    description: String,
    handler: Arc<dyn Handler<S>>,
}

/// Registration tables plus the precedence logic. Holds no per-session
/// state of its own.
pub struct EventRouter<S> {
    sessions: Arc<SessionStore<S>>,
    commands: BTreeMap<String, CommandEntry<S>>,
    callbacks: HashMap<String, Arc<dyn Handler<S>>>,
    fallback: Option<Arc<dyn Handler<S>>>,
    notify: Option<Arc<dyn NotifyHandler>>,
    registry: Option<Arc<DeviceRegistry>>,
    replier: Option<Replier>,
}

impl<S: Default + Send + 'static> EventRouter<S> {
    pub fn new(sessions: Arc<SessionStore<S>>) -> Self {
        Self {
            sessions,
            commands: BTreeMap::new(),
            callbacks: HashMap::new(),
            fallback: None,
            notify: None,
            registry: None,
            replier: None,
        }
    }

    /// Decode notify frames with the originating device's own decoder when
    /// the device is known.
    #[must_use]
    pub fn with_registry(mut self, registry: Arc<DeviceRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Where handler errors are reported as `Error: ...` messages.
    #[must_use]
    pub fn with_replier(mut self, replier: Replier) -> Self {
        self.replier = Some(replier);
        self
    }

    pub fn sessions(&self) -> &Arc<SessionStore<S>> {
        &self.sessions
    }

    /// Register a command. Re-registering a token replaces the previous
    /// description and handler.
    pub fn command(
        &mut self,
        token: &str,
        description: impl Into<String>,
        handler: impl Handler<S> + 'static,
    ) -> Result<&mut Self> {
        let token = token.trim_start_matches('/');
        if !is_valid_token(token) {
            return Err(Error::invalid_command(token));
        }
        if self
            .commands
            .insert(token.to_string(), CommandEntry {
                description: description.into(),
                handler: Arc::new(handler),
            })
            .is_some()
        {
            debug!(token, "command re-registered, replacing previous handler");
        }
        Ok(self)
    }

    /// Register a callback value.
    pub fn callback(&mut self, value: impl Into<String>, handler: impl Handler<S> + 'static) -> &mut Self {
        self.callbacks.insert(value.into(), Arc::new(handler));
        self
    }

    /// Register one handler for several callback values.
    pub fn callbacks<I, V>(&mut self, values: I, handler: impl Handler<S> + 'static) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        let handler: Arc<dyn Handler<S>> = Arc::new(handler);
        for value in values {
            self.callbacks.insert(value.into(), Arc::clone(&handler));
        }
        self
    }

    /// Handler for text that is not a registered command.
    pub fn fallback(&mut self, handler: impl Handler<S> + 'static) -> &mut Self {
        self.fallback = Some(Arc::new(handler));
        self
    }

    pub fn on_notify(&mut self, handler: impl NotifyHandler + 'static) -> &mut Self {
        self.notify = Some(Arc::new(handler));
        self
    }

    /// Command table as advertised to the chat platform.
    pub fn commands(&self) -> Vec<CommandSpec> {
        self.commands
            .iter()
            .map(|(token, entry)| CommandSpec::new(token, &entry.description))
            .collect()
    }

    pub fn has_callback(&self, value: &str) -> bool {
        self.callbacks.contains_key(value)
    }

    /// Route one inbound unit down exactly one path.
    pub async fn dispatch(&self, unit: InboundUnit) -> Routed {
        match unit.classify() {
            Inbound::Notify {
                session,
                device,
                frames,
            } => {
                let events = self.decode(device.as_ref(), &frames);
                let count = events.len();
                if count == 0 {
                    debug!(frames = frames.len(), "notify frames decoded to nothing");
                    return Routed::Notify(0);
                }
                match &self.notify {
                    Some(handler) => {
                        let origin = NotifyOrigin { session, device };
                        if let Err(e) = handler.on_notify(origin, events).await {
                            warn!(error = %e, "notify handler failed");
                        }
                    },
                    None => debug!(count, "no notify handler registered, dropping events"),
                }
                Routed::Notify(count)
            },
            Inbound::Callback { session, value } => {
                let Some(handler) = self.callbacks.get(&value) else {
                    debug!(session = %session, value = %value, "ignoring unmatched callback");
                    return Routed::Ignored;
                };
                self.run(handler.as_ref(), session, value.clone(), String::new())
                    .await;
                Routed::Callback(value)
            },
            Inbound::Message { session, text } => {
                if let Some((token, args)) = parse_command(&text)
                    && let Some(entry) = self.commands.get(token)
                {
                    let token = token.to_string();
                    let args = args.to_string();
                    self.run(entry.handler.as_ref(), session, text, args).await;
                    return Routed::Command(token);
                }
                match &self.fallback {
                    Some(handler) => {
                        self.run(handler.as_ref(), session, text, String::new())
                            .await;
                        Routed::Message
                    },
                    None => {
                        debug!(session = %session, "no handler for message");
                        Routed::Ignored
                    },
                }
            },
            Inbound::Unknown => Routed::Ignored,
        }
    }

    fn decode(&self, device: Option<&DeviceId>, frames: &[NotifyFrame]) -> Vec<NotifyEvent> {
        match (device, &self.registry) {
            (Some(id), Some(registry)) => match registry.device(id) {
                Some(device) => device.parse_notify(frames),
                None => notify::decode(frames),
            },
            _ => notify::decode(frames),
        }
    }

    /// Run a chat handler with the session held. Errors become a chat
    /// message and never escape.
    async fn run(&self, handler: &dyn Handler<S>, session: SessionId, input: String, args: String) {
        let state = self.sessions.lock(&session).await;
        let ctx = Context {
            session: session.clone(),
            state,
            input,
            args,
        };
        if let Err(e) = handler.handle(ctx).await {
            warn!(session = %session, error = %e, "handler failed");
            if let Some(replier) = &self.replier {
                replier.send(&session, format!("Error: {e}")).await;
            }
        }
    }
}
