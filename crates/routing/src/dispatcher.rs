//! Per-session workers in front of the router.
//!
//! Units for one session are queued to a single worker task and dispatched
//! strictly one after another; different sessions run concurrently. Units
//! without a session (device notifications) share one worker of their own.
//! Queues are bounded; a unit arriving at a full queue is dropped so one
//! busy session never holds up the caller.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use {
    async_trait::async_trait,
    pixelbot_channels::{InboundSink, InboundUnit},
    pixelbot_common::types::SessionId,
    tokio::sync::mpsc::{self, error::TrySendError},
    tokio_util::sync::CancellationToken,
    tracing::{debug, warn},
};

use crate::{Error, Result, router::EventRouter};

const QUEUE_DEPTH: usize = 64;

/// `None` keys the worker for sessionless units.
type Workers = HashMap<Option<SessionId>, mpsc::Sender<InboundUnit>>;

pub struct Dispatcher<S> {
    router: Arc<EventRouter<S>>,
    workers: Mutex<Workers>,
    cancel: CancellationToken,
}

impl<S: Default + Send + 'static> Dispatcher<S> {
    pub fn new(router: Arc<EventRouter<S>>) -> Arc<Self> {
        Arc::new(Self {
            router,
            workers: Mutex::new(HashMap::new()),
            cancel: CancellationToken::new(),
        })
    }

    pub fn router(&self) -> &Arc<EventRouter<S>> {
        &self.router
    }

    /// Queue a unit on its session's worker without waiting for room.
    pub async fn enqueue(&self, unit: InboundUnit) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(Error::ShutDown);
        }
        let key = unit.session_key().cloned();
        let tx = self.worker(&key);
        tx.try_send(unit).map_err(|e| match e {
            TrySendError::Full(_) => Error::QueueFull {
                worker: worker_label(&key),
            },
            TrySendError::Closed(_) => Error::ShutDown,
        })
    }

    /// Stop all workers. Units already being dispatched finish; queued ones
    /// are dropped.
    pub fn shutdown(&self) {
        self.cancel.cancel();
        self.workers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }

    pub fn worker_count(&self) -> usize {
        self.workers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    fn worker(&self, key: &Option<SessionId>) -> mpsc::Sender<InboundUnit> {
        let mut workers = self.workers.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(tx) = workers.get(key)
            && !tx.is_closed()
        {
            return tx.clone();
        }

        let (tx, mut rx) = mpsc::channel::<InboundUnit>(QUEUE_DEPTH);
        let router = Arc::clone(&self.router);
        let cancel = self.cancel.clone();
        let label = worker_label(key);
        debug!(worker = %label, "spawning dispatch worker");
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    unit = rx.recv() => match unit {
                        Some(unit) => {
                            let routed = router.dispatch(unit).await;
                            debug!(worker = %label, ?routed, "dispatched");
                        },
                        None => break,
                    },
                }
            }
            debug!(worker = %label, "dispatch worker stopped");
        });
        workers.insert(key.clone(), tx.clone());
        tx
    }
}

fn worker_label(key: &Option<SessionId>) -> String {
    key.as_ref()
        .map_or_else(|| "devices".to_string(), ToString::to_string)
}

#[async_trait]
impl<S: Default + Send + 'static> InboundSink for Dispatcher<S> {
    async fn submit(&self, unit: InboundUnit) {
        if let Err(e) = self.enqueue(unit).await {
            warn!(error = %e, "dropping inbound unit");
        }
    }
}
