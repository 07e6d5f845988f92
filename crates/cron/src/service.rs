//! Per-session repeating timers.
//!
//! `start` cancels whatever timer the session had, schedules one immediate
//! tick without blocking the caller, then arms a repeating timer. Every tick
//! first acquires the session from the [`SessionStore`], so ticks and router
//! dispatch for the same session never overlap. Cancelling a timer lets a
//! tick that already holds the session finish; the stale timer never ticks
//! again afterwards.

use std::{
    collections::HashMap,
    future::Future,
    pin::Pin,
    sync::{
        Arc, Mutex, MutexGuard,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use {
    anyhow::Result,
    pixelbot_common::types::SessionId,
    pixelbot_sessions::{SessionGuard, SessionStore},
    tokio::{
        task::JoinHandle,
        time::{Instant, MissedTickBehavior},
    },
    tokio_util::sync::CancellationToken,
    tracing::{debug, info, warn},
};

use crate::types::{ScheduleStatus, TickStatus};

/// Autonomous action run on every tick, with the session held.
pub type TickFn<S> = Arc<
    dyn Fn(SessionId, SessionGuard<S>) -> Pin<Box<dyn Future<Output = Result<()>> + Send>>
        + Send
        + Sync,
>;

/// Reports a failed tick to the session. Runs after the session is released.
pub type FailureFn = Arc<
    dyn Fn(SessionId, anyhow::Error) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync,
>;

const MIN_INTERVAL: Duration = Duration::from_millis(1);

struct ActiveTimer {
    generation: u64,
    interval: Duration,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
    stats: Arc<Mutex<TickStats>>,
}

#[derive(Default)]
struct TickStats {
    ticks: u64,
    last_status: Option<TickStatus>,
    last_error: Option<String>,
}

pub struct ScheduleController<S> {
    sessions: Arc<SessionStore<S>>,
    on_tick: TickFn<S>,
    on_failure: Option<FailureFn>,
    timers: Mutex<HashMap<SessionId, ActiveTimer>>,
    generation: AtomicU64,
}

impl<S: Default + Send + 'static> ScheduleController<S> {
    pub fn new(sessions: Arc<SessionStore<S>>, on_tick: TickFn<S>) -> Arc<Self> {
        Self::with_failure(sessions, on_tick, None)
    }

    pub fn with_failure(
        sessions: Arc<SessionStore<S>>,
        on_tick: TickFn<S>,
        on_failure: Option<FailureFn>,
    ) -> Arc<Self> {
        Arc::new(Self {
            sessions,
            on_tick,
            on_failure,
            timers: Mutex::new(HashMap::new()),
            generation: AtomicU64::new(0),
        })
    }

    /// Arm the session's timer, replacing any active one. Returns the new
    /// timer's generation. Never waits for the session.
    pub fn start(self: &Arc<Self>, session: &SessionId, interval: Duration) -> u64 {
        let interval = interval.max(MIN_INTERVAL);
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let cancel = CancellationToken::new();
        let stats = Arc::new(Mutex::new(TickStats::default()));
        // Cadence is anchored at arming time, not at the end of the first tick.
        let first_at = Instant::now() + interval;

        let mut timers = self.timers();
        if let Some(old) = timers.remove(session) {
            old.cancel.cancel();
            debug!(session = %session, generation = old.generation, "cancelled previous timer");
        }

        let svc = Arc::clone(self);
        let task_session = session.clone();
        let task_cancel = cancel.clone();
        let task_stats = Arc::clone(&stats);
        let handle = tokio::spawn(async move {
            svc.tick(&task_session, &task_cancel, &task_stats).await;

            let mut ticker = tokio::time::interval_at(first_at, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;
                    () = task_cancel.cancelled() => break,
                    _ = ticker.tick() => svc.tick(&task_session, &task_cancel, &task_stats).await,
                }
            }
            debug!(session = %task_session, generation, "timer finished");
        });

        timers.insert(session.clone(), ActiveTimer {
            generation,
            interval,
            cancel,
            handle,
            stats,
        });
        info!(
            session = %session,
            generation,
            interval_ms = interval.as_millis() as u64,
            "timer armed"
        );
        generation
    }

    /// Same as [`start`](Self::start): used when cadence or order changes so
    /// the change applies immediately.
    pub fn restart(self: &Arc<Self>, session: &SessionId, interval: Duration) -> u64 {
        self.start(session, interval)
    }

    /// Cancel the session's timer. Returns whether one was active.
    pub fn stop(&self, session: &SessionId) -> bool {
        match self.timers().remove(session) {
            Some(timer) => {
                timer.cancel.cancel();
                info!(session = %session, generation = timer.generation, "timer stopped");
                true
            },
            None => false,
        }
    }

    pub fn is_running(&self, session: &SessionId) -> bool {
        self.timers().contains_key(session)
    }

    pub fn status(&self, session: &SessionId) -> Option<ScheduleStatus> {
        let timers = self.timers();
        let timer = timers.get(session)?;
        let stats = timer.stats.lock().unwrap_or_else(|e| e.into_inner());
        Some(ScheduleStatus {
            session: session.clone(),
            interval_ms: timer.interval.as_millis() as u64,
            generation: timer.generation,
            ticks: stats.ticks,
            last_status: stats.last_status,
            last_error: stats.last_error.clone(),
        })
    }

    pub fn active_count(&self) -> usize {
        self.timers().len()
    }

    /// Cancel every timer and wait for their tasks to wind down.
    pub async fn stop_all(&self) {
        let drained: Vec<_> = self.timers().drain().collect();
        for (_, timer) in &drained {
            timer.cancel.cancel();
        }
        for (session, timer) in drained {
            if let Err(e) = timer.handle.await {
                warn!(session = %session, error = %e, "timer task ended abnormally");
            }
        }
        info!("all timers stopped");
    }

    async fn tick(
        &self,
        session: &SessionId,
        cancel: &CancellationToken,
        stats: &Mutex<TickStats>,
    ) {
        let guard = tokio::select! {
            biased;
            () = cancel.cancelled() => None,
            guard = self.sessions.lock(session) => Some(guard),
        };
        // Invalidated while waiting: a newer timer owns the session now.
        let Some(guard) = guard.filter(|_| !cancel.is_cancelled()) else {
            debug!(session = %session, "skipping tick of cancelled timer");
            record(stats, TickStatus::Skipped, None);
            return;
        };

        match (self.on_tick)(session.clone(), guard).await {
            Ok(()) => record(stats, TickStatus::Ok, None),
            Err(e) => {
                warn!(session = %session, error = %e, "scheduled tick failed");
                record(stats, TickStatus::Error, Some(e.to_string()));
                if let Some(report) = &self.on_failure {
                    report(session.clone(), e).await;
                }
            },
        }
    }

    fn timers(&self) -> MutexGuard<'_, HashMap<SessionId, ActiveTimer>> {
        self.timers.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn record(stats: &Mutex<TickStats>, status: TickStatus, error: Option<String>) {
    let mut stats = stats.lock().unwrap_or_else(|e| e.into_inner());
    if status != TickStatus::Skipped {
        stats.ticks += 1;
    }
    stats.last_status = Some(status);
    stats.last_error = error;
}
