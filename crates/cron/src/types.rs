//! Data types for the scheduled-activity controller.

use {pixelbot_common::types::SessionId, serde::Serialize};

/// Outcome of a single tick.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum TickStatus {
    Ok,
    Error,
    /// The timer was invalidated before the tick acquired the session.
    Skipped,
}

/// Snapshot of one session's timer. Reading it has no effect on the timer.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleStatus {
    pub session: SessionId,
    pub interval_ms: u64,
    /// Bumped by every `start`/`restart`; identifies the armed timer.
    pub generation: u64,
    pub ticks: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_status: Option<TickStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}
