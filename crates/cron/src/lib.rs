//! Scheduled-Activity Controller: at most one repeating timer per session,
//! driving autonomous device updates that share the session's
//! serialization with user-driven work.

pub mod playlist;
pub mod service;
pub mod types;

pub use {
    playlist::{PlayOrder, PlaylistState},
    service::{FailureFn, ScheduleController, TickFn},
    types::{ScheduleStatus, TickStatus},
};
