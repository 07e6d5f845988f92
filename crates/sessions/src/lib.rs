//! Per-session state.
//!
//! Each session owns one context object behind its own async mutex. Holding
//! that mutex is what serializes work on a session: the router holds it for
//! the duration of a handler, scheduled ticks acquire it before touching the
//! device. Sessions are created on first reference and live for the process.

pub mod store;
pub mod subscriptions;

pub use {
    store::{SessionGuard, SessionStore},
    subscriptions::Subscriptions,
};
