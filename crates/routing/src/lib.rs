//! Event Router and the per-session dispatcher in front of it.
//!
//! Precedence for one inbound unit, first match wins:
//! 1. Device notification frames (decoded, fanned out to the notify handler)
//! 2. Interactive callback value (exact match in the callback table)
//! 3. Chat message text (leading `/command` token, else the fallback handler)

pub mod command;
pub mod dispatcher;
pub mod error;
pub mod handler;
pub mod router;

pub use {
    command::parse_command,
    dispatcher::Dispatcher,
    error::{Error, Result},
    handler::{Context, Handler, NotifyHandler, NotifyOrigin},
    router::{EventRouter, Routed},
};
