//! Channel plugin system.
//!
//! A channel (Telegram today) turns platform updates into [`InboundUnit`]s
//! for the router and delivers outbound text and inline keyboards back to a
//! session.

pub mod error;
pub mod inbound;
pub mod plugin;
pub mod registry;
pub mod reply;
#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use {
    error::{Error, Result},
    inbound::{Inbound, InboundSink, InboundUnit},
    plugin::{ChannelEvent, ChannelOutbound, ChannelPlugin, CommandSpec},
    registry::ChannelRegistry,
    reply::Replier,
};
