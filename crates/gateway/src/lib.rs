//! HTTP endpoint for the device gateway.
//!
//! The device side posts notify frames and asynchronous RPC replies here;
//! frames become inbound units, replies complete pending bridge calls.

pub mod error;
pub mod server;
pub mod state;

pub use {
    error::ApiError,
    server::{build_gateway_app, start_gateway},
    state::GatewayState,
};
