//! GrowthOS Gateway - `WebSocket` front end for the funnel simulator.
//!
//! Observers connect at the configured path, receive every
//! [`growthos_events::FunnelEvent`] as a JSON text frame, and may send
//! commands (`reset`, `simulate_lead`, `simulate_retention`) at any time.
//! Malformed frames and unknown actions are dropped without a reply.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod connection;
mod error;
mod server;

pub use error::{GatewayError, GatewayResult};
pub use server::WsServer;
