//! Prelude module - commonly used types for convenient import.
//!
//! Use `use growthos_gateway::prelude::*;` to import all essential types.

pub use crate::{GatewayError, GatewayResult, WsServer};
