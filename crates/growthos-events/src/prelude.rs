//! Prelude module - commonly used types for convenient import.
//!
//! Use `use growthos_events::prelude::*;` to import all essential types.

// Event bus
pub use crate::{DEFAULT_CHANNEL_CAPACITY, EventBus, EventReceiver};

// Events
pub use crate::FunnelEvent;

// Observers
pub use crate::{
    BroadcastReport, ChannelObserver, DeliveryError, Observer, ObserverId, SessionRegistry,
};
