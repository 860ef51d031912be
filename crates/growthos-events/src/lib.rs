//! GrowthOS Events - Event fan-out for the funnel simulator.
//!
//! This crate provides:
//! - [`FunnelEvent`], the outbound wire event
//! - The [`Observer`] trait and the [`SessionRegistry`] of live observers
//! - [`EventBus`], which delivers every published event to the registry and
//!   to any async [`EventReceiver`] taps
//!
//! # Architecture
//!
//! Delivery to registered observers never blocks and never loses events
//! silently. An observer whose connection is gone ([`DeliveryError::Closed`])
//! or whose queue is full ([`DeliveryError::Full`]) is dropped from the
//! registry on the spot, without affecting the others.
//!
//! # Example
//!
//! ```rust
//! use growthos_core::Metrics;
//! use growthos_events::{EventBus, FunnelEvent};
//!
//! # async fn example() {
//! let bus = EventBus::new();
//! let mut receiver = bus.subscribe();
//!
//! bus.publish(FunnelEvent::Reset { metrics: Metrics::default() });
//!
//! let event = receiver.recv().await.unwrap();
//! assert_eq!(event.event_type(), "reset");
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod bus;
mod event;
mod observer;
mod registry;

pub use bus::{DEFAULT_CHANNEL_CAPACITY, EventBus, EventReceiver};
pub use event::FunnelEvent;
pub use observer::{ChannelObserver, DeliveryError, Observer};
pub use registry::{BroadcastReport, ObserverId, SessionRegistry};
