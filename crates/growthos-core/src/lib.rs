//! GrowthOS Core - Data model for the funnel simulator.
//!
//! This crate provides:
//! - The [`Lead`] record and its identifiers, stages and modes
//! - Message and check-in records appended by scenario runs
//! - The process-wide [`Metrics`] snapshot and [`MetricsDelta`] updates
//!
//! Nothing here is asynchronous or shared; synchronisation lives in
//! `growthos-engine`, which owns the single mutable copy of each type.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod error;
mod lead;
mod metrics;

pub use error::{CoreError, CoreResult};
pub use lead::{CheckinRecord, Lead, LeadId, MessageRecord, Mode, Sender, Stage};
pub use metrics::{Metrics, MetricsDelta};
