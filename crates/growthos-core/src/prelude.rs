//! Prelude module - commonly used types for convenient import.
//!
//! Use `use growthos_core::prelude::*;` to import all essential types.

// Errors
pub use crate::{CoreError, CoreResult};

// Leads
pub use crate::{CheckinRecord, Lead, LeadId, MessageRecord, Mode, Sender, Stage};

// Metrics
pub use crate::{Metrics, MetricsDelta};
