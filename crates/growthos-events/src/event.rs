//! Outbound event types.

use chrono::{DateTime, Utc};
use growthos_core::{CheckinRecord, Lead, LeadId, Metrics, Sender, Stage};
use serde::{Deserialize, Serialize};

/// An event broadcast to every observer.
///
/// Serialized with a `type` tag in `snake_case`. Every variant except
/// [`FunnelEvent::Message`] carries the metrics snapshot taken in the same
/// critical section as the mutation it reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FunnelEvent {
    /// All leads and counters were cleared.
    Reset {
        /// Counters after the reset (all zero).
        metrics: Metrics,
    },

    /// A lead entered the funnel.
    NewLead {
        /// Full lead record.
        patient: Box<Lead>,
        /// Counters including the new lead.
        metrics: Metrics,
    },

    /// A scripted message was exchanged.
    Message {
        /// Lead the message belongs to.
        patient_id: LeadId,
        /// Author.
        sender: Sender,
        /// Body.
        text: String,
        /// Emission time.
        timestamp: DateTime<Utc>,
    },

    /// A lead moved to a new stage.
    StageChange {
        /// Lead that moved.
        patient_id: LeadId,
        /// Stage it moved to.
        stage: Stage,
        /// Counters including the transition.
        metrics: Metrics,
    },

    /// A retention check-in was delivered.
    Checkin {
        /// The check-in record.
        data: CheckinRecord,
        /// Counters at delivery.
        metrics: Metrics,
    },
}

impl FunnelEvent {
    /// Wire name of the event type.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Reset { .. } => "reset",
            Self::NewLead { .. } => "new_lead",
            Self::Message { .. } => "message",
            Self::StageChange { .. } => "stage_change",
            Self::Checkin { .. } => "checkin",
        }
    }

    /// Metrics snapshot carried by the event, if any.
    #[must_use]
    pub fn metrics(&self) -> Option<&Metrics> {
        match self {
            Self::Reset { metrics }
            | Self::NewLead { metrics, .. }
            | Self::StageChange { metrics, .. }
            | Self::Checkin { metrics, .. } => Some(metrics),
            Self::Message { .. } => None,
        }
    }

    /// Lead the event concerns. `None` for [`FunnelEvent::Reset`].
    #[must_use]
    pub fn lead_id(&self) -> Option<&LeadId> {
        match self {
            Self::Reset { .. } => None,
            Self::NewLead { patient, .. } => Some(&patient.id),
            Self::Message { patient_id, .. } | Self::StageChange { patient_id, .. } => {
                Some(patient_id)
            },
            Self::Checkin { data, .. } => Some(&data.patient_id),
        }
    }
}
