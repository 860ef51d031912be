//! Aggregate funnel metrics.
//!
//! [`Metrics`] is the snapshot included in broadcast events. It only ever
//! grows: updates arrive as a [`MetricsDelta`] whose fields are unsigned, and
//! the only way back to zero is [`Metrics::reset`].

use serde::{Deserialize, Serialize};

use crate::lead::Mode;

/// Running mean of first-response latencies for one mode.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct ResponseAverage {
    samples: u64,
    total_secs: f64,
}

impl ResponseAverage {
    /// Add a sample and return the updated mean.
    #[allow(clippy::cast_precision_loss)]
    fn record(&mut self, secs: f64) -> f64 {
        self.samples = self.samples.saturating_add(1);
        self.total_secs += secs;
        self.total_secs / self.samples as f64
    }
}

/// Process-wide funnel counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    /// Leads issued since the last reset.
    pub total_leads: u64,
    /// Leads that booked an appointment.
    pub booked: u64,
    /// Leads that attended.
    pub showed: u64,
    /// Booked leads retained past the first month.
    pub retained: u64,
    /// Retained leads that bought an add-on.
    pub upsold: u64,
    /// Leads lost to a competitor.
    pub lost: u64,
    /// Value captured from bookings and upsells.
    pub revenue_captured: u64,
    /// Expected value of lost leads.
    pub revenue_lost: u64,
    /// Mean scripted seconds to first reply for legacy leads.
    pub avg_response_time_old: f64,
    /// Mean scripted seconds to first reply for automated leads.
    pub avg_response_time_new: f64,
    #[serde(skip)]
    legacy_responses: ResponseAverage,
    #[serde(skip)]
    automated_responses: ResponseAverage,
}

impl Metrics {
    /// Apply a delta to the counters.
    pub fn apply(&mut self, delta: &MetricsDelta) {
        self.total_leads = self.total_leads.saturating_add(delta.total_leads);
        self.booked = self.booked.saturating_add(delta.booked);
        self.showed = self.showed.saturating_add(delta.showed);
        self.retained = self.retained.saturating_add(delta.retained);
        self.upsold = self.upsold.saturating_add(delta.upsold);
        self.lost = self.lost.saturating_add(delta.lost);
        self.revenue_captured = self.revenue_captured.saturating_add(delta.revenue_captured);
        self.revenue_lost = self.revenue_lost.saturating_add(delta.revenue_lost);

        if let Some((mode, secs)) = delta.response_sample {
            match mode {
                Mode::Automated => {
                    self.avg_response_time_new = self.automated_responses.record(secs);
                },
                Mode::Legacy => {
                    self.avg_response_time_old = self.legacy_responses.record(secs);
                },
            }
        }
    }

    /// Restore every counter to zero.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Whether the terminal counters are consistent with the number of
    /// leads issued.
    ///
    /// Retained and upsold are subsets of booked, so only booked and lost
    /// count against the total.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.booked.saturating_add(self.lost) <= self.total_leads
            && self.retained <= self.booked
            && self.upsold <= self.retained
    }
}

/// Increments to apply to [`Metrics`] for one lead transition.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MetricsDelta {
    /// Leads issued.
    pub total_leads: u64,
    /// Bookings.
    pub booked: u64,
    /// Attendances.
    pub showed: u64,
    /// Retentions.
    pub retained: u64,
    /// Upsells.
    pub upsold: u64,
    /// Losses.
    pub lost: u64,
    /// Value captured.
    pub revenue_captured: u64,
    /// Value lost.
    pub revenue_lost: u64,
    /// First-response latency sample, in scripted seconds.
    pub response_sample: Option<(Mode, f64)>,
}

impl MetricsDelta {
    /// A new lead entered the funnel.
    #[must_use]
    pub fn new_lead() -> Self {
        Self {
            total_leads: 1,
            ..Self::default()
        }
    }

    /// A lead booked, capturing `value`.
    #[must_use]
    pub fn booked(value: u64) -> Self {
        Self {
            booked: 1,
            revenue_captured: value,
            ..Self::default()
        }
    }

    /// A lead was lost, forfeiting `expected_value`.
    #[must_use]
    pub fn lost(expected_value: u64) -> Self {
        Self {
            lost: 1,
            revenue_lost: expected_value,
            ..Self::default()
        }
    }

    /// A booked lead was retained.
    #[must_use]
    pub fn retained() -> Self {
        Self {
            retained: 1,
            ..Self::default()
        }
    }

    /// A retained lead bought an add-on worth `value`.
    #[must_use]
    pub fn upsold(value: u64) -> Self {
        Self {
            upsold: 1,
            revenue_captured: value,
            ..Self::default()
        }
    }

    /// A lead received its first business-side reply after `secs`.
    #[must_use]
    pub fn first_response(mode: Mode, secs: f64) -> Self {
        Self {
            response_sample: Some((mode, secs)),
            ..Self::default()
        }
    }
}
