//! Shared application context.

use std::collections::HashSet;
use std::sync::Arc;

use growthos_config::{Config, RevenueSection};
use growthos_core::{Lead, LeadId, Metrics};
use growthos_events::EventBus;
use tokio::sync::{Mutex, MutexGuard};
use tokio_util::sync::CancellationToken;

use crate::catalog::ScenarioCatalog;
use crate::delay::DelayPolicy;
use crate::metrics::MetricsAggregator;
use crate::store::LeadStore;

/// Tunables the engine reads on every run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineSettings {
    /// Delay compression and scaling.
    pub delays: DelayPolicy,
    /// Values applied by booking, loss and upsell steps.
    pub revenue: RevenueSection,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl EngineSettings {
    /// Extract engine settings from a loaded config.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            delays: DelayPolicy::from_section(&config.simulation),
            revenue: config.revenue,
        }
    }
}

/// Mutable state guarded by the context lock.
#[derive(Debug)]
pub(crate) struct FunnelState {
    pub(crate) store: LeadStore,
    pub(crate) metrics: MetricsAggregator,
    /// Bumped on every reset.
    pub(crate) generation: u64,
    /// Cancelled and replaced on every reset.
    pub(crate) cancel: CancellationToken,
    /// Leads with a retention run in flight.
    pub(crate) retention_active: HashSet<LeadId>,
}

impl FunnelState {
    fn new() -> Self {
        Self {
            store: LeadStore::new(),
            metrics: MetricsAggregator::new(),
            generation: 0,
            cancel: CancellationToken::new(),
            retention_active: HashSet::new(),
        }
    }

    /// Ticket binding a new run to the current generation.
    pub(crate) fn ticket(&self, lead_id: LeadId) -> RunTicket {
        RunTicket {
            lead_id,
            generation: self.generation,
            token: self.cancel.child_token(),
        }
    }

    /// Whether a run holding `ticket` may still apply side effects.
    pub(crate) fn is_current(&self, ticket: &RunTicket) -> bool {
        ticket.generation == self.generation
            && !ticket.token.is_cancelled()
            && self.store.contains(&ticket.lead_id)
    }
}

/// Identity of one scenario run.
#[derive(Debug, Clone)]
pub(crate) struct RunTicket {
    pub(crate) lead_id: LeadId,
    pub(crate) generation: u64,
    pub(crate) token: CancellationToken,
}

/// The explicitly owned application context.
///
/// Holds the lead store and metrics behind one async lock, plus the event
/// bus, the scenario catalog and the engine settings. Cloning is cheap and
/// every clone shares the same state, so tests can build isolated instances.
#[derive(Debug, Clone)]
pub struct FunnelContext {
    state: Arc<Mutex<FunnelState>>,
    bus: EventBus,
    catalog: Arc<ScenarioCatalog>,
    settings: EngineSettings,
}

impl FunnelContext {
    /// Create a context publishing on `bus`.
    #[must_use]
    pub fn new(catalog: ScenarioCatalog, bus: EventBus, settings: EngineSettings) -> Self {
        Self {
            state: Arc::new(Mutex::new(FunnelState::new())),
            bus,
            catalog: Arc::new(catalog),
            settings,
        }
    }

    /// Create a context from a loaded config with a fresh event bus.
    #[must_use]
    pub fn from_config(config: &Config, catalog: ScenarioCatalog) -> Self {
        Self::new(catalog, EventBus::new(), EngineSettings::from_config(config))
    }

    /// Current metrics snapshot.
    pub async fn metrics(&self) -> Metrics {
        self.state.lock().await.metrics.snapshot()
    }

    /// Copy of one lead's record.
    pub async fn lead(&self, id: &LeadId) -> Option<Lead> {
        self.state.lock().await.store.get(id).cloned()
    }

    /// Number of leads in the store.
    pub async fn lead_count(&self) -> usize {
        self.state.lock().await.store.len()
    }

    /// Number of completed resets.
    pub async fn generation(&self) -> u64 {
        self.state.lock().await.generation
    }

    /// The event bus every step publishes on.
    #[must_use]
    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// The scenario catalog.
    #[must_use]
    pub fn catalog(&self) -> &ScenarioCatalog {
        &self.catalog
    }

    /// Engine settings.
    #[must_use]
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub(crate) async fn lock(&self) -> MutexGuard<'_, FunnelState> {
        self.state.lock().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use growthos_core::Mode;

    fn context() -> FunnelContext {
        FunnelContext::new(
            ScenarioCatalog::builtin().unwrap(),
            EventBus::new(),
            EngineSettings::default(),
        )
    }

    #[test]
    fn test_settings_from_config() {
        let mut config = Config::default();
        config.revenue.booking_value = 3000;
        config.simulation.max_step_delay_ms = 500;

        let settings = EngineSettings::from_config(&config);
        assert_eq!(settings.revenue.booking_value, 3000);
        assert_eq!(settings.delays.max_step_delay.as_millis(), 500);
    }

    #[tokio::test]
    async fn test_fresh_context_is_empty() {
        let ctx = context();
        assert_eq!(ctx.metrics().await, Metrics::default());
        assert_eq!(ctx.lead_count().await, 0);
        assert_eq!(ctx.generation().await, 0);
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let ctx = context();
        let other = ctx.clone();
        {
            let mut state = ctx.lock().await;
            state.store.insert(Lead::new(
                LeadId::from("aaaa0001"),
                "Emily T.",
                "(555) 000-0000",
                Mode::Legacy,
                Utc::now(),
            ));
        }
        assert!(other.lead(&LeadId::from("aaaa0001")).await.is_some());
    }

    #[tokio::test]
    async fn test_ticket_invalidated_by_generation_and_token() {
        let ctx = context();
        let mut state = ctx.lock().await;
        let id = LeadId::from("aaaa0001");
        state.store.insert(Lead::new(id.clone(), "A B.", "p", Mode::Automated, Utc::now()));

        let ticket = state.ticket(id.clone());
        assert!(state.is_current(&ticket));

        state.cancel.cancel();
        assert!(!state.is_current(&ticket));

        let ticket = RunTicket {
            lead_id: id.clone(),
            generation: 7,
            token: CancellationToken::new(),
        };
        assert!(!state.is_current(&ticket));

        state.store.clear();
        let ticket = state.ticket(id);
        assert!(!state.is_current(&ticket));
    }
}
