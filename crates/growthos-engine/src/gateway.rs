//! Command gateway: turns observer commands into engine actions.

use chrono::Utc;
use growthos_core::{LeadId, MetricsDelta, Mode, Stage};
use growthos_events::FunnelEvent;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info, info_span};

use crate::command::{Command, CommandError};
use crate::context::FunnelContext;
use crate::generator::generate_lead;
use crate::scenario::{RunOutcome, run_conversation, run_retention};

/// Why a command was accepted without effect.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IgnoreReason {
    /// The frame was not a usable command.
    #[error(transparent)]
    Invalid(#[from] CommandError),
    /// The catalog has no conversation for this mode.
    #[error("no conversation script for mode '{0}'")]
    ModeUnavailable(Mode),
    /// No lead with this id exists.
    #[error("unknown lead {0}")]
    UnknownLead(LeadId),
    /// Retention only starts from the booked stage.
    #[error("lead {lead_id} is {stage}, retention needs booked")]
    NotBooked {
        /// Target lead.
        lead_id: LeadId,
        /// Its current stage.
        stage: Stage,
    },
    /// A retention run for this lead is already in flight.
    #[error("retention already running for lead {0}")]
    RetentionInFlight(LeadId),
}

/// Result of dispatching one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// State was cleared.
    Reset,
    /// A lead was created and its conversation started.
    LeadStarted(LeadId),
    /// A retention run started.
    RetentionStarted(LeadId),
    /// Nothing happened.
    Ignored(IgnoreReason),
}

/// A spawned scenario run.
#[derive(Debug)]
pub struct RunHandle {
    /// Lead the run drives.
    pub lead_id: LeadId,
    /// Resolves when the run completes or is cancelled.
    pub join: JoinHandle<RunOutcome>,
}

/// Entry point for observer commands.
///
/// Every operation is infallible from the caller's point of view: rejected
/// requests come back as [`IgnoreReason`] and are never reported to the
/// observer.
#[derive(Debug, Clone)]
pub struct CommandGateway {
    ctx: FunnelContext,
}

impl CommandGateway {
    /// Wrap a context.
    #[must_use]
    pub fn new(ctx: FunnelContext) -> Self {
        Self { ctx }
    }

    /// The shared context.
    #[must_use]
    pub fn context(&self) -> &FunnelContext {
        &self.ctx
    }

    /// Parse and dispatch one text frame.
    pub async fn handle_text(&self, text: &str) -> CommandOutcome {
        match Command::parse(text) {
            Ok(command) => self.dispatch(command).await,
            Err(e) => {
                debug!(error = %e, "Ignoring frame");
                CommandOutcome::Ignored(e.into())
            },
        }
    }

    /// Dispatch a parsed command. Spawned runs are detached.
    pub async fn dispatch(&self, command: Command) -> CommandOutcome {
        let outcome = match command {
            Command::Reset => {
                self.reset().await;
                CommandOutcome::Reset
            },
            Command::SimulateLead { mode } => match self.start_lead(mode).await {
                Ok(run) => CommandOutcome::LeadStarted(run.lead_id),
                Err(reason) => CommandOutcome::Ignored(reason),
            },
            Command::SimulateRetention { patient_id } => {
                match self.start_retention(&patient_id).await {
                    Ok(run) => CommandOutcome::RetentionStarted(run.lead_id),
                    Err(reason) => CommandOutcome::Ignored(reason),
                }
            },
        };

        if let CommandOutcome::Ignored(reason) = &outcome {
            debug!(%reason, "Command ignored");
        }
        outcome
    }

    /// Clear every lead and counter, invalidate in-flight runs, and
    /// broadcast the reset.
    pub async fn reset(&self) {
        let mut state = self.ctx.lock().await;

        state.cancel.cancel();
        state.cancel = CancellationToken::new();
        state.generation = state.generation.saturating_add(1);
        state.store.clear();
        state.metrics.reset();
        state.retention_active.clear();

        info!(generation = state.generation, "Funnel reset");
        self.ctx.bus().publish(FunnelEvent::Reset {
            metrics: state.metrics.snapshot(),
        });
    }

    /// Create a lead for `mode`, broadcast it, and start its conversation.
    ///
    /// # Errors
    ///
    /// Returns [`IgnoreReason::ModeUnavailable`] if the catalog has no
    /// script for `mode`.
    pub async fn start_lead(&self, mode: Mode) -> Result<RunHandle, IgnoreReason> {
        if self.ctx.catalog().conversation(mode).is_none() {
            return Err(IgnoreReason::ModeUnavailable(mode));
        }

        let ticket = {
            let mut state = self.ctx.lock().await;

            let mut lead = generate_lead(mode, Utc::now());
            while state.store.contains(&lead.id) {
                lead.id = LeadId::generate();
            }
            let lead_id = lead.id.clone();

            state.store.insert(lead.clone());
            state.metrics.apply(&MetricsDelta::new_lead());

            info!(lead_id = %lead_id, %mode, name = %lead.name, "Lead created");
            self.ctx.bus().publish(FunnelEvent::NewLead {
                patient: Box::new(lead),
                metrics: state.metrics.snapshot(),
            });
            state.ticket(lead_id)
        };

        let lead_id = ticket.lead_id.clone();
        let span = info_span!("conversation", lead_id = %lead_id, %mode);
        let join = tokio::spawn(run_conversation(self.ctx.clone(), ticket).instrument(span));
        Ok(RunHandle { lead_id, join })
    }

    /// Start the retention check-ins for a booked lead.
    ///
    /// # Errors
    ///
    /// Returns an [`IgnoreReason`] if the lead is unknown, not booked, or
    /// already has a retention run in flight.
    pub async fn start_retention(&self, lead_id: &LeadId) -> Result<RunHandle, IgnoreReason> {
        let ticket = {
            let mut state = self.ctx.lock().await;

            let Some(lead) = state.store.get(lead_id) else {
                return Err(IgnoreReason::UnknownLead(lead_id.clone()));
            };
            if lead.stage != Stage::Booked {
                return Err(IgnoreReason::NotBooked {
                    lead_id: lead_id.clone(),
                    stage: lead.stage,
                });
            }
            if !state.retention_active.insert(lead_id.clone()) {
                return Err(IgnoreReason::RetentionInFlight(lead_id.clone()));
            }

            info!(lead_id = %lead_id, "Retention started");
            state.ticket(lead_id.clone())
        };

        let span = info_span!("retention", lead_id = %lead_id);
        let join = tokio::spawn(run_retention(self.ctx.clone(), ticket).instrument(span));
        Ok(RunHandle {
            lead_id: lead_id.clone(),
            join,
        })
    }
}
