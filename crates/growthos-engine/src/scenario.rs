//! Scenario runs.
//!
//! A run plays one script for one lead. Steps are strictly sequential: the
//! run sleeps, takes the state lock, checks its ticket, then applies the
//! step's side effects and publishes while still holding the lock. Events
//! for one lead therefore arrive in script order and every metrics snapshot
//! they carry already reflects the transition they announce.

use std::time::Duration;

use chrono::Utc;
use growthos_config::RevenueSection;
use growthos_core::{CheckinRecord, LeadId, MessageRecord, MetricsDelta, Stage};
use growthos_events::{EventBus, FunnelEvent};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::catalog::{ConversationStep, Outcome, RetentionStep};
use crate::context::{FunnelContext, FunnelState, RunTicket};

/// How a scenario run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every step was applied.
    Completed {
        /// Steps applied.
        steps: usize,
    },
    /// A reset invalidated the run or its lead vanished.
    Cancelled {
        /// Steps applied before the run stopped.
        after_steps: usize,
    },
}

impl RunOutcome {
    /// Whether the run played to the end.
    #[must_use]
    pub fn is_completed(self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

/// Sleep for `delay` unless `token` fires first. Returns `false` on cancel.
async fn wait(delay: Duration, token: &CancellationToken) -> bool {
    tokio::select! {
        () = tokio::time::sleep(delay) => true,
        () = token.cancelled() => false,
    }
}

/// Play the conversation script for the ticket's lead.
pub(crate) async fn run_conversation(ctx: FunnelContext, ticket: RunTicket) -> RunOutcome {
    let mode = {
        let state = ctx.lock().await;
        match state.store.get(&ticket.lead_id) {
            Some(lead) if state.is_current(&ticket) => lead.mode,
            _ => return RunOutcome::Cancelled { after_steps: 0 },
        }
    };
    let Some(script) = ctx.catalog().conversation(mode) else {
        return RunOutcome::Completed { steps: 0 };
    };

    let delays = ctx.settings().delays;
    let revenue = ctx.settings().revenue;
    let mut scripted_elapsed: u64 = 0;

    for (index, step) in script.steps.iter().enumerate() {
        scripted_elapsed = scripted_elapsed.saturating_add(step.delay_secs);

        if !wait(delays.conversation_delay(step.delay_secs, script.compress), &ticket.token).await {
            debug!(lead_id = %ticket.lead_id, step = index, "Conversation cancelled during delay");
            return RunOutcome::Cancelled { after_steps: index };
        }

        let mut state = ctx.lock().await;
        if !state.is_current(&ticket) {
            debug!(lead_id = %ticket.lead_id, step = index, "Conversation stale, stopping");
            return RunOutcome::Cancelled { after_steps: index };
        }
        apply_conversation_step(
            &mut state,
            ctx.bus(),
            &revenue,
            &ticket.lead_id,
            step,
            scripted_elapsed,
        );
    }

    debug!(lead_id = %ticket.lead_id, %mode, "Conversation finished");
    RunOutcome::Completed {
        steps: script.steps.len(),
    }
}

#[allow(clippy::cast_precision_loss)]
fn apply_conversation_step(
    state: &mut FunnelState,
    bus: &EventBus,
    revenue: &RevenueSection,
    lead_id: &LeadId,
    step: &ConversationStep,
    scripted_elapsed: u64,
) {
    let FunnelState { store, metrics, .. } = state;
    let Some(lead) = store.get_mut(lead_id) else {
        return;
    };
    let now = Utc::now();

    lead.messages.push(MessageRecord {
        sender: step.sender,
        text: step.text.clone(),
        timestamp: now,
    });
    if step.sender.is_business() && lead.stamp_first_response(now) {
        metrics.apply(&MetricsDelta::first_response(
            lead.mode,
            scripted_elapsed as f64,
        ));
    }
    debug!(lead_id = %lead_id, sender = %step.sender, "Conversation step");
    bus.publish(FunnelEvent::Message {
        patient_id: lead_id.clone(),
        sender: step.sender,
        text: step.text.clone(),
        timestamp: now,
    });

    let (stage, delta) = match step.outcome {
        Outcome::Book => (Stage::Booked, MetricsDelta::booked(revenue.booking_value)),
        Outcome::Lose => (Stage::Lost, MetricsDelta::lost(revenue.expected_value)),
        Outcome::None | Outcome::Retain | Outcome::Upsell => return,
    };
    if let Err(e) = lead.advance_to(stage) {
        warn!(lead_id = %lead_id, error = %e, "Scripted transition rejected");
        return;
    }
    match stage {
        Stage::Booked => {
            lead.stamp_booked(now);
            lead.revenue = revenue.booking_value;
        },
        _ => lead.revenue = 0,
    }
    metrics.apply(&delta);

    info!(lead_id = %lead_id, %stage, "Lead stage changed");
    bus.publish(FunnelEvent::StageChange {
        patient_id: lead_id.clone(),
        stage,
        metrics: metrics.snapshot(),
    });
}

/// Play the retention script for the ticket's lead.
pub(crate) async fn run_retention(ctx: FunnelContext, ticket: RunTicket) -> RunOutcome {
    let outcome = retention_steps(&ctx, &ticket).await;

    let mut state = ctx.lock().await;
    if state.generation == ticket.generation {
        state.retention_active.remove(&ticket.lead_id);
    }
    outcome
}

async fn retention_steps(ctx: &FunnelContext, ticket: &RunTicket) -> RunOutcome {
    let script = ctx.catalog().retention();
    let delay = ctx.settings().delays.retention_delay();
    let revenue = ctx.settings().revenue;

    for (index, step) in script.steps.iter().enumerate() {
        if !wait(delay, &ticket.token).await {
            debug!(lead_id = %ticket.lead_id, step = index, "Retention cancelled during delay");
            return RunOutcome::Cancelled { after_steps: index };
        }

        let mut state = ctx.lock().await;
        if !state.is_current(ticket) {
            debug!(lead_id = %ticket.lead_id, step = index, "Retention stale, stopping");
            return RunOutcome::Cancelled { after_steps: index };
        }
        apply_retention_step(&mut state, ctx.bus(), &revenue, &ticket.lead_id, step);
    }

    debug!(lead_id = %ticket.lead_id, "Retention finished");
    RunOutcome::Completed {
        steps: script.steps.len(),
    }
}

fn apply_retention_step(
    state: &mut FunnelState,
    bus: &EventBus,
    revenue: &RevenueSection,
    lead_id: &LeadId,
    step: &RetentionStep,
) {
    let FunnelState { store, metrics, .. } = state;
    let Some(lead) = store.get_mut(lead_id) else {
        return;
    };

    let record = CheckinRecord {
        day: step.day,
        text: step.text.clone(),
        patient_id: lead_id.clone(),
    };
    lead.checkins.push(record.clone());
    debug!(lead_id = %lead_id, day = step.day, "Retention check-in");

    let transition = match step.outcome {
        Outcome::Retain => Some((Stage::Retained, MetricsDelta::retained())),
        Outcome::Upsell => Some((Stage::Upsold, MetricsDelta::upsold(revenue.upsell_value))),
        Outcome::None | Outcome::Book | Outcome::Lose => None,
    };
    if let Some((stage, delta)) = transition {
        match lead.advance_to(stage) {
            Ok(()) => {
                if stage == Stage::Upsold {
                    lead.revenue = lead.revenue.saturating_add(revenue.upsell_value);
                }
                metrics.apply(&delta);

                info!(lead_id = %lead_id, %stage, "Lead stage changed");
                bus.publish(FunnelEvent::StageChange {
                    patient_id: lead_id.clone(),
                    stage,
                    metrics: metrics.snapshot(),
                });
            },
            Err(e) => warn!(lead_id = %lead_id, error = %e, "Scripted transition rejected"),
        }
    }

    bus.publish(FunnelEvent::Checkin {
        data: record,
        metrics: metrics.snapshot(),
    });
}
