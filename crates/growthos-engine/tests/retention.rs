//! Retention runs and the retention acceptance policy.

use growthos_core::{LeadId, Mode, Stage};
use growthos_engine::{CommandGateway, CommandOutcome, IgnoreReason, RunOutcome};
use growthos_events::FunnelEvent;
use growthos_test::{RecordingObserver, test_gateway};

async fn booked_lead(gateway: &CommandGateway) -> LeadId {
    let run = gateway.start_lead(Mode::Automated).await.unwrap();
    run.join.await.unwrap();
    run.lead_id
}

#[tokio::test(start_paused = true)]
async fn test_retention_retains_then_upsells() {
    let gateway = test_gateway();
    let lead_id = booked_lead(&gateway).await;
    let recorder = RecordingObserver::attach(gateway.context().bus());

    let run = gateway.start_retention(&lead_id).await.unwrap();
    assert_eq!(run.join.await.unwrap(), RunOutcome::Completed { steps: 5 });

    assert_eq!(
        recorder.event_types(),
        vec![
            "checkin",
            "checkin",
            "checkin",
            "stage_change",
            "checkin",
            "stage_change",
            "checkin",
        ]
    );

    let stages: Vec<Stage> = recorder
        .events()
        .iter()
        .filter_map(|e| match e.as_ref() {
            FunnelEvent::StageChange { stage, .. } => Some(*stage),
            _ => None,
        })
        .collect();
    assert_eq!(stages, vec![Stage::Retained, Stage::Upsold]);

    let days: Vec<u32> = recorder
        .events()
        .iter()
        .filter_map(|e| match e.as_ref() {
            FunnelEvent::Checkin { data, .. } => Some(data.day),
            _ => None,
        })
        .collect();
    assert_eq!(days, vec![7, 14, 21, 28, 35]);

    let lead = gateway.context().lead(&lead_id).await.unwrap();
    assert_eq!(lead.stage, Stage::Upsold);
    assert_eq!(lead.revenue, 2800 + 1500);
    assert_eq!(lead.checkins.len(), 5);
    assert!(lead.checkins.iter().all(|c| c.patient_id == lead_id));

    let metrics = gateway.context().metrics().await;
    assert_eq!(metrics.retained, 1);
    assert_eq!(metrics.upsold, 1);
    assert_eq!(metrics.revenue_captured, 2800 + 1500);
    assert!(metrics.is_consistent());
}

#[tokio::test(start_paused = true)]
async fn test_checkin_snapshot_reflects_preceding_stage_change() {
    let gateway = test_gateway();
    let lead_id = booked_lead(&gateway).await;
    let recorder = RecordingObserver::attach(gateway.context().bus());

    gateway
        .start_retention(&lead_id)
        .await
        .unwrap()
        .join
        .await
        .unwrap();

    let events = recorder.events();
    let FunnelEvent::Checkin { data, metrics } = events.last().unwrap().as_ref() else {
        panic!("last event should be a check-in");
    };
    assert_eq!(data.day, 35);
    assert_eq!(metrics.upsold, 1);
}

#[tokio::test(start_paused = true)]
async fn test_retention_requires_booked_stage() {
    let gateway = test_gateway();

    // Still in conversation.
    let pending = gateway.start_lead(Mode::Automated).await.unwrap();
    let err = gateway.start_retention(&pending.lead_id).await.unwrap_err();
    assert_eq!(
        err,
        IgnoreReason::NotBooked {
            lead_id: pending.lead_id.clone(),
            stage: Stage::Lead,
        }
    );
    pending.join.await.unwrap();

    // Lost.
    let lost = gateway.start_lead(Mode::Legacy).await.unwrap();
    lost.join.await.unwrap();
    assert!(matches!(
        gateway.start_retention(&lost.lead_id).await,
        Err(IgnoreReason::NotBooked {
            stage: Stage::Lost,
            ..
        })
    ));

    assert_eq!(gateway.context().metrics().await.retained, 0);
}

#[tokio::test(start_paused = true)]
async fn test_retention_rejected_while_in_flight() {
    let gateway = test_gateway();
    let lead_id = booked_lead(&gateway).await;

    let first = gateway.start_retention(&lead_id).await.unwrap();
    assert_eq!(
        gateway.start_retention(&lead_id).await.unwrap_err(),
        IgnoreReason::RetentionInFlight(lead_id.clone())
    );
    first.join.await.unwrap();

    // Upsold now, so a rerun is rejected on stage and check-ins are not
    // duplicated.
    let outcome = gateway
        .handle_text(&format!(
            r#"{{"action":"simulate_retention","patient_id":"{lead_id}"}}"#
        ))
        .await;
    assert!(matches!(
        outcome,
        CommandOutcome::Ignored(IgnoreReason::NotBooked {
            stage: Stage::Upsold,
            ..
        })
    ));
    let lead = gateway.context().lead(&lead_id).await.unwrap();
    assert_eq!(lead.checkins.len(), 5);
}

#[tokio::test(start_paused = true)]
async fn test_retention_for_unknown_lead_emits_nothing() {
    let gateway = test_gateway();
    let recorder = RecordingObserver::attach(gateway.context().bus());

    let outcome = gateway
        .handle_text(r#"{"action":"simulate_retention","patient_id":"00000000"}"#)
        .await;
    assert_eq!(
        outcome,
        CommandOutcome::Ignored(IgnoreReason::UnknownLead(LeadId::from("00000000")))
    );
    assert!(recorder.is_empty());
}
