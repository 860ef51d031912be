//! Delivery to observers while scenarios run.

use std::sync::Arc;

use growthos_core::{Mode, Stage};
use growthos_events::{ChannelObserver, Observer};
use growthos_test::{FailingObserver, RecordingObserver, test_gateway};

#[tokio::test(start_paused = true)]
async fn test_severed_observer_removed_others_served() {
    let gateway = test_gateway();
    let bus = gateway.context().bus();
    let healthy = RecordingObserver::attach(bus);
    let severed = Arc::new(FailingObserver::closed());
    let severed_id = bus
        .registry()
        .register(Arc::clone(&severed) as Arc<dyn Observer>);

    let run = gateway.start_lead(Mode::Automated).await.unwrap();
    run.join.await.unwrap();

    assert_eq!(severed.attempts(), 1);
    assert!(!bus.registry().contains(severed_id));
    assert_eq!(bus.registry().len(), 1);
    assert_eq!(healthy.len(), 9);
}

#[tokio::test(start_paused = true)]
async fn test_full_observer_evicted_after_first_refusal() {
    let gateway = test_gateway();
    let bus = gateway.context().bus();
    let healthy = RecordingObserver::attach(bus);
    let stalled = Arc::new(FailingObserver::full());
    let stalled_id = bus
        .registry()
        .register(Arc::clone(&stalled) as Arc<dyn Observer>);

    let run = gateway.start_lead(Mode::Legacy).await.unwrap();
    run.join.await.unwrap();

    assert!(!bus.registry().contains(stalled_id));
    assert_eq!(stalled.attempts(), 1);
    // new_lead, five messages, stage_change
    assert_eq!(healthy.len(), 7);
}

#[tokio::test(start_paused = true)]
async fn test_slow_observer_disconnected_instead_of_missing_booking() {
    let gateway = test_gateway();
    let bus = gateway.context().bus();
    let (slow, mut queue) = ChannelObserver::new("slow", 2);
    let slow_id = bus.registry().register(Arc::new(slow));

    let run = gateway.start_lead(Mode::Automated).await.unwrap();
    let lead_id = run.lead_id.clone();
    run.join.await.unwrap();

    assert!(!bus.registry().contains(slow_id));
    assert_eq!(
        gateway.context().lead(&lead_id).await.unwrap().stage,
        Stage::Booked
    );

    // The queued events drain, then the queue reports the disconnect.
    let mut seen = Vec::new();
    while let Some(event) = queue.recv().await {
        seen.push(event.event_type());
    }
    assert_eq!(seen, vec!["new_lead", "message"]);
}

#[tokio::test(start_paused = true)]
async fn test_observer_joining_mid_run_sees_later_events() {
    let gateway = test_gateway();
    let run = gateway.start_lead(Mode::Automated).await.unwrap();

    let late = RecordingObserver::attach(gateway.context().bus());
    run.join.await.unwrap();

    let types = late.event_types();
    assert!(!types.contains(&"new_lead"));
    assert_eq!(types.last(), Some(&"stage_change"));
}

#[tokio::test(start_paused = true)]
async fn test_unregistered_observer_stops_receiving() {
    let gateway = test_gateway();
    let bus = gateway.context().bus();
    let (recorder, id) = RecordingObserver::attach_with_id(bus);

    gateway.reset().await;
    assert!(bus.registry().unregister(id));
    gateway.start_lead(Mode::Automated).await.unwrap();

    assert_eq!(recorder.event_types(), vec!["reset"]);
}
