//! Event bus for broadcasting funnel events.

use std::sync::Arc;

use growthos_core::LeadId;
use tokio::sync::broadcast;
use tracing::{trace, warn};

use crate::event::FunnelEvent;
use crate::registry::{BroadcastReport, SessionRegistry};

/// Default channel capacity for async taps.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// Event bus delivering every published event to all observers.
///
/// Registered observers (see [`SessionRegistry`]) get each event first; async
/// taps created with [`EventBus::subscribe`] receive it through a broadcast
/// channel afterwards. Publishing never blocks and never fails.
///
/// Clones share the same registry and channel.
#[derive(Debug)]
pub struct EventBus {
    sender: broadcast::Sender<Arc<FunnelEvent>>,
    registry: Arc<SessionRegistry>,
    capacity: usize,
}

impl EventBus {
    /// Create a new event bus with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a new event bus with specified tap capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            registry: Arc::new(SessionRegistry::new()),
            capacity,
        }
    }

    /// Publish an event to every observer and tap.
    pub fn publish(&self, event: FunnelEvent) -> BroadcastReport {
        let event = Arc::new(event);

        trace!(event_type = event.event_type(), "Publishing event");

        let mut report = self.registry.broadcast(&event);

        // No taps is fine.
        report.taps = self.sender.send(event).unwrap_or(0);

        trace!(
            delivered = report.delivered,
            removed = report.removed,
            evicted = report.evicted,
            taps = report.taps,
            "Event published"
        );
        report
    }

    /// Subscribe an async tap to every event.
    #[must_use]
    pub fn subscribe(&self) -> EventReceiver {
        EventReceiver::new(self.sender.subscribe(), None)
    }

    /// Subscribe an async tap to the events of one lead.
    ///
    /// Reset events are always passed through since they end every lead.
    #[must_use]
    pub fn subscribe_lead(&self, lead_id: LeadId) -> EventReceiver {
        EventReceiver::new(self.sender.subscribe(), Some(lead_id))
    }

    /// The registry of connected observers.
    #[must_use]
    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// Number of registered observers plus async taps.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender
            .receiver_count()
            .saturating_add(self.registry.len())
    }

    /// Tap channel capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for EventBus {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            registry: Arc::clone(&self.registry),
            capacity: self.capacity,
        }
    }
}

/// Async tap on the event bus.
pub struct EventReceiver {
    receiver: broadcast::Receiver<Arc<FunnelEvent>>,
    /// If set, only events about this lead (and resets) are yielded.
    lead_filter: Option<LeadId>,
}

impl EventReceiver {
    pub(crate) fn new(
        receiver: broadcast::Receiver<Arc<FunnelEvent>>,
        lead_filter: Option<LeadId>,
    ) -> Self {
        Self {
            receiver,
            lead_filter,
        }
    }

    fn matches(&self, event: &FunnelEvent) -> bool {
        let Some(filter) = &self.lead_filter else {
            return true;
        };
        event.lead_id().is_none_or(|id| id == filter)
    }

    /// Receive the next event.
    ///
    /// Returns `None` once the bus is gone. Events missed because the tap
    /// lagged are logged and skipped.
    pub async fn recv(&mut self) -> Option<Arc<FunnelEvent>> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => {
                    if self.matches(&event) {
                        return Some(event);
                    }
                },
                Err(broadcast::error::RecvError::Lagged(count)) => {
                    warn!(skipped = count, "Event receiver lagged, events dropped");
                },
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Receive the next event without waiting.
    pub fn try_recv(&mut self) -> Option<Arc<FunnelEvent>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.matches(&event) {
                        return Some(event);
                    }
                },
                Err(broadcast::error::TryRecvError::Lagged(count)) => {
                    warn!(skipped = count, "Event receiver lagged, events dropped");
                },
                Err(
                    broadcast::error::TryRecvError::Empty | broadcast::error::TryRecvError::Closed,
                ) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::ChannelObserver;
    use chrono::Utc;
    use growthos_core::{Metrics, Sender, Stage};

    fn reset() -> FunnelEvent {
        FunnelEvent::Reset {
            metrics: Metrics::default(),
        }
    }

    fn message(id: &str) -> FunnelEvent {
        FunnelEvent::Message {
            patient_id: LeadId::from(id),
            sender: Sender::Patient,
            text: "hello".into(),
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_event_bus_creation() {
        let bus = EventBus::new();
        assert_eq!(bus.capacity(), DEFAULT_CHANNEL_CAPACITY);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_publish_and_receive() {
        let bus = EventBus::new();
        let mut receiver = bus.subscribe();

        let report = bus.publish(reset());
        assert_eq!(report.taps, 1);

        let event = receiver.recv().await.unwrap();
        assert_eq!(event.event_type(), "reset");
    }

    #[tokio::test]
    async fn test_no_subscribers() {
        let bus = EventBus::new();
        let report = bus.publish(reset());
        assert_eq!(report, BroadcastReport::default());
    }

    #[tokio::test]
    async fn test_publish_reaches_registered_observers() {
        let bus = EventBus::new();
        let (observer, mut rx) = ChannelObserver::new("conn", 8);
        bus.registry().register(Arc::new(observer));

        let report = bus.publish(message("aaaa0001"));
        assert_eq!(report.delivered, 1);
        assert_eq!(rx.recv().await.unwrap().event_type(), "message");
    }

    #[tokio::test]
    async fn test_closed_observer_removed_on_publish() {
        let bus = EventBus::new();
        let (alive, mut alive_rx) = ChannelObserver::new("alive", 8);
        let (gone, gone_rx) = ChannelObserver::new("gone", 8);
        bus.registry().register(Arc::new(alive));
        bus.registry().register(Arc::new(gone));
        drop(gone_rx);

        let report = bus.publish(reset());
        assert_eq!(report.delivered, 1);
        assert_eq!(report.removed, 1);
        assert_eq!(bus.registry().len(), 1);
        assert!(alive_rx.recv().await.is_some());
    }

    #[tokio::test]
    async fn test_cloned_bus_shares_registry() {
        let bus = EventBus::new();
        let cloned = bus.clone();
        let (observer, mut rx) = ChannelObserver::new("conn", 8);
        cloned.registry().register(Arc::new(observer));

        bus.publish(reset());
        assert!(rx.try_recv().is_ok());
    }

    #[tokio::test]
    async fn test_lead_subscription_filters() {
        let bus = EventBus::new();
        let mut all = bus.subscribe();
        let mut one = bus.subscribe_lead(LeadId::from("aaaa0001"));

        bus.publish(message("aaaa0001"));
        bus.publish(message("bbbb0002"));
        bus.publish(FunnelEvent::StageChange {
            patient_id: LeadId::from("aaaa0001"),
            stage: Stage::Booked,
            metrics: Metrics::default(),
        });
        bus.publish(reset());

        let mut seen = Vec::new();
        while let Some(event) = one.try_recv() {
            seen.push(event.event_type());
        }
        assert_eq!(seen, vec!["message", "stage_change", "reset"]);

        let mut total = 0;
        while all.try_recv().is_some() {
            total += 1;
        }
        assert_eq!(total, 4);
    }
}
