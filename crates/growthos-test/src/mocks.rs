//! Observer doubles.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use growthos_events::{DeliveryError, EventBus, FunnelEvent, Observer, ObserverId};

/// Observer that keeps every event it is handed.
///
/// Uses `std::sync::Mutex` since delivery is synchronous.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<Arc<FunnelEvent>>>,
}

impl RecordingObserver {
    /// Create a detached recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a recorder and register it with `bus`.
    #[must_use]
    pub fn attach(bus: &EventBus) -> Arc<Self> {
        Self::attach_with_id(bus).0
    }

    /// Like [`RecordingObserver::attach`], also returning the registry id.
    #[must_use]
    pub fn attach_with_id(bus: &EventBus) -> (Arc<Self>, ObserverId) {
        let recorder = Arc::new(Self::new());
        let id = bus
            .registry()
            .register(Arc::clone(&recorder) as Arc<dyn Observer>);
        (recorder, id)
    }

    /// Events received so far, in delivery order.
    #[must_use]
    pub fn events(&self) -> Vec<Arc<FunnelEvent>> {
        self.events.lock().map(|g| g.clone()).unwrap_or_default()
    }

    /// Wire `type` of each event received so far.
    #[must_use]
    pub fn event_types(&self) -> Vec<&'static str> {
        self.events().iter().map(|e| e.event_type()).collect()
    }

    /// Number of events received.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.lock().map(|g| g.len()).unwrap_or(0)
    }

    /// Whether nothing was received.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forget everything received so far.
    pub fn clear(&self) {
        if let Ok(mut guard) = self.events.lock() {
            guard.clear();
        }
    }
}

impl Observer for RecordingObserver {
    fn name(&self) -> &str {
        "recording"
    }

    fn deliver(&self, event: &Arc<FunnelEvent>) -> Result<(), DeliveryError> {
        if let Ok(mut guard) = self.events.lock() {
            guard.push(Arc::clone(event));
        }
        Ok(())
    }
}

/// Observer whose every delivery fails.
#[derive(Debug)]
pub struct FailingObserver {
    error: DeliveryError,
    attempts: AtomicUsize,
}

impl FailingObserver {
    /// Behaves like a severed connection.
    #[must_use]
    pub fn closed() -> Self {
        Self {
            error: DeliveryError::Closed,
            attempts: AtomicUsize::new(0),
        }
    }

    /// Behaves like a connection whose queue never drains.
    #[must_use]
    pub fn full() -> Self {
        Self {
            error: DeliveryError::Full,
            attempts: AtomicUsize::new(0),
        }
    }

    /// Number of deliveries attempted.
    #[must_use]
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl Observer for FailingObserver {
    fn name(&self) -> &str {
        "failing"
    }

    fn deliver(&self, _event: &Arc<FunnelEvent>) -> Result<(), DeliveryError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(self.error)
    }
}
