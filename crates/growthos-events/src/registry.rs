//! Registry of connected observers.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use tracing::{debug, warn};

use crate::event::FunnelEvent;
use crate::observer::{DeliveryError, Observer};

/// Identifier handed out on registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverId(u64);

impl fmt::Display for ObserverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "observer-{}", self.0)
    }
}

/// Outcome of one broadcast.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Observers that accepted the event.
    pub delivered: usize,
    /// Observers found closed and unregistered.
    pub removed: usize,
    /// Observers unregistered because their queue was full.
    pub evicted: usize,
    /// Async taps that received the event.
    pub taps: usize,
}

/// The set of currently connected observers.
///
/// Registration and removal may happen from any task. Broadcasting takes a
/// snapshot first, so observers are called without holding any map shard and
/// may themselves register or unregister.
pub struct SessionRegistry {
    observers: DashMap<ObserverId, Arc<dyn Observer>>,
    next_id: AtomicU64,
}

impl fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("observers", &self.observers.len())
            .finish_non_exhaustive()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            observers: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Add an observer and return its id.
    pub fn register(&self, observer: Arc<dyn Observer>) -> ObserverId {
        let id = ObserverId(self.next_id.fetch_add(1, Ordering::Relaxed));
        debug!(observer_id = %id, name = observer.name(), "Observer registered");
        self.observers.insert(id, observer);
        id
    }

    /// Remove an observer. Returns `false` if it was not registered.
    pub fn unregister(&self, id: ObserverId) -> bool {
        // Drop the observer after the shard lock is released.
        let removed = self.observers.remove(&id);
        let found = removed.is_some();
        drop(removed);
        if found {
            debug!(observer_id = %id, "Observer unregistered");
        }
        found
    }

    /// Whether `id` is currently registered.
    #[must_use]
    pub fn contains(&self, id: ObserverId) -> bool {
        self.observers.contains_key(&id)
    }

    /// Number of registered observers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.observers.len()
    }

    /// Whether no observers are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    /// Deliver `event` to every registered observer.
    ///
    /// Closed observers and observers that cannot take the event are
    /// unregistered, so every observer still registered afterwards has seen
    /// every event since it registered. Never fails.
    pub fn broadcast(&self, event: &Arc<FunnelEvent>) -> BroadcastReport {
        let snapshot: Vec<(ObserverId, Arc<dyn Observer>)> = self
            .observers
            .iter()
            .map(|entry| (*entry.key(), Arc::clone(entry.value())))
            .collect();

        let mut report = BroadcastReport::default();
        for (id, observer) in snapshot {
            match observer.deliver(event) {
                Ok(()) => report.delivered = report.delivered.saturating_add(1),
                Err(DeliveryError::Full) => {
                    warn!(
                        observer_id = %id,
                        name = observer.name(),
                        event_type = event.event_type(),
                        "Observer queue full, evicting"
                    );
                    drop(observer);
                    if self.unregister(id) {
                        report.evicted = report.evicted.saturating_add(1);
                    }
                },
                Err(DeliveryError::Closed) => {
                    drop(observer);
                    if self.unregister(id) {
                        report.removed = report.removed.saturating_add(1);
                    }
                },
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use growthos_core::Metrics;
    use std::sync::Mutex;
    use std::sync::atomic::AtomicUsize;

    struct Counting(AtomicUsize);

    impl Observer for Counting {
        fn name(&self) -> &str {
            "counting"
        }

        fn deliver(&self, _event: &Arc<FunnelEvent>) -> Result<(), DeliveryError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct Severed;

    impl Observer for Severed {
        fn name(&self) -> &str {
            "severed"
        }

        fn deliver(&self, _event: &Arc<FunnelEvent>) -> Result<(), DeliveryError> {
            Err(DeliveryError::Closed)
        }
    }

    struct Stalled;

    impl Observer for Stalled {
        fn name(&self) -> &str {
            "stalled"
        }

        fn deliver(&self, _event: &Arc<FunnelEvent>) -> Result<(), DeliveryError> {
            Err(DeliveryError::Full)
        }
    }

    fn reset_event() -> Arc<FunnelEvent> {
        Arc::new(FunnelEvent::Reset {
            metrics: Metrics::default(),
        })
    }

    #[test]
    fn test_register_and_unregister() {
        let registry = SessionRegistry::new();
        let id = registry.register(Arc::new(Counting(AtomicUsize::new(0))));
        assert_eq!(registry.len(), 1);
        assert!(registry.contains(id));

        assert!(registry.unregister(id));
        assert!(!registry.unregister(id));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_ids_are_unique() {
        let registry = SessionRegistry::new();
        let a = registry.register(Arc::new(Severed));
        let b = registry.register(Arc::new(Severed));
        assert_ne!(a, b);
    }

    #[test]
    fn test_severed_observer_removed_others_delivered() {
        let registry = SessionRegistry::new();
        let healthy = Arc::new(Counting(AtomicUsize::new(0)));
        let healthy_id = registry.register(Arc::clone(&healthy) as Arc<dyn Observer>);
        let severed_id = registry.register(Arc::new(Severed));

        let report = registry.broadcast(&reset_event());

        assert_eq!(report.delivered, 1);
        assert_eq!(report.removed, 1);
        assert_eq!(healthy.0.load(Ordering::SeqCst), 1);
        assert!(registry.contains(healthy_id));
        assert!(!registry.contains(severed_id));

        // Subsequent broadcasts keep reaching the healthy observer.
        registry.broadcast(&reset_event());
        assert_eq!(healthy.0.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_full_observer_evicted_others_delivered() {
        let registry = SessionRegistry::new();
        let healthy = Arc::new(Counting(AtomicUsize::new(0)));
        let healthy_id = registry.register(Arc::clone(&healthy) as Arc<dyn Observer>);
        let stalled_id = registry.register(Arc::new(Stalled));

        let report = registry.broadcast(&reset_event());

        assert_eq!(report.delivered, 1);
        assert_eq!(report.evicted, 1);
        assert_eq!(report.removed, 0);
        assert!(registry.contains(healthy_id));
        assert!(!registry.contains(stalled_id));
    }

    #[test]
    fn test_observer_can_unregister_itself() {
        struct SelfRemoving {
            registry: Arc<SessionRegistry>,
            id: Mutex<Option<ObserverId>>,
        }

        impl Observer for SelfRemoving {
            fn name(&self) -> &str {
                "self-removing"
            }

            fn deliver(&self, _event: &Arc<FunnelEvent>) -> Result<(), DeliveryError> {
                if let Some(id) = *self.id.lock().unwrap() {
                    // Must not deadlock against the broadcast in progress.
                    self.registry.unregister(id);
                }
                Ok(())
            }
        }

        let registry = Arc::new(SessionRegistry::new());
        let observer = Arc::new(SelfRemoving {
            registry: Arc::clone(&registry),
            id: Mutex::new(None),
        });
        let id = registry.register(Arc::clone(&observer) as Arc<dyn Observer>);
        *observer.id.lock().unwrap() = Some(id);

        let report = registry.broadcast(&reset_event());
        assert_eq!(report.delivered, 1);
        assert!(registry.is_empty());
    }
}
