//! Observer trait and the channel-backed observer used by connections.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;

use crate::event::FunnelEvent;

/// Why an event could not be handed to an observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DeliveryError {
    /// The observer is gone and should be unregistered.
    #[error("observer closed")]
    Closed,

    /// The observer is not keeping up with the stream. It is unregistered so
    /// that its connection closes rather than silently missing events.
    #[error("observer queue full")]
    Full,
}

/// A live consumer of broadcast events.
///
/// `deliver` is called with the registry's snapshot, never under a lock, and
/// must not block: hand the event off and return.
pub trait Observer: Send + Sync {
    /// Short label for logs.
    fn name(&self) -> &str;

    /// Hand one event to the observer.
    ///
    /// # Errors
    ///
    /// Either error removes the observer from the registry. No later event
    /// is offered to it.
    fn deliver(&self, event: &Arc<FunnelEvent>) -> Result<(), DeliveryError>;
}

/// Observer that forwards events into a bounded channel.
///
/// The receiving half is drained by a connection's writer task. Dropping the
/// receiver makes the next delivery report [`DeliveryError::Closed`]. Once the
/// registry lets go of the observer the sender is dropped, so the receiver
/// yields what is already queued and then `None`.
#[derive(Debug)]
pub struct ChannelObserver {
    name: String,
    tx: mpsc::Sender<Arc<FunnelEvent>>,
}

impl ChannelObserver {
    /// Create an observer with a queue of `capacity` events.
    ///
    /// A zero capacity is bumped to one.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        capacity: usize,
    ) -> (Self, mpsc::Receiver<Arc<FunnelEvent>>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (
            Self {
                name: name.into(),
                tx,
            },
            rx,
        )
    }
}

impl Observer for ChannelObserver {
    fn name(&self) -> &str {
        &self.name
    }

    fn deliver(&self, event: &Arc<FunnelEvent>) -> Result<(), DeliveryError> {
        self.tx.try_send(Arc::clone(event)).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => DeliveryError::Full,
            mpsc::error::TrySendError::Closed(_) => DeliveryError::Closed,
        })
    }
}
