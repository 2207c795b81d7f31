use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{broadcast, mpsc};
use tracing::warn;

use autowait_core_types::EngineError;

/// Default channel depth for buses created without an explicit capacity.
/// Navigation traffic is bursty (a start, a commit, and a couple of
/// lifecycle events per navigation) but never high-volume.
pub const DEFAULT_CAPACITY: usize = 256;

/// Trait implemented by payload types that can be carried on the bus.
pub trait Event: Clone + Send + Sync + std::fmt::Debug + 'static {}

impl<T> Event for T where T: Clone + Send + Sync + std::fmt::Debug + 'static {}

#[async_trait]
pub trait EventBus<E>: Send + Sync
where
    E: Event,
{
    /// Publish one event; returns the number of subscribers it reached.
    /// Publishing with no subscribers is not an error, the event is simply
    /// dropped.
    async fn publish(&self, event: E) -> Result<usize, EngineError>;
    fn subscribe(&self) -> broadcast::Receiver<E>;
}

/// Broadcast-backed in-memory bus. Both the production wiring and the test
/// doubles run on this; there is no networked variant.
pub struct InMemoryBus<E>
where
    E: Event,
{
    sender: broadcast::Sender<E>,
}

impl<E> InMemoryBus<E>
where
    E: Event,
{
    pub fn new(capacity: usize) -> Arc<Self> {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Arc::new(Self { sender })
    }

    pub fn with_default_capacity() -> Arc<Self> {
        Self::new(DEFAULT_CAPACITY)
    }

    /// Synchronous publish for callers already holding a lock; identical
    /// semantics to [`EventBus::publish`].
    pub fn publish_now(&self, event: E) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[async_trait]
impl<E> EventBus<E> for InMemoryBus<E>
where
    E: Event,
{
    async fn publish(&self, event: E) -> Result<usize, EngineError> {
        Ok(self.publish_now(event))
    }

    fn subscribe(&self) -> broadcast::Receiver<E> {
        self.sender.subscribe()
    }
}

/// Materialise an mpsc receiver from a bus subscription so callers can await
/// events without handling broadcast semantics directly. A lagged subscriber
/// keeps receiving from the oldest retained event; the gap is logged.
pub fn to_mpsc<E>(bus: Arc<InMemoryBus<E>>, capacity: usize) -> mpsc::Receiver<E>
where
    E: Event,
{
    let mut rx = bus.subscribe();
    let (tx, out_rx) = mpsc::channel(capacity.max(1));
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(ev) => {
                    if tx.send(ev).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(target: "event_bus", skipped, "bus subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });
    out_rx
}
