//! The in-process event bus.
//!
//! # Guarantees
//!
//! - **Non-blocking publish**: the mutation path never waits on subscribers.
//! - **Per-base total order**: one global broadcast channel preserves publish
//!   order, so every subscriber observes a base's events in commit order.
//! - **Slow-subscriber isolation**: a lagging subscriber loses the oldest
//!   events queued for it and the loss is counted; other subscribers and the
//!   publisher are unaffected.
//! - **No persistence**: events published with no live subscriber are gone.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use uuid::Uuid;

use crate::{BaseEvent, TRACING_TARGET};

/// Default per-subscriber queue capacity.
const DEFAULT_CAPACITY: usize = 1024;

/// Broadcast bus distributing [`BaseEvent`]s to all subscribers.
///
/// Cloning is cheap; all clones share the same channel and counters. The
/// process owns exactly one bus, constructed at startup.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<Arc<BaseEvent>>,
    dropped: Arc<AtomicU64>,
    published: Arc<AtomicU64>,
}

impl EventBus {
    /// Creates a new event bus with the default subscriber queue capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Creates a new event bus with the specified subscriber queue capacity.
    ///
    /// The capacity bounds how far a subscriber may fall behind before it
    /// starts losing the oldest queued events.
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            dropped: Arc::new(AtomicU64::new(0)),
            published: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns immediately; the send is synchronous and never waits on any
    /// subscriber. Returns the number of subscribers that will observe the
    /// event (zero when nobody is listening).
    pub fn publish(&self, event: BaseEvent) -> usize {
        self.published.fetch_add(1, Ordering::Relaxed);

        tracing::trace!(
            target: TRACING_TARGET,
            event = %event.event,
            base_id = %event.base_id,
            "publishing event"
        );

        self.sender.send(Arc::new(event)).unwrap_or(0)
    }

    /// Subscribes to events for a single base.
    ///
    /// The returned stream yields only events whose `base_id` matches,
    /// in publish order. Events published before subscription are not
    /// received.
    pub fn subscribe(&self, base_id: Uuid) -> EventStream {
        EventStream {
            receiver: self.sender.subscribe(),
            base_filter: Some(base_id),
            dropped: Arc::clone(&self.dropped),
        }
    }

    /// Subscribes to events for every base (the firehose).
    ///
    /// Used by the webhook dispatcher and the automation engine, which
    /// filter by their own registrations.
    pub fn subscribe_all(&self) -> EventStream {
        EventStream {
            receiver: self.sender.subscribe(),
            base_filter: None,
            dropped: Arc::clone(&self.dropped),
        }
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Returns the total number of events published since startup.
    pub fn published_events(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }

    /// Returns the total number of events dropped due to subscriber lag.
    pub fn dropped_events(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .field("published_events", &self.published_events())
            .field("dropped_events", &self.dropped_events())
            .finish()
    }
}

/// Error returned by [`EventStream::next_with_timeout`] once the bus has
/// been dropped and all queued events are consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("event bus closed")]
pub struct BusClosed;

/// A subscription to the event bus.
///
/// Yields events in publish order, optionally filtered to one base. When
/// the subscriber lags past its queue capacity, the oldest events are lost;
/// the loss is recorded on the bus-wide dropped counter and the stream
/// continues from the oldest retained event.
pub struct EventStream {
    receiver: broadcast::Receiver<Arc<BaseEvent>>,
    base_filter: Option<Uuid>,
    dropped: Arc<AtomicU64>,
}

impl EventStream {
    /// Receives the next matching event.
    ///
    /// Returns `None` once the bus has been dropped and all queued events
    /// are consumed.
    pub async fn next(&mut self) -> Option<Arc<BaseEvent>> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => {
                    if self.matches(&event) {
                        return Some(event);
                    }
                }
                Err(RecvError::Lagged(missed)) => {
                    self.dropped.fetch_add(missed, Ordering::Relaxed);
                    tracing::warn!(
                        target: TRACING_TARGET,
                        missed,
                        "subscriber lagged, oldest events dropped"
                    );
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Receives the next matching event, waiting at most `timeout`.
    ///
    /// Returns `Ok(None)` on timeout and [`BusClosed`] once the bus has been
    /// dropped.
    pub async fn next_with_timeout(
        &mut self,
        timeout: Duration,
    ) -> Result<Option<Arc<BaseEvent>>, BusClosed> {
        match tokio::time::timeout(timeout, self.next()).await {
            Ok(Some(event)) => Ok(Some(event)),
            Ok(None) => Err(BusClosed),
            Err(_elapsed) => Ok(None),
        }
    }

    /// Drains any immediately available matching event without waiting.
    pub fn try_next(&mut self) -> Option<Arc<BaseEvent>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.matches(&event) {
                        return Some(event);
                    }
                }
                Err(TryRecvError::Lagged(missed)) => {
                    self.dropped.fetch_add(missed, Ordering::Relaxed);
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => return None,
            }
        }
    }

    fn matches(&self, event: &BaseEvent) -> bool {
        self.base_filter.is_none_or(|base_id| event.base_id == base_id)
    }
}

impl std::fmt::Debug for EventStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventStream")
            .field("base_filter", &self.base_filter)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EventType;

    fn event_for(base_id: Uuid) -> BaseEvent {
        BaseEvent::new(EventType::RecordCreated, base_id)
    }

    #[tokio::test]
    async fn delivers_in_publish_order() {
        let bus = EventBus::new();
        let base_id = Uuid::new_v4();
        let mut stream = bus.subscribe(base_id);

        let first = event_for(base_id).with_entity(Uuid::new_v4());
        let second = event_for(base_id).with_entity(Uuid::new_v4());
        bus.publish(first.clone());
        bus.publish(second.clone());

        assert_eq!(stream.next().await.unwrap().entity_id, first.entity_id);
        assert_eq!(stream.next().await.unwrap().entity_id, second.entity_id);
    }

    #[tokio::test]
    async fn filters_cross_base_events() {
        let bus = EventBus::new();
        let base_a = Uuid::new_v4();
        let base_b = Uuid::new_v4();
        let mut stream = bus.subscribe(base_a);

        bus.publish(event_for(base_b));
        let expected = event_for(base_a);
        bus.publish(expected.clone());

        let received = stream.next().await.unwrap();
        assert_eq!(received.base_id, base_a);
    }

    #[tokio::test]
    async fn firehose_sees_all_bases() {
        let bus = EventBus::new();
        let mut stream = bus.subscribe_all();

        let base_a = Uuid::new_v4();
        let base_b = Uuid::new_v4();
        bus.publish(event_for(base_a));
        bus.publish(event_for(base_b));

        assert_eq!(stream.next().await.unwrap().base_id, base_a);
        assert_eq!(stream.next().await.unwrap().base_id, base_b);
    }

    #[tokio::test]
    async fn publish_without_subscribers_does_not_block() {
        let bus = EventBus::new();
        let observed = bus.publish(event_for(Uuid::new_v4()));
        assert_eq!(observed, 0);
        assert_eq!(bus.published_events(), 1);
    }

    #[tokio::test]
    async fn lagging_subscriber_drops_oldest() {
        let bus = EventBus::with_capacity(4);
        let base_id = Uuid::new_v4();
        let mut stream = bus.subscribe(base_id);

        // Overflow the subscriber queue before it drains anything.
        for _ in 0..10 {
            bus.publish(event_for(base_id));
        }

        let mut received = 0;
        while stream.try_next().is_some() {
            received += 1;
        }

        assert!(received <= 4);
        assert!(bus.dropped_events() >= 6);
    }

    #[tokio::test]
    async fn timeout_returns_none_when_idle() {
        let bus = EventBus::new();
        let mut stream = bus.subscribe(Uuid::new_v4());

        let result = stream.next_with_timeout(Duration::from_millis(10)).await;
        assert_eq!(result.unwrap(), None);
    }

    #[tokio::test]
    async fn stream_ends_when_bus_dropped() {
        let bus = EventBus::new();
        let mut stream = bus.subscribe_all();
        drop(bus);

        assert!(stream.next().await.is_none());
    }
}
