//! Headless, lane-partitioned publish/subscribe event bus.
//!
//! Uses [`tokio::sync::broadcast`] channels under the hood so that every
//! subscriber receives every message without any single subscriber blocking
//! the others.
//!
//! # Lanes
//!
//! | Lane | Typical traffic |
//! |---|---|
//! | [`Lane::Inbound`] | Raw wire messages received from sensors |
//! | [`Lane::Outbound`] | Wire messages the service wants sent (commands, positions) |
//! | [`Lane::Positions`] | Fused [`TimedSample`][camloc_types::TimedSample]s for in-process consumers |
//! | [`Lane::Faults`] | Rejected traffic and other non-fatal faults |

use camloc_types::{CamlocError, Event};
use tokio::sync::broadcast;

/// Default channel capacity (number of buffered events before old ones are
/// dropped for slow subscribers).
pub const DEFAULT_CAPACITY: usize = 256;

/// Routing lanes on the event bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lane {
    Inbound,
    Outbound,
    Positions,
    Faults,
}

/// Shared event bus. Clone it cheaply – all clones share the same underlying
/// broadcast channels.
#[derive(Clone, Debug)]
pub struct EventBus {
    inbound: broadcast::Sender<Event>,
    outbound: broadcast::Sender<Event>,
    positions: broadcast::Sender<Event>,
    faults: broadcast::Sender<Event>,
}

impl EventBus {
    /// Create a new bus with the given channel capacity.
    ///
    /// The `capacity` is applied to every lane independently and must be
    /// greater than zero.
    pub fn new(capacity: usize) -> Self {
        let (inbound, _) = broadcast::channel(capacity);
        let (outbound, _) = broadcast::channel(capacity);
        let (positions, _) = broadcast::channel(capacity);
        let (faults, _) = broadcast::channel(capacity);
        Self {
            inbound,
            outbound,
            positions,
            faults,
        }
    }

    /// Publish `event` on the given [`Lane`].
    ///
    /// Returns the number of active receivers that were handed the event.
    ///
    /// # Errors
    ///
    /// [`CamlocError::Channel`] when nobody is subscribed to the lane.
    pub fn publish_to(&self, lane: Lane, event: Event) -> Result<usize, CamlocError> {
        self.lane_sender(lane)
            .send(event)
            .map_err(|_| CamlocError::Channel(format!("No subscribers for lane {lane:?}")))
    }

    /// Subscribe to a single [`Lane`].
    pub fn subscribe_to(&self, lane: Lane) -> LaneReceiver {
        LaneReceiver {
            lane,
            receiver: self.lane_sender(lane).subscribe(),
        }
    }

    /// Number of receivers currently subscribed to `lane`.
    pub fn subscriber_count(&self, lane: Lane) -> usize {
        self.lane_sender(lane).receiver_count()
    }

    fn lane_sender(&self, lane: Lane) -> &broadcast::Sender<Event> {
        match lane {
            Lane::Inbound => &self.inbound,
            Lane::Outbound => &self.outbound,
            Lane::Positions => &self.positions,
            Lane::Faults => &self.faults,
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// An async receiver bound to a single [`Lane`].
///
/// Obtained via [`EventBus::subscribe_to`].
pub struct LaneReceiver {
    lane: Lane,
    receiver: broadcast::Receiver<Event>,
}

impl LaneReceiver {
    /// Wait for the next event on this lane.
    ///
    /// Returns:
    /// * `Ok(event)` – a successfully received event.
    /// * `Err(broadcast::error::RecvError::Lagged(n))` – the subscriber fell
    ///   behind and `n` messages were dropped.  The caller decides whether to
    ///   continue or abort.
    /// * `Err(broadcast::error::RecvError::Closed)` – the bus has shut down.
    pub async fn recv(&mut self) -> Result<Event, broadcast::error::RecvError> {
        self.receiver.recv().await
    }

    /// Take an already buffered event without waiting.
    pub fn try_recv(&mut self) -> Result<Event, broadcast::error::TryRecvError> {
        self.receiver.try_recv()
    }

    /// The [`Lane`] this receiver is bound to.
    pub fn lane(&self) -> Lane {
        self.lane
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camloc_types::{EventPayload, WireMessage};

    fn make_event(topic: &str) -> Event {
        Event::now(
            "camloc-middleware::test",
            EventPayload::Wire(WireMessage::new(topic, vec![0, 0, 0, 0])),
        )
    }

    #[tokio::test]
    async fn publish_and_receive() -> Result<(), Box<dyn std::error::Error>> {
        let bus = EventBus::default();
        let mut rx = bus.subscribe_to(Lane::Inbound);

        let event = make_event("camloc/cam1/locate");
        assert_eq!(bus.publish_to(Lane::Inbound, event.clone())?, 1);

        let received = rx.recv().await?;
        assert_eq!(received.id, event.id);
        assert_eq!(rx.lane(), Lane::Inbound);
        Ok(())
    }

    #[tokio::test]
    async fn multiple_subscribers_receive_same_event() -> Result<(), Box<dyn std::error::Error>> {
        let bus = EventBus::default();
        let mut rx1 = bus.subscribe_to(Lane::Outbound);
        let mut rx2 = bus.subscribe_to(Lane::Outbound);
        assert_eq!(bus.subscriber_count(Lane::Outbound), 2);

        let event = make_event("camloc/position");
        bus.publish_to(Lane::Outbound, event.clone())?;

        assert_eq!(rx1.recv().await?.id, event.id);
        assert_eq!(rx2.recv().await?.id, event.id);
        Ok(())
    }

    #[test]
    fn publish_no_subscribers_returns_error() {
        let bus = EventBus::default();
        let result = bus.publish_to(Lane::Faults, make_event("test"));
        assert!(matches!(result, Err(CamlocError::Channel(_))));
    }

    /// A subscriber on `Outbound` must not receive events published to
    /// `Inbound` because they are routed through separate channels.
    #[tokio::test]
    async fn lane_subscriber_does_not_receive_other_lane_events() -> Result<(), Box<dyn std::error::Error>> {
        let bus = EventBus::default();
        let mut outbound = bus.subscribe_to(Lane::Outbound);
        let _inbound = bus.subscribe_to(Lane::Inbound);

        bus.publish_to(Lane::Inbound, make_event("camloc/cam1/config"))?;

        let result = tokio::time::timeout(std::time::Duration::from_millis(50), outbound.recv()).await;
        assert!(result.is_err(), "Outbound subscriber must not receive an Inbound event");
        Ok(())
    }

    #[test]
    fn try_recv_drains_buffered_events() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe_to(Lane::Inbound);
        bus.publish_to(Lane::Inbound, make_event("a")).unwrap();
        bus.publish_to(Lane::Inbound, make_event("b")).unwrap();

        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_ok());
        assert!(matches!(rx.try_recv(), Err(broadcast::error::TryRecvError::Empty)));
    }

    /// Flooding a low-capacity channel while a subscriber sleeps must produce
    /// a `Lagged` error rather than panicking or blocking.
    #[tokio::test]
    async fn lane_lag_on_slow_subscriber() {
        const CAPACITY: usize = 16;
        let bus = EventBus::new(CAPACITY);
        let mut slow = bus.subscribe_to(Lane::Inbound);

        for _ in 0..1_000 {
            let _ = bus.publish_to(Lane::Inbound, make_event("flood"));
        }

        let result = slow.recv().await;
        assert!(
            matches!(result, Err(broadcast::error::RecvError::Lagged(_))),
            "expected Lagged error, got: {result:?}"
        );
    }
}
