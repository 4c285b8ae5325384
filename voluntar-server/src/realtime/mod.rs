//! Real-time Module
//!
//! Broadcast of listing changes to every connected client. A single
//! `tokio::sync::broadcast` channel fans events out; there are no rooms
//! and missed events are not replayed.

pub mod socket;

use tokio::sync::broadcast;
use voluntar_core::domain::event::ListingEvent;

/// Publish side of the listing event channel
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<ListingEvent>,
}

impl EventBus {
    /// Creates a bus that buffers up to `capacity` events per subscriber
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Sends an event to every current subscriber
    ///
    /// Returns the number of subscribers that received it. Publishing with
    /// nobody connected is not an error.
    pub fn publish(&self, event: ListingEvent) -> usize {
        let name = event.name();
        match self.sender.send(event) {
            Ok(receivers) => {
                tracing::debug!("Broadcast {} to {} subscriber(s)", name, receivers);
                receivers
            }
            Err(_) => {
                tracing::debug!("No subscribers for {}", name);
                0
            }
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ListingEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_every_subscriber_receives_events_in_order() {
        let bus = EventBus::new(8);
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();

        assert_eq!(bus.publish(ListingEvent::ListingDeleted { id: 1 }), 2);
        assert_eq!(bus.publish(ListingEvent::ListingDeleted { id: 2 }), 2);

        for rx in [&mut first, &mut second] {
            assert_eq!(rx.recv().await.unwrap(), ListingEvent::ListingDeleted { id: 1 });
            assert_eq!(rx.recv().await.unwrap(), ListingEvent::ListingDeleted { id: 2 });
        }
    }

    #[test]
    fn test_publish_without_subscribers() {
        let bus = EventBus::new(8);
        assert_eq!(bus.publish(ListingEvent::ListingDeleted { id: 1 }), 0);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_late_subscriber_misses_earlier_events() {
        let bus = EventBus::new(8);
        let _keep_open = bus.subscribe();
        bus.publish(ListingEvent::ListingDeleted { id: 1 });

        let mut late = bus.subscribe();
        bus.publish(ListingEvent::ListingDeleted { id: 2 });

        assert_eq!(late.recv().await.unwrap(), ListingEvent::ListingDeleted { id: 2 });
    }
}
