//! Listing change events
//!
//! Events are broadcast to every connected socket whenever a listing is
//! created, updated or deleted. There are no rooms and no replay: a client
//! that is not connected when an event is published never sees it.

use serde::{Deserialize, Serialize};

use super::listing::Listing;

/// An event sent over the real-time channel
///
/// Wire format: `{"event": "listing_created", "data": {...}}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ListingEvent {
    /// Greeting sent on connect and in reply to a `join`
    Welcome {
        message: String,
        connection_id: String,
    },
    ListingCreated(Listing),
    ListingUpdated(Listing),
    ListingDeleted { id: i64 },
}

impl ListingEvent {
    /// Whether receiving this event makes cached listing data stale
    pub fn touches_listings(&self) -> bool {
        !matches!(self, ListingEvent::Welcome { .. })
    }

    pub fn name(&self) -> &'static str {
        match self {
            ListingEvent::Welcome { .. } => "welcome",
            ListingEvent::ListingCreated(_) => "listing_created",
            ListingEvent::ListingUpdated(_) => "listing_updated",
            ListingEvent::ListingDeleted { .. } => "listing_deleted",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deleted_event_wire_format() {
        let event = ListingEvent::ListingDeleted { id: 7 };
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["event"], "listing_deleted");
        assert_eq!(json["data"]["id"], 7);
        assert_eq!(event.name(), "listing_deleted");
    }

    #[test]
    fn test_welcome_does_not_touch_listings() {
        let welcome = ListingEvent::Welcome {
            message: "hi".to_string(),
            connection_id: "abc".to_string(),
        };
        assert!(!welcome.touches_listings());
        assert!(ListingEvent::ListingDeleted { id: 1 }.touches_listings());
    }
}
