//! In-process notification bus backed by a `tokio::sync::broadcast` channel.
//!
//! The form controller publishes a [`FormEvent`] after each successful save
//! so that a parent container (or any other listener) can react.

use chrono::Utc;
use serde::Serialize;
use tokio::sync::broadcast;

use projhis_core::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// FormEvent
// ---------------------------------------------------------------------------

/// Something that happened on the entry form.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum FormEvent {
    /// A record was stored.
    Saved {
        id: DbId,
        name: String,
        timestamp: Timestamp,
    },
}

impl FormEvent {
    pub fn saved(id: DbId, name: impl Into<String>) -> Self {
        Self::Saved {
            id,
            name: name.into(),
            timestamp: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 64;

/// Fan-out bus for [`FormEvent`]s.
///
/// Any number of subscribers independently receive every event published
/// after they subscribed.
pub struct EventBus {
    sender: broadcast::Sender<FormEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full the oldest unread events are dropped and slow
    /// receivers observe `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    pub fn publish(&self, event: FormEvent) {
        // A send error only means nobody is listening.
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FormEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_each_receive_events() {
        let bus = EventBus::default();
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();

        bus.publish(FormEvent::saved(11, "Airport Hangar"));

        for rx in [&mut first, &mut second] {
            match rx.recv().await.unwrap() {
                FormEvent::Saved { id, name, .. } => {
                    assert_eq!(id, 11);
                    assert_eq!(name, "Airport Hangar");
                }
            }
        }
    }

    #[test]
    fn publish_without_subscribers_is_harmless() {
        EventBus::default().publish(FormEvent::saved(1, "Nobody listening"));
    }

    #[test]
    fn saved_event_serializes_with_tag() {
        let event = FormEvent::saved(3, "Clinic");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "saved");
        assert_eq!(json["id"], 3);
        assert_eq!(json["name"], "Clinic");
    }
}
