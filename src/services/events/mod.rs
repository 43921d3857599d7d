use crate::engine::aggregator;
use crate::models::{InteractionEvent, InteractionKind, ItemStats};
use parking_lot::RwLock;
use std::collections::HashMap;

/// In-memory interaction log. Durable event storage belongs to the
/// platform's data layer; this buffer holds whatever has been ingested
/// during the process lifetime and hands out consistent snapshots for
/// training and evaluation.
#[derive(Debug, Default)]
pub struct EventStore {
    events: RwLock<Vec<InteractionEvent>>,
}

impl EventStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_events(events: Vec<InteractionEvent>) -> Self {
        Self {
            events: RwLock::new(events),
        }
    }

    pub fn record(&self, event: InteractionEvent) {
        self.events.write().push(event);
    }

    /// Drop the buffered events. The durable log, if any, lives upstream.
    pub fn clear(&self) {
        self.events.write().clear();
    }

    pub fn snapshot(&self) -> Vec<InteractionEvent> {
        self.events.read().clone()
    }

    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }

    /// Per-item view/favorite/booking counters for popularity scoring.
    /// Only bookings that would produce a rating are counted; a cancelled
    /// or non-lodging booking is not a popularity signal either.
    pub fn item_stats(&self) -> HashMap<i64, ItemStats> {
        let mut stats: HashMap<i64, ItemStats> = HashMap::new();
        for event in self.events.read().iter() {
            if event.item_id <= 0 {
                continue;
            }
            let slot = stats.entry(event.item_id).or_default();
            match event.kind {
                InteractionKind::View => slot.views += 1,
                InteractionKind::Favorite => slot.favorites += 1,
                InteractionKind::Booking => {
                    if aggregator::base_score(event).is_some() {
                        slot.bookings += 1;
                    }
                }
                InteractionKind::Review => {}
            }
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BookedProduct, BookingStatus};

    #[test]
    fn stats_count_qualifying_bookings_only() {
        let store = EventStore::new();
        store.record(InteractionEvent::new(1, 5, InteractionKind::View));
        store.record(InteractionEvent::new(2, 5, InteractionKind::View));
        store.record(InteractionEvent::new(1, 5, InteractionKind::Favorite));
        store.record(
            InteractionEvent::new(1, 5, InteractionKind::Booking)
                .with_booking(BookingStatus::Confirmed, BookedProduct::Lodging),
        );
        store.record(
            InteractionEvent::new(2, 5, InteractionKind::Booking)
                .with_booking(BookingStatus::Cancelled, BookedProduct::Lodging),
        );

        let stats = store.item_stats();
        let item = stats.get(&5).unwrap();
        assert_eq!(item.views, 2);
        assert_eq!(item.favorites, 1);
        assert_eq!(item.bookings, 1);
    }

    #[test]
    fn snapshot_is_a_point_in_time_copy() {
        let store = EventStore::new();
        store.record(InteractionEvent::new(1, 1, InteractionKind::View));
        let snapshot = store.snapshot();
        store.record(InteractionEvent::new(2, 2, InteractionKind::View));

        assert_eq!(snapshot.len(), 1);
        assert_eq!(store.len(), 2);
    }
}
