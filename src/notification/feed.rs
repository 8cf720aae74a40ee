//! Current notification list, swapped wholesale on every update

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;
use tokio::sync::broadcast;

use super::Notification;

/// Capacity of the re-render signal channel
const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Signal sent to the list widget when the feed changes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedEvent {
    /// The whole list was replaced; every row must be re-rendered
    Reset { generation: u64, len: usize },
}

/// Holds an immutable snapshot of the notification list.
///
/// Readers take a snapshot and keep it for the duration of a render pass;
/// `set_notification_items` swaps in a new list without disturbing them.
pub struct NotificationFeed {
    snapshot: ArcSwap<Vec<Notification>>,
    generation: AtomicU64,
    events: broadcast::Sender<FeedEvent>,
}

impl Default for NotificationFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationFeed {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            snapshot: ArcSwap::from_pointee(Vec::new()),
            generation: AtomicU64::new(0),
            events,
        }
    }

    /// Replace the whole list and signal a full re-render.
    ///
    /// Returns the generation number of the new snapshot.
    pub fn set_notification_items(&self, items: Vec<Notification>) -> u64 {
        let len = items.len();
        self.snapshot.store(Arc::new(items));
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;

        tracing::debug!(generation, len, "Notification list replaced");

        // No subscribers is fine; the next reader picks up the new snapshot.
        let _ = self.events.send(FeedEvent::Reset { generation, len });
        generation
    }

    /// Current list
    pub fn snapshot(&self) -> Arc<Vec<Notification>> {
        self.snapshot.load_full()
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    pub fn len(&self) -> usize {
        self.snapshot.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Subscribe to re-render signals
    pub fn subscribe(&self) -> broadcast::Receiver<FeedEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(n: i64) -> Vec<Notification> {
        (0..n)
            .map(|id| Notification::builder(id, format!("subject {}", id)).build())
            .collect()
    }

    #[test]
    fn test_feed_starts_empty() {
        let feed = NotificationFeed::new();
        assert!(feed.is_empty());
        assert_eq!(feed.generation(), 0);
    }

    #[test]
    fn test_set_replaces_previous_items() {
        let feed = NotificationFeed::new();
        feed.set_notification_items(items(3));
        feed.set_notification_items(items(1));

        let snapshot = feed.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].subject, "subject 0");
        assert_eq!(feed.generation(), 2);
    }

    #[test]
    fn test_old_snapshot_survives_swap() {
        let feed = NotificationFeed::new();
        feed.set_notification_items(items(2));
        let held = feed.snapshot();

        feed.set_notification_items(Vec::new());

        assert_eq!(held.len(), 2);
        assert!(feed.is_empty());
    }

    #[tokio::test]
    async fn test_set_broadcasts_reset() {
        let feed = NotificationFeed::new();
        let mut events = feed.subscribe();

        let generation = feed.set_notification_items(items(4));

        assert_eq!(
            events.recv().await.unwrap(),
            FeedEvent::Reset { generation, len: 4 }
        );
    }
}
