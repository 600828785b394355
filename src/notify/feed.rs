//! In-process change feed
//!
//! Row-level insert/update/delete notifications, broadcast to every live
//! subscriber. Subscribers only see events published after they subscribed.

use serde::Serialize;
use tokio::sync::broadcast;

/// Kind of row change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// A single row change
#[derive(Debug, Clone, Serialize)]
pub struct ChangeEvent {
    pub table: String,
    pub kind: ChangeKind,
    /// The row after the change (before it, for deletes)
    pub record: serde_json::Value,
}

impl ChangeEvent {
    pub fn new<T: Serialize>(table: &str, kind: ChangeKind, record: &T) -> Self {
        Self {
            table: table.to_string(),
            kind,
            record: serde_json::to_value(record).unwrap_or_default(),
        }
    }
}

#[derive(Clone)]
pub struct ChangeFeed {
    tx: broadcast::Sender<ChangeEvent>,
}

impl ChangeFeed {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publish an event; returns how many subscribers will see it
    pub fn publish(&self, event: ChangeEvent) -> usize {
        tracing::debug!(table = %event.table, kind = ?event.kind, "change event");
        // No subscribers is fine
        self.tx.send(event).unwrap_or(0)
    }

    pub fn publish_insert<T: Serialize>(&self, table: &str, record: &T) -> usize {
        self.publish(ChangeEvent::new(table, ChangeKind::Insert, record))
    }

    pub fn publish_update<T: Serialize>(&self, table: &str, record: &T) -> usize {
        self.publish(ChangeEvent::new(table, ChangeKind::Update, record))
    }

    pub fn publish_delete<T: Serialize>(&self, table: &str, record: &T) -> usize {
        self.publish(ChangeEvent::new(table, ChangeKind::Delete, record))
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_publish_without_subscribers() {
        let feed = ChangeFeed::new(8);
        assert_eq!(feed.publish_insert("pos_order", &json!({"id": 1})), 0);
    }

    #[tokio::test]
    async fn test_subscriber_sees_only_later_events() {
        let feed = ChangeFeed::new(8);
        feed.publish_insert("pos_order", &json!({"id": 1}));

        let mut rx = feed.subscribe();
        assert_eq!(feed.publish_update("pos_order", &json!({"id": 2})), 1);

        let event = rx.recv().await.unwrap();
        assert_eq!(event.kind, ChangeKind::Update);
        assert_eq!(event.record["id"], 2);
        assert!(rx.try_recv().is_err());
    }
}
