use std::sync::mpsc::{self, Receiver, Sender};
use tracing::{debug, info};

use super::data::GeneratedImage;

/// Change notification emitted by the history store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryEvent {
    Added { id: String },
    Removed { id: String },
}

/// The HistoryStore keeps every image generated during this session.
/// Records are ordered newest first and live only as long as the process.
#[derive(Default)]
pub struct HistoryStore {
    records: Vec<GeneratedImage>,
    subscribers: Vec<Sender<HistoryEvent>>,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register for change notifications.
    /// Dropping the receiver unsubscribes on the next emitted event.
    pub fn subscribe(&mut self) -> Receiver<HistoryEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    /// Insert a record at the front of the history
    pub fn prepend(&mut self, record: GeneratedImage) {
        let id = record.id.clone();
        self.records.insert(0, record);
        info!("🖼️  Added sprite {} ({} in history)", id, self.records.len());
        self.emit(HistoryEvent::Added { id });
    }

    /// Remove the record with the given identifier.
    /// Returns the removed record, or None when the id is unknown.
    pub fn remove(&mut self, id: &str) -> Option<GeneratedImage> {
        let position = self.records.iter().position(|record| record.id == id)?;
        let removed = self.records.remove(position);
        info!("🗑️  Removed sprite {}", id);
        self.emit(HistoryEvent::Removed { id: removed.id.clone() });
        Some(removed)
    }

    /// All records, newest first
    pub fn records(&self) -> &[GeneratedImage] {
        &self.records
    }

    /// The most recently generated record
    pub fn latest(&self) -> Option<&GeneratedImage> {
        self.records.first()
    }

    pub fn get(&self, id: &str) -> Option<&GeneratedImage> {
        self.records.iter().find(|record| record.id == id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn emit(&mut self, event: HistoryEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
        debug!("history event {:?} delivered to {} subscribers", event, self.subscribers.len());
    }
}

impl std::fmt::Debug for HistoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryStore")
            .field("records", &self.records.len())
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(prompt: &str) -> GeneratedImage {
        GeneratedImage::new("data:image/png;base64,AA==".to_string(), prompt.to_string())
    }

    fn ids(store: &HistoryStore) -> Vec<String> {
        store.records().iter().map(|r| r.id.clone()).collect()
    }

    #[test]
    fn test_prepend_puts_newest_first() {
        let mut store = HistoryStore::new();
        let first = record("first");
        let second = record("second");
        let second_id = second.id.clone();

        store.prepend(first);
        store.prepend(second);

        assert_eq!(store.len(), 2);
        assert_eq!(store.latest().map(|r| r.id.as_str()), Some(second_id.as_str()));
    }

    #[test]
    fn test_remove_unknown_id_is_noop() {
        let mut store = HistoryStore::new();
        store.prepend(record("a"));
        store.prepend(record("b"));
        let before = ids(&store);

        assert!(store.remove("does-not-exist").is_none());

        assert_eq!(ids(&store), before);
    }

    #[test]
    fn test_remove_keeps_relative_order() {
        let mut store = HistoryStore::new();
        for prompt in ["a", "b", "c", "d"] {
            store.prepend(record(prompt));
        }
        let before = ids(&store);

        let removed = store.remove(&before[1]).expect("record should exist");
        assert_eq!(removed.id, before[1]);

        let expected: Vec<String> = before
            .iter()
            .filter(|id| **id != before[1])
            .cloned()
            .collect();
        assert_eq!(ids(&store), expected);
    }

    #[test]
    fn test_subscribers_receive_events() {
        let mut store = HistoryStore::new();
        let rx = store.subscribe();
        let item = record("a");
        let id = item.id.clone();

        store.prepend(item);
        store.remove(&id);
        store.remove(&id);

        let events: Vec<HistoryEvent> = rx.try_iter().collect();
        assert_eq!(
            events,
            vec![
                HistoryEvent::Added { id: id.clone() },
                HistoryEvent::Removed { id },
            ]
        );
    }

    #[test]
    fn test_dropped_subscriber_is_pruned() {
        let mut store = HistoryStore::new();
        let rx = store.subscribe();
        drop(rx);

        store.prepend(record("a"));

        assert!(store.subscribers.is_empty());
    }
}
