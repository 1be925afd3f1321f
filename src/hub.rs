use dashmap::DashMap;
use tokio::sync::broadcast;

use crate::model::ChangeEvent;

const CHANNEL_CAPACITY: usize = 256;

/// Broadcast hub for per-table change feeds. Every subscriber gets its own
/// receiver; views against the same table are fully isolated from one
/// another. The channel buffers events a subscriber has not consumed yet,
/// which is what lets a view replay events that arrived during its initial
/// fetch.
pub struct ChangeHub {
    channels: DashMap<String, broadcast::Sender<ChangeEvent>>,
}

impl Default for ChangeHub {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeHub {
    pub fn new() -> Self {
        Self {
            channels: DashMap::new(),
        }
    }

    /// Subscribe to a table's change feed. Creates the channel if needed.
    /// Dropping the receiver is the unsubscribe.
    pub fn subscribe(&self, table: &str) -> broadcast::Receiver<ChangeEvent> {
        let sender = self
            .channels
            .entry(table.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0);
        sender.subscribe()
    }

    /// Publish a change event. No-op if nobody is listening.
    pub fn publish(&self, table: &str, event: &ChangeEvent) {
        if let Some(sender) = self.channels.get(table) {
            let _ = sender.send(event.clone());
        }
    }

    /// Remove a table's channel, closing every outstanding receiver.
    pub fn remove(&self, table: &str) {
        self.channels.remove(table);
    }
}
