//! Cache change fan-out over a tokio broadcast channel

use application::ports::ChangeNotifierPort;
use domain::CacheChange;
use tokio::sync::broadcast;
use tracing::trace;

const DEFAULT_CAPACITY: usize = 16;

/// Publishes cache changes to any number of subscribers.
///
/// Publishing never blocks; slow subscribers observe `Lagged` and skip ahead.
#[derive(Debug, Clone)]
pub struct BroadcastChangeNotifier {
    sender: broadcast::Sender<CacheChange>,
}

impl Default for BroadcastChangeNotifier {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl BroadcastChangeNotifier {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CacheChange> {
        self.sender.subscribe()
    }
}

impl ChangeNotifierPort for BroadcastChangeNotifier {
    fn publish(&self, change: CacheChange) {
        // Err only means nobody is listening
        let receivers = self.sender.send(change).unwrap_or(0);
        trace!(receivers, "Cache change published");
    }
}
