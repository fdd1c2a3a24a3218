//! Cache change notification port

use domain::CacheChange;
#[cfg(test)]
use mockall::automock;

/// Sink receiving a notification each time the local cache is replaced
#[cfg_attr(test, automock)]
pub trait ChangeNotifierPort: Send + Sync {
    /// Deliver a change; must not block
    fn publish(&self, change: CacheChange);
}
