//! Change-notification fan-out.
//!
//! The backing store publishes a [`Change`] after every committed write.
//! UI surfaces subscribe by table and user id; a delivered change is an
//! invalidation only. Subscribers must re-issue their fetch and recompute -
//! the notification carries no row data to trust.
//!
//! Lagged subscribers (slower than the broadcast buffer) skip ahead rather
//! than erroring out; a missed invalidation is repaired by the next one,
//! since every refresh is a full re-fetch.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Logical tables a subscriber can watch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    ReadingSessions,
    ReadingProgress,
    ReadingCumulative,
    ReadingGoals,
}

/// A row changed on `table` for `user_id`. Invalidation only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Change {
    pub table: Table,
    pub user_id: Uuid,
    pub at: DateTime<Utc>,
}

/// Fan-out hub. Cheap to clone; the store holds one and publishes into it,
/// any number of surfaces subscribe.
#[derive(Debug, Clone)]
pub struct ChangeFeed {
    tx: broadcast::Sender<Change>,
}

impl ChangeFeed {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(64);
        Self { tx }
    }

    /// Publish a change. A send with no live subscribers is not an error.
    pub fn publish(&self, table: Table, user_id: Uuid) {
        let _ = self.tx.send(Change {
            table,
            user_id,
            at: Utc::now(),
        });
    }

    /// Subscribe to changes on `table` scoped to `user_id`.
    pub fn subscribe(&self, table: Table, user_id: Uuid) -> Subscription {
        Subscription {
            rx: self.tx.subscribe(),
            table,
            user_id,
        }
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new()
    }
}

/// A filtered view of the feed for one (table, user) pair.
pub struct Subscription {
    rx: broadcast::Receiver<Change>,
    table: Table,
    user_id: Uuid,
}

impl Subscription {
    /// Wait for the next matching change. Returns `None` once the feed is
    /// closed (all publishers dropped).
    pub async fn recv(&mut self) -> Option<Change> {
        loop {
            match self.rx.recv().await {
                Ok(change) => {
                    if change.table == self.table && change.user_id == self.user_id {
                        return Some(change);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
