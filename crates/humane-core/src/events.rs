use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Default number of buffered changes before slow subscribers lag.
pub const DEFAULT_FEED_CAPACITY: usize = 256;

/// Every habit or entry mutation produces a StoreChange.
/// Subscribers only need to know that something in a user's partition
/// changed; they re-run aggregation from scratch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StoreChange {
    HabitCreated {
        user_id: String,
        habit_id: String,
    },
    HabitUpdated {
        user_id: String,
        habit_id: String,
    },
    HabitDeleted {
        user_id: String,
        habit_id: String,
    },
    EntryWritten {
        user_id: String,
        habit_id: String,
        date: NaiveDate,
    },
    EntryDeleted {
        user_id: String,
        habit_id: String,
        date: NaiveDate,
    },
    /// Bulk removal of a user's habits or entries.
    PartitionCleared {
        user_id: String,
        habits: usize,
        entries: usize,
    },
}

impl StoreChange {
    pub fn user_id(&self) -> &str {
        match self {
            StoreChange::HabitCreated { user_id, .. }
            | StoreChange::HabitUpdated { user_id, .. }
            | StoreChange::HabitDeleted { user_id, .. }
            | StoreChange::EntryWritten { user_id, .. }
            | StoreChange::EntryDeleted { user_id, .. }
            | StoreChange::PartitionCleared { user_id, .. } => user_id,
        }
    }
}

/// Broadcast channel of store mutations.
///
/// Cloning a feed yields another handle onto the same channel.
#[derive(Debug, Clone)]
pub struct ChangeFeed {
    tx: broadcast::Sender<StoreChange>,
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new(DEFAULT_FEED_CAPACITY)
    }
}

impl ChangeFeed {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publish a change. Returns how many subscribers received it.
    pub fn publish(&self, change: StoreChange) -> usize {
        tracing::debug!(?change, "store change");
        self.tx.send(change).unwrap_or(0)
    }

    /// Subscribe to changes for every user.
    pub fn subscribe(&self) -> ChangeSubscription {
        ChangeSubscription {
            rx: self.tx.subscribe(),
            user_id: None,
        }
    }

    /// Subscribe to changes scoped to one user's partition.
    pub fn subscribe_user(&self, user_id: impl Into<String>) -> ChangeSubscription {
        ChangeSubscription {
            rx: self.tx.subscribe(),
            user_id: Some(user_id.into()),
        }
    }
}

/// Receiving side of a [`ChangeFeed`].
#[derive(Debug)]
pub struct ChangeSubscription {
    rx: broadcast::Receiver<StoreChange>,
    user_id: Option<String>,
}

impl ChangeSubscription {
    fn is_relevant(&self, change: &StoreChange) -> bool {
        self.user_id
            .as_deref()
            .map_or(true, |user| change.user_id() == user)
    }

    /// Wait until something relevant changed.
    ///
    /// Lagging counts as a change since the missed events are unknown.
    /// Returns `false` once every feed handle has been dropped.
    pub async fn changed(&mut self) -> bool {
        loop {
            match self.rx.recv().await {
                Ok(change) if self.is_relevant(&change) => return true,
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "change subscription lagged");
                    return true;
                }
                Err(broadcast::error::RecvError::Closed) => return false,
            }
        }
    }

    /// Drain buffered changes without waiting. Returns whether any of them
    /// were relevant.
    pub fn drain(&mut self) -> bool {
        let mut changed = false;
        loop {
            match self.rx.try_recv() {
                Ok(change) => changed |= self.is_relevant(&change),
                Err(broadcast::error::TryRecvError::Lagged(_)) => changed = true,
                Err(_) => return changed,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn created(user: &str) -> StoreChange {
        StoreChange::HabitCreated {
            user_id: user.into(),
            habit_id: "h".into(),
        }
    }

    #[test]
    fn publish_without_subscribers_is_harmless() {
        let feed = ChangeFeed::default();
        assert_eq!(feed.publish(created("u")), 0);
    }

    #[test]
    fn drain_filters_by_user() {
        let feed = ChangeFeed::new(8);
        let mut alice = feed.subscribe_user("alice");
        let mut everyone = feed.subscribe();
        feed.publish(created("bob"));
        assert!(!alice.drain());
        assert!(everyone.drain());
        feed.publish(created("alice"));
        assert!(alice.drain());
        assert!(!alice.drain());
    }

    #[test]
    fn lag_counts_as_change() {
        let feed = ChangeFeed::new(1);
        let mut sub = feed.subscribe_user("alice");
        feed.publish(created("bob"));
        feed.publish(created("bob"));
        assert!(sub.drain());
    }

    #[tokio::test]
    async fn changed_wakes_for_relevant_change() {
        let feed = ChangeFeed::new(8);
        let mut sub = feed.subscribe_user("alice");
        feed.publish(created("bob"));
        feed.publish(StoreChange::PartitionCleared {
            user_id: "alice".into(),
            habits: 1,
            entries: 2,
        });
        assert!(sub.changed().await);
    }

    #[tokio::test]
    async fn changed_reports_closed_feed() {
        let feed = ChangeFeed::new(8);
        let mut sub = feed.subscribe();
        drop(feed);
        assert!(!sub.changed().await);
    }

    #[test]
    fn change_serializes_with_type_tag() {
        let json = serde_json::to_value(created("u")).unwrap();
        assert_eq!(json["type"], "HabitCreated");
        assert_eq!(json["user_id"], "u");
    }
}
