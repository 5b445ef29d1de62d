//! Atomic publication of the current snapshot
//!
//! The current snapshot is the only shared mutable state. It lives in a
//! `watch` channel and is replaced in one send. Overlapping refreshes are
//! resolved latest-wins: each refresh draws a ticket when it starts and may
//! only publish while its ticket is still the newest one issued.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::types::{FetchError, Result, UserSnapshot};

/// Receiver side handed to observers
pub type SnapshotReceiver = watch::Receiver<Option<Arc<UserSnapshot>>>;

/// Identifies one refresh attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RefreshTicket(u64);

pub struct SnapshotPublisher {
    latest: AtomicU64,
    sender: watch::Sender<Option<Arc<UserSnapshot>>>,
}

impl SnapshotPublisher {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(None);
        Self {
            latest: AtomicU64::new(0),
            sender,
        }
    }

    /// Start a refresh. Any refresh begun earlier can no longer publish.
    pub fn begin(&self) -> RefreshTicket {
        RefreshTicket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: RefreshTicket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }

    /// Replace the current snapshot if `ticket` is still the newest.
    ///
    /// The ticket check and the swap happen under the channel's lock, so a
    /// reader sees either the old snapshot or the new one, never a stale
    /// refresh overwriting a newer one.
    pub fn publish(&self, ticket: RefreshTicket, snapshot: Arc<UserSnapshot>) -> Result<()> {
        let mut accepted = false;
        self.sender.send_if_modified(|slot| {
            if !self.is_current(ticket) {
                return false;
            }
            *slot = Some(Arc::clone(&snapshot));
            accepted = true;
            true
        });

        if accepted {
            info!(
                customer = %snapshot.customer_id,
                accounts = snapshot.accounts.len(),
                "snapshot published"
            );
            Ok(())
        } else {
            warn!(ticket = ticket.0, "discarding superseded refresh");
            Err(FetchError::Superseded)
        }
    }

    pub fn current(&self) -> Option<Arc<UserSnapshot>> {
        self.sender.borrow().clone()
    }

    pub fn subscribe(&self) -> SnapshotReceiver {
        self.sender.subscribe()
    }
}

impl Default for SnapshotPublisher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DataSourceMode;
    use chrono::Utc;

    fn snapshot(customer: &str) -> Arc<UserSnapshot> {
        Arc::new(UserSnapshot::empty(customer, DataSourceMode::Live, Utc::now()))
    }

    #[test]
    fn test_starts_empty() {
        let publisher = SnapshotPublisher::new();
        assert!(publisher.current().is_none());
    }

    #[test]
    fn test_publish_replaces_current() {
        let publisher = SnapshotPublisher::new();

        let first = publisher.begin();
        publisher.publish(first, snapshot("c1")).unwrap();
        let second = publisher.begin();
        publisher.publish(second, snapshot("c2")).unwrap();

        assert_eq!(publisher.current().unwrap().customer_id, "c2");
    }

    #[test]
    fn test_older_ticket_is_superseded() {
        let publisher = SnapshotPublisher::new();

        let older = publisher.begin();
        let newer = publisher.begin();
        assert!(older < newer);
        assert!(!publisher.is_current(older));

        publisher.publish(newer, snapshot("new")).unwrap();
        let err = publisher.publish(older, snapshot("old")).unwrap_err();

        assert!(matches!(err, FetchError::Superseded));
        assert_eq!(publisher.current().unwrap().customer_id, "new");
    }

    #[test]
    fn test_superseded_ticket_cannot_publish_even_first() {
        let publisher = SnapshotPublisher::new();

        let older = publisher.begin();
        let _newer = publisher.begin();

        assert!(publisher.publish(older, snapshot("old")).is_err());
        assert!(publisher.current().is_none());
    }

    #[tokio::test]
    async fn test_subscribers_see_publication() {
        let publisher = SnapshotPublisher::new();
        let mut rx = publisher.subscribe();

        let ticket = publisher.begin();
        publisher.publish(ticket, snapshot("c1")).unwrap();

        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().as_ref().unwrap().customer_id, "c1");
    }

    #[tokio::test]
    async fn test_rejected_publish_does_not_notify() {
        let publisher = SnapshotPublisher::new();
        let rx = publisher.subscribe();

        let older = publisher.begin();
        let _newer = publisher.begin();
        let _ = publisher.publish(older, snapshot("old"));

        assert!(!rx.has_changed().unwrap());
    }
}
