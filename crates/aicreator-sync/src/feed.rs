use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, trace};

use aicreator_db::Database;
use aicreator_types::events::{StoreEvent, Table};

use crate::SyncError;
use crate::run_blocking;

type Query<T> = Arc<dyn Fn(&Database) -> anyhow::Result<T> + Send + Sync>;

/// Broadcasts local store writes to every live query.
#[derive(Clone)]
pub struct ChangeFeed {
    tx: broadcast::Sender<StoreEvent>,
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeFeed {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1024);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.tx.subscribe()
    }

    /// Publish a write. Having no subscribers is fine.
    pub fn publish(&self, event: StoreEvent) {
        trace!("store event {:?}", event);
        let _ = self.tx.send(event);
    }

    /// Build a live query over `table`. With a `scope`, events known to
    /// belong to another user are skipped.
    pub fn watch<T, F>(
        &self,
        db: Arc<Database>,
        table: Table,
        scope: Option<i64>,
        query: F,
    ) -> LiveQuery<T>
    where
        T: Send + 'static,
        F: Fn(&Database) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        LiveQuery {
            rx: Some(self.subscribe()),
            db,
            table,
            scope,
            query: Arc::new(query),
            primed: false,
        }
    }
}

/// A subscription that yields a fresh snapshot of one query after each
/// relevant store change.
///
/// The first [`next`](Self::next) returns the current contents right away.
/// After [`unsubscribe`](Self::unsubscribe), or once the feed is gone,
/// `next` returns `None`.
pub struct LiveQuery<T> {
    rx: Option<broadcast::Receiver<StoreEvent>>,
    db: Arc<Database>,
    table: Table,
    scope: Option<i64>,
    query: Query<T>,
    primed: bool,
}

impl<T: Send + 'static> LiveQuery<T> {
    pub async fn next(&mut self) -> Option<Result<T, SyncError>> {
        if self.rx.is_none() {
            return None;
        }
        if !self.primed {
            self.primed = true;
            return Some(self.current().await);
        }

        let (table, scope) = (self.table, self.scope);
        let rx = self.rx.as_mut()?;
        let closed = loop {
            match rx.recv().await {
                Ok(event) if affects(table, scope, &event) => break false,
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    // Missed events; the re-run below catches up.
                    debug!("Live query on {:?} lagged by {} events", table, skipped);
                    break false;
                }
                Err(RecvError::Closed) => break true,
            }
        };

        if closed {
            self.rx = None;
            return None;
        }
        Some(self.current().await)
    }

    /// Run the query once without waiting for a change.
    pub async fn current(&self) -> Result<T, SyncError> {
        let query = self.query.clone();
        run_blocking(&self.db, move |db| query(db)).await
    }

    pub fn unsubscribe(&mut self) {
        self.rx = None;
    }

    pub fn is_subscribed(&self) -> bool {
        self.rx.is_some()
    }
}

fn affects(table: Table, scope: Option<i64>, event: &StoreEvent) -> bool {
    if event.table() != table {
        return false;
    }
    match (scope, event.user_id()) {
        (Some(want), Some(got)) => want == got,
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scoping_rules() {
        let saved = StoreEvent::ImageSaved { id: 1, user_id: 7 };
        assert!(affects(Table::Images, Some(7), &saved));
        assert!(!affects(Table::Images, Some(8), &saved));
        assert!(affects(Table::Images, None, &saved));
        assert!(!affects(Table::Videos, None, &saved));

        // Unscoped events reach every query on the table.
        assert!(affects(Table::Images, Some(8), &StoreEvent::ImageDeleted { id: 1 }));
    }

    #[tokio::test]
    async fn first_snapshot_then_changes() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let feed = ChangeFeed::new();
        let mut live = feed.watch(db.clone(), Table::Preferences, None, |db| {
            db.get_pref("theme")
        });

        assert_eq!(live.next().await.unwrap().unwrap(), None);

        db.set_pref("theme", "dark").unwrap();
        feed.publish(StoreEvent::SessionChanged);
        assert_eq!(live.next().await.unwrap().unwrap().as_deref(), Some("dark"));
    }

    #[tokio::test]
    async fn nothing_after_unsubscribe() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let feed = ChangeFeed::new();
        let mut live = feed.watch(db, Table::Users, None, |db| db.list_users());

        assert!(live.next().await.is_some());
        live.unsubscribe();
        feed.publish(StoreEvent::UserSaved { id: 1 });
        assert!(live.next().await.is_none());
        assert!(!live.is_subscribed());
    }

    #[tokio::test]
    async fn closed_feed_ends_query() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let feed = ChangeFeed::new();
        let mut live = feed.watch(db, Table::Users, None, |db| db.list_users());
        assert!(live.next().await.is_some());

        drop(feed);
        assert!(live.next().await.is_none());
    }
}
