//! Change feed for rendered views.
//!
//! Tracks which view keys dependents are currently observing. When a
//! gateway mutation lands, the feed computes which subscribed keys are
//! affected and bumps a revision counter; dependents watch or poll the
//! revision and re-fetch their view when it moves, so reads after a write
//! always reflect the change.

use std::collections::HashSet;
use std::sync::Mutex;
use tokio::sync::watch;

/// Categories of mutations that invalidate rendered views.
/// A gateway write reports which categories of data changed, and the
/// feed maps those to affected view keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    /// A task was created, updated, toggled, or deleted.
    TaskChanged,
    /// A list was created or deleted.
    ListChanged,
}

impl ChangeKind {
    /// Return the set of view keys that are potentially affected by this
    /// kind of mutation.
    pub fn affected_keys(&self) -> &'static [&'static str] {
        match self {
            ChangeKind::TaskChanged => &[
                "tasks://today",
                "tasks://week",
                "tasks://inbox",
                "tasks://list",
                "tasks://all",
            ],
            ChangeKind::ListChanged => &["lists://all"],
        }
    }
}

/// Tracks view subscriptions and publishes invalidations.
///
/// Thread-safe: the subscription set sits behind a `Mutex` and the
/// revision rides a `watch` channel, so the feed can be shared across
/// async tasks without `&mut self`.
pub struct ChangeFeed {
    /// Set of view keys dependents have subscribed to.
    subscribed: Mutex<HashSet<String>>,
    /// Bumped on every publish; dependents re-fetch when it moves.
    revision_tx: watch::Sender<u64>,
}

impl ChangeFeed {
    /// Create a new empty feed at revision 0.
    pub fn new() -> Self {
        let (revision_tx, _) = watch::channel(0);
        Self {
            subscribed: Mutex::new(HashSet::new()),
            revision_tx,
        }
    }

    /// Subscribe to a view key. Returns `true` if newly added.
    pub fn subscribe(&self, key: &str) -> bool {
        let mut set = self.subscribed.lock().unwrap();
        set.insert(key.to_string())
    }

    /// Unsubscribe from a view key. Returns `true` if it was present.
    pub fn unsubscribe(&self, key: &str) -> bool {
        let mut set = self.subscribed.lock().unwrap();
        set.remove(key)
    }

    /// Check if any subscriptions are registered.
    pub fn has_subscriptions(&self) -> bool {
        let set = self.subscribed.lock().unwrap();
        !set.is_empty()
    }

    /// The current revision.
    pub fn revision(&self) -> u64 {
        *self.revision_tx.borrow()
    }

    /// A receiver that resolves whenever the revision moves.
    pub fn watch(&self) -> watch::Receiver<u64> {
        self.revision_tx.subscribe()
    }

    /// Publish a set of mutations: bumps the revision and returns the
    /// subscribed keys that need re-fetching.
    pub fn publish(&self, mutations: &[ChangeKind]) -> Vec<String> {
        self.revision_tx.send_modify(|rev| *rev += 1);

        let set = self.subscribed.lock().unwrap();
        if set.is_empty() {
            return Vec::new();
        }

        let mut result = HashSet::new();
        for kind in mutations {
            for key in kind.affected_keys() {
                if set.contains(*key) {
                    result.insert((*key).to_string());
                }
            }
        }
        result.into_iter().collect()
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new()
    }
}
