//! Store gateways: the contract between UI state and the database.
//!
//! Reads never fail to the caller: a store error is logged and an empty
//! collection returned, so the UI degrades to "no tasks" instead of
//! crashing. Writes return structured errors the caller can act on, and
//! publish to the change feed on success so rendered views re-fetch.

use crate::db::Database;
use crate::error::StoreResult;
use crate::subscriptions::{ChangeFeed, ChangeKind};
use crate::types::{List, Task, TaskPatch};
use crate::views::View;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::warn;

/// Operations the UI layer drives against the task and list stores.
#[async_trait]
pub trait StoreGateway: Send + Sync {
    /// Tasks for a view, newest first; empty on store failure.
    async fn list_tasks(&self, view: Option<&View>) -> Vec<Task>;

    /// Create a task; a `Today` view hint schedules it for today.
    async fn create_task(
        &self,
        title: &str,
        list_id: Option<String>,
        view_hint: Option<&View>,
    ) -> StoreResult<Task>;

    /// Apply a partial update to a task.
    async fn update_task(&self, task_id: &str, patch: &TaskPatch) -> StoreResult<Task>;

    /// Set the completed flag, stamping or clearing the completion time.
    async fn toggle_task(&self, task_id: &str, completed: bool) -> StoreResult<Task>;

    /// Delete a task; idempotent.
    async fn delete_task(&self, task_id: &str) -> StoreResult<()>;

    /// All lists, oldest first; empty on store failure.
    async fn list_lists(&self) -> Vec<List>;

    /// Create a list.
    async fn create_list(&self, name: &str, color: Option<String>) -> StoreResult<List>;

    /// Delete a list, moving its tasks to the inbox; idempotent.
    async fn delete_list(&self, list_id: &str) -> StoreResult<()>;
}

/// Forward the gateway contract through a shared handle, so an
/// `Arc<G>` can stand in anywhere a `StoreGateway` is required.
#[async_trait]
impl<G: StoreGateway + ?Sized> StoreGateway for Arc<G> {
    async fn list_tasks(&self, view: Option<&View>) -> Vec<Task> {
        (**self).list_tasks(view).await
    }

    async fn create_task(
        &self,
        title: &str,
        list_id: Option<String>,
        view_hint: Option<&View>,
    ) -> StoreResult<Task> {
        (**self).create_task(title, list_id, view_hint).await
    }

    async fn update_task(&self, task_id: &str, patch: &TaskPatch) -> StoreResult<Task> {
        (**self).update_task(task_id, patch).await
    }

    async fn toggle_task(&self, task_id: &str, completed: bool) -> StoreResult<Task> {
        (**self).toggle_task(task_id, completed).await
    }

    async fn delete_task(&self, task_id: &str) -> StoreResult<()> {
        (**self).delete_task(task_id).await
    }

    async fn list_lists(&self) -> Vec<List> {
        (**self).list_lists().await
    }

    async fn create_list(&self, name: &str, color: Option<String>) -> StoreResult<List> {
        (**self).create_list(name, color).await
    }

    async fn delete_list(&self, list_id: &str) -> StoreResult<()> {
        (**self).delete_list(list_id).await
    }
}

/// Gateway backed by the SQLite store.
#[derive(Clone)]
pub struct SqliteGateway {
    db: Database,
    feed: Arc<ChangeFeed>,
}

impl SqliteGateway {
    pub fn new(db: Database, feed: Arc<ChangeFeed>) -> Self {
        Self { db, feed }
    }

    /// The change feed mutations are published to.
    pub fn feed(&self) -> &Arc<ChangeFeed> {
        &self.feed
    }
}

#[async_trait]
impl StoreGateway for SqliteGateway {
    async fn list_tasks(&self, view: Option<&View>) -> Vec<Task> {
        match self.db.list_tasks(view) {
            Ok(tasks) => tasks,
            Err(e) => {
                warn!("task query failed, returning empty view: {e:#}");
                Vec::new()
            }
        }
    }

    async fn create_task(
        &self,
        title: &str,
        list_id: Option<String>,
        view_hint: Option<&View>,
    ) -> StoreResult<Task> {
        let task = self.db.create_task(title, list_id, view_hint)?;
        self.feed.publish(&[ChangeKind::TaskChanged]);
        Ok(task)
    }

    async fn update_task(&self, task_id: &str, patch: &TaskPatch) -> StoreResult<Task> {
        let task = self.db.update_task(task_id, patch)?;
        self.feed.publish(&[ChangeKind::TaskChanged]);
        Ok(task)
    }

    async fn toggle_task(&self, task_id: &str, completed: bool) -> StoreResult<Task> {
        let task = self.db.toggle_task(task_id, completed)?;
        self.feed.publish(&[ChangeKind::TaskChanged]);
        Ok(task)
    }

    async fn delete_task(&self, task_id: &str) -> StoreResult<()> {
        self.db.delete_task(task_id)?;
        self.feed.publish(&[ChangeKind::TaskChanged]);
        Ok(())
    }

    async fn list_lists(&self) -> Vec<List> {
        match self.db.list_lists() {
            Ok(lists) => lists,
            Err(e) => {
                warn!("list query failed, returning empty sidebar: {e:#}");
                Vec::new()
            }
        }
    }

    async fn create_list(&self, name: &str, color: Option<String>) -> StoreResult<List> {
        let list = self.db.create_list(name, color)?;
        self.feed.publish(&[ChangeKind::ListChanged]);
        Ok(list)
    }

    async fn delete_list(&self, list_id: &str) -> StoreResult<()> {
        self.db.delete_list(list_id)?;
        // Member tasks moved to the inbox, so task views change too.
        self.feed
            .publish(&[ChangeKind::ListChanged, ChangeKind::TaskChanged]);
        Ok(())
    }
}
