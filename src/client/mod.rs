//! Client-side state with optimistic updates.
//!
//! Mirrors what the UI page holds: the active view's tasks, the selected
//! task, and the sidebar lists. Every mutating action applies to local
//! state synchronously first, then issues the gateway call and reconciles
//! with its authoritative response: the optimistic record is replaced on
//! success and rolled back on failure.
//!
//! Rapid repeated mutations of the same entity can have responses resolve
//! out of order, so each entity carries a monotonically increasing request
//! generation. A response whose generation is no longer the entity's
//! newest is stale and gets discarded instead of overwriting fresher
//! state.

use crate::db::{now, today_local};
use crate::error::StoreResult;
use crate::gateway::StoreGateway;
use crate::types::{List, Task, TaskPatch};
use crate::views::View;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

/// Prefix for client-temporary IDs, replaced by the server-assigned ID
/// once a create reconciles.
const LOCAL_ID_PREFIX: &str = "local-";

#[derive(Default)]
struct Inner {
    view: Option<View>,
    tasks: Vec<Task>,
    selected: Option<Task>,
    lists: Vec<List>,
    /// Latest request generation per entity ID.
    generations: HashMap<String, u64>,
}

impl Inner {
    fn begin(&mut self, id: &str) -> u64 {
        let generation = self.generations.entry(id.to_string()).or_insert(0);
        *generation += 1;
        *generation
    }

    fn is_current(&self, id: &str, generation: u64) -> bool {
        self.generations.get(id).copied() == Some(generation)
    }

    /// Apply a local mutation to the task and, if it is the selected one,
    /// to the selection mirror.
    fn apply_local(&mut self, id: &str, f: impl Fn(&mut Task)) {
        if let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) {
            f(task);
        }
        if let Some(selected) = self.selected.as_mut() {
            if selected.id == id {
                f(selected);
            }
        }
    }

    /// Replace the record matching `id` with the authoritative one.
    fn replace(&mut self, id: &str, task: Task) {
        if let Some(slot) = self.tasks.iter_mut().find(|t| t.id == id) {
            *slot = task.clone();
        }
        if let Some(selected) = self.selected.as_mut() {
            if selected.id == id {
                *selected = task;
            }
        }
    }
}

/// In-memory UI state reconciled against a store gateway.
pub struct ClientState<G> {
    gateway: G,
    inner: Mutex<Inner>,
}

impl<G: StoreGateway> ClientState<G> {
    pub fn new(gateway: G) -> Self {
        Self {
            gateway,
            inner: Mutex::new(Inner::default()),
        }
    }

    /// The active view's tasks, in render order.
    pub fn tasks(&self) -> Vec<Task> {
        self.inner.lock().unwrap().tasks.clone()
    }

    /// The sidebar lists.
    pub fn lists(&self) -> Vec<List> {
        self.inner.lock().unwrap().lists.clone()
    }

    /// The currently selected task, if any.
    pub fn selected(&self) -> Option<Task> {
        self.inner.lock().unwrap().selected.clone()
    }

    /// The active view selector.
    pub fn view(&self) -> Option<View> {
        self.inner.lock().unwrap().view.clone()
    }

    /// Switch the active view: the selection is cleared and both the task
    /// collection and the list collection are re-fetched.
    pub async fn activate_view(&self, view: Option<View>) {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.selected = None;
            inner.view = view;
        }
        let view = self.view();
        let tasks = self.gateway.list_tasks(view.as_ref()).await;
        let lists = self.gateway.list_lists().await;

        let mut inner = self.inner.lock().unwrap();
        inner.tasks = tasks;
        inner.lists = lists;
    }

    /// Select a task from the current collection.
    pub fn select(&self, id: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.selected = inner.tasks.iter().find(|t| t.id == id).cloned();
    }

    pub fn clear_selection(&self) {
        self.inner.lock().unwrap().selected = None;
    }

    /// Create a task: inserted locally under a client-temporary ID, then
    /// swapped for the server record. A failed create removes the
    /// optimistic record.
    pub async fn create(&self, title: &str) -> StoreResult<Task> {
        let ts = now();
        let temp_id = format!("{LOCAL_ID_PREFIX}{}", Uuid::now_v7());

        let (view, list_id) = {
            let mut inner = self.inner.lock().unwrap();
            let list_id = match &inner.view {
                Some(View::ByList(id)) => Some(id.clone()),
                _ => None,
            };
            let scheduled_date = matches!(inner.view, Some(View::Today)).then(today_local);
            inner.tasks.insert(
                0,
                Task {
                    id: temp_id.clone(),
                    title: title.trim().to_string(),
                    notes: None,
                    due_date: None,
                    scheduled_date,
                    priority: 0,
                    completed: false,
                    completed_at: None,
                    list_id: list_id.clone(),
                    created_at: ts,
                    updated_at: ts,
                },
            );
            (inner.view.clone(), list_id)
        };

        match self.gateway.create_task(title, list_id, view.as_ref()).await {
            Ok(task) => {
                let mut inner = self.inner.lock().unwrap();
                inner.replace(&temp_id, task.clone());
                Ok(task)
            }
            Err(e) => {
                let mut inner = self.inner.lock().unwrap();
                inner.tasks.retain(|t| t.id != temp_id);
                Err(e)
            }
        }
    }

    /// Toggle completion. Applied locally (flag plus completion stamp),
    /// then reconciled with the gateway response.
    pub async fn toggle(&self, id: &str, completed: bool) -> StoreResult<()> {
        let ts = now();
        let generation = {
            let mut inner = self.inner.lock().unwrap();
            let generation = inner.begin(id);
            inner.apply_local(id, |t| {
                t.completed = completed;
                t.completed_at = completed.then_some(ts);
                t.updated_at = ts;
            });
            generation
        };

        let result = self.gateway.toggle_task(id, completed).await;
        self.reconcile(id, generation, result).await
    }

    /// Edit fields. The patch is applied locally, then reconciled.
    pub async fn update(&self, id: &str, patch: TaskPatch) -> StoreResult<()> {
        let ts = now();
        let generation = {
            let mut inner = self.inner.lock().unwrap();
            let generation = inner.begin(id);
            inner.apply_local(id, |t| apply_patch(t, &patch, ts));
            generation
        };

        let result = self.gateway.update_task(id, &patch).await;
        self.reconcile(id, generation, result).await
    }

    /// Delete a task: removed locally, re-fetched on failure.
    pub async fn delete(&self, id: &str) -> StoreResult<()> {
        {
            let mut inner = self.inner.lock().unwrap();
            // Newer generation so any in-flight response for this entity
            // is discarded rather than resurrecting the row.
            inner.begin(id);
            inner.tasks.retain(|t| t.id != id);
            if inner.selected.as_ref().is_some_and(|s| s.id == id) {
                inner.selected = None;
            }
        }

        match self.gateway.delete_task(id).await {
            Ok(()) => Ok(()),
            Err(e) => {
                self.refresh().await;
                Err(e)
            }
        }
    }

    /// Merge an authoritative response, unless a newer request owns the
    /// entity by now. Failures restore ground truth from the gateway.
    async fn reconcile(&self, id: &str, generation: u64, result: StoreResult<Task>) -> StoreResult<()> {
        match result {
            Ok(task) => {
                let mut inner = self.inner.lock().unwrap();
                if inner.is_current(id, generation) {
                    inner.replace(id, task);
                }
                Ok(())
            }
            Err(e) => {
                let stale = !self.inner.lock().unwrap().is_current(id, generation);
                if stale {
                    return Ok(());
                }
                self.refresh().await;
                Err(e)
            }
        }
    }

    /// Re-fetch the active view from the gateway.
    async fn refresh(&self) {
        let view = self.view();
        let tasks = self.gateway.list_tasks(view.as_ref()).await;

        let mut inner = self.inner.lock().unwrap();
        inner.tasks = tasks;
        if let Some(selected) = &inner.selected {
            let id = selected.id.clone();
            inner.selected = inner.tasks.iter().find(|t| t.id == id).cloned();
        }
    }
}

/// Apply a patch to a local record the same way the store merges it:
/// present fields win (absent-valued ones clear), omitted fields stay, and
/// the completed/completed_at invariant is re-normalized.
fn apply_patch(task: &mut Task, patch: &TaskPatch, ts: DateTime<Utc>) {
    if let Some(title) = &patch.title {
        task.title = title.trim().to_string();
    }
    if let Some(notes) = &patch.notes {
        task.notes = notes.clone();
    }
    if let Some(due_date) = patch.due_date {
        task.due_date = due_date;
    }
    if let Some(scheduled_date) = patch.scheduled_date {
        task.scheduled_date = scheduled_date;
    }
    if let Some(priority) = patch.priority {
        task.priority = priority;
    }
    if let Some(list_id) = &patch.list_id {
        task.list_id = list_id.clone();
    }
    if let Some(completed) = patch.completed {
        task.completed = completed;
    }
    if let Some(completed_at) = patch.completed_at {
        task.completed_at = completed_at;
    }

    if task.completed {
        task.completed_at = task.completed_at.or(Some(ts));
    } else {
        task.completed_at = None;
    }
    task.updated_at = ts;
}
