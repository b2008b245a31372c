//! Task table operations: the store side of the task gateway.

use super::{Database, now, today_local};
use crate::error::{StoreError, StoreResult};
use crate::types::{Task, TaskPatch};
use crate::views::View;
use anyhow::Result;
use rusqlite::{Connection, Row, params, params_from_iter};
use uuid::Uuid;

/// Map a raw row to a `Task`.
///
/// NULLs become `None`, unset scalars get their defaults (priority 0,
/// completed false), and timestamps come back as canonical UTC instants.
pub fn parse_task_row(row: &Row) -> rusqlite::Result<Task> {
    let priority: Option<i32> = row.get("priority")?;
    let completed: Option<bool> = row.get("completed")?;

    Ok(Task {
        id: row.get("id")?,
        title: row.get("title")?,
        notes: row.get("notes")?,
        due_date: row.get("due_date")?,
        scheduled_date: row.get("scheduled_date")?,
        priority: priority.unwrap_or(0),
        completed: completed.unwrap_or(false),
        completed_at: row.get("completed_at")?,
        list_id: row.get("list_id")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

/// Internal helper to get a task using an existing connection.
fn get_task_internal(conn: &Connection, task_id: &str) -> Result<Option<Task>> {
    let mut stmt = conn.prepare("SELECT * FROM tasks WHERE id = ?1")?;

    let result = stmt.query_row(params![task_id], parse_task_row);

    match result {
        Ok(task) => Ok(Some(task)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

impl Database {
    /// Create a task. The title is stored trimmed; a blank title is a
    /// validation error and nothing is persisted. A `Today` view hint
    /// schedules the task for the current date so it shows up in the view
    /// it was created from.
    pub fn create_task(
        &self,
        title: &str,
        list_id: Option<String>,
        view_hint: Option<&View>,
    ) -> StoreResult<Task> {
        let title = title.trim();
        if title.is_empty() {
            return Err(StoreError::missing_field("title"));
        }

        let created = now();
        let scheduled_date = match view_hint {
            Some(View::Today) => Some(today_local()),
            _ => None,
        };

        let task = Task {
            id: Uuid::now_v7().to_string(),
            title: title.to_string(),
            notes: None,
            due_date: None,
            scheduled_date,
            priority: 0,
            completed: false,
            completed_at: None,
            list_id,
            created_at: created,
            updated_at: created,
        };

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO tasks (
                    id, title, notes, due_date, scheduled_date, priority,
                    completed, completed_at, list_id, created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    task.id,
                    task.title,
                    task.notes,
                    task.due_date,
                    task.scheduled_date,
                    task.priority,
                    task.completed,
                    task.completed_at,
                    task.list_id,
                    task.created_at,
                    task.updated_at,
                ],
            )?;
            Ok(())
        })?;

        Ok(task)
    }

    /// Get a task by ID.
    pub fn get_task(&self, task_id: &str) -> StoreResult<Option<Task>> {
        Ok(self.with_conn(|conn| get_task_internal(conn, task_id))?)
    }

    /// Apply a partial update.
    ///
    /// Only allow-listed fields are touched. A field present in the patch
    /// but absent-valued clears the stored value; a field not present is
    /// left alone. `updated_at` is refreshed regardless of which fields
    /// changed, and the completed/completed_at invariant is re-normalized
    /// after the merge.
    pub fn update_task(&self, task_id: &str, patch: &TaskPatch) -> StoreResult<Task> {
        let ts = now();

        let updated = self.with_conn(|conn| {
            let Some(task) = get_task_internal(conn, task_id)? else {
                return Ok(None);
            };

            let title = match &patch.title {
                Some(t) => {
                    let t = t.trim();
                    if t.is_empty() {
                        return Err(StoreError::missing_field("title").into());
                    }
                    t.to_string()
                }
                None => task.title.clone(),
            };
            let notes = patch.notes.clone().unwrap_or_else(|| task.notes.clone());
            let due_date = patch.due_date.unwrap_or(task.due_date);
            let scheduled_date = patch.scheduled_date.unwrap_or(task.scheduled_date);
            let priority = patch.priority.unwrap_or(task.priority);
            let list_id = patch
                .list_id
                .clone()
                .unwrap_or_else(|| task.list_id.clone());
            let completed = patch.completed.unwrap_or(task.completed);
            let completed_at = patch.completed_at.unwrap_or(task.completed_at);

            // completed_at is set iff completed, stamped if the patch left it out
            let completed_at = if completed {
                completed_at.or(Some(ts))
            } else {
                None
            };

            conn.execute(
                "UPDATE tasks SET
                    title = ?1, notes = ?2, due_date = ?3, scheduled_date = ?4,
                    priority = ?5, completed = ?6, completed_at = ?7,
                    list_id = ?8, updated_at = ?9
                 WHERE id = ?10",
                params![
                    title,
                    notes,
                    due_date,
                    scheduled_date,
                    priority,
                    completed,
                    completed_at,
                    list_id,
                    ts,
                    task_id,
                ],
            )?;

            Ok(Some(Task {
                title,
                notes,
                due_date,
                scheduled_date,
                priority,
                completed,
                completed_at,
                list_id,
                updated_at: ts,
                ..task
            }))
        })?;

        updated.ok_or_else(|| StoreError::task_not_found(task_id))
    }

    /// Set the completed flag. Transitioning to completed stamps the
    /// completion time to now; transitioning back clears it.
    pub fn toggle_task(&self, task_id: &str, completed: bool) -> StoreResult<Task> {
        let ts = now();
        let completed_at = completed.then_some(ts);

        let updated = self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE tasks SET completed = ?1, completed_at = ?2, updated_at = ?3
                 WHERE id = ?4",
                params![completed, completed_at, ts, task_id],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            get_task_internal(conn, task_id)
        })?;

        updated.ok_or_else(|| StoreError::task_not_found(task_id))
    }

    /// Delete by ID. Deleting an unknown ID is not an error.
    pub fn delete_task(&self, task_id: &str) -> StoreResult<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM tasks WHERE id = ?1", params![task_id])?;
            Ok(())
        })?;
        Ok(())
    }

    /// List tasks for a view, newest first. `None` means no filter.
    pub fn list_tasks(&self, view: Option<&View>) -> Result<Vec<Task>> {
        let today = today_local();

        self.with_conn(|conn| {
            let mut sql = String::from("SELECT * FROM tasks");
            let mut bind: Vec<String> = Vec::new();

            if let Some(view) = view {
                let (clause, values) = view.filter(today);
                sql.push_str(" WHERE ");
                sql.push_str(&clause);
                bind = values;
            }

            sql.push_str(" ORDER BY created_at DESC");

            let mut stmt = conn.prepare(&sql)?;
            let tasks = stmt
                .query_map(params_from_iter(bind.iter()), parse_task_row)?
                .filter_map(|r| r.ok())
                .collect();

            Ok(tasks)
        })
    }
}
