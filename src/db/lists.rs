//! List table operations.

use super::{Database, now};
use crate::error::{StoreError, StoreResult};
use crate::types::List;
use anyhow::Result;
use rusqlite::{Row, params};
use uuid::Uuid;

/// Map a raw row to a `List`.
pub fn parse_list_row(row: &Row) -> rusqlite::Result<List> {
    Ok(List {
        id: row.get("id")?,
        name: row.get("name")?,
        color: row.get("color")?,
        created_at: row.get("created_at")?,
    })
}

impl Database {
    /// Create a list. The name is stored trimmed; blank names are rejected.
    pub fn create_list(&self, name: &str, color: Option<String>) -> StoreResult<List> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StoreError::missing_field("name"));
        }

        let list = List {
            id: Uuid::now_v7().to_string(),
            name: name.to_string(),
            color,
            created_at: now(),
        };

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO lists (id, name, color, created_at) VALUES (?1, ?2, ?3, ?4)",
                params![list.id, list.name, list.color, list.created_at],
            )?;
            Ok(())
        })?;

        Ok(list)
    }

    /// All lists, oldest first (sidebar order).
    pub fn list_lists(&self) -> Result<Vec<List>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT * FROM lists ORDER BY created_at ASC")?;
            let lists = stmt
                .query_map([], parse_list_row)?
                .filter_map(|r| r.ok())
                .collect();
            Ok(lists)
        })
    }

    /// Delete a list. Member tasks drop their list reference and move back
    /// to the inbox; deleting an unknown ID is not an error.
    pub fn delete_list(&self, list_id: &str) -> StoreResult<()> {
        let ts = now();

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            tx.execute(
                "UPDATE tasks SET list_id = NULL, updated_at = ?1 WHERE list_id = ?2",
                params![ts, list_id],
            )?;
            tx.execute("DELETE FROM lists WHERE id = ?1", params![list_id])?;

            tx.commit()?;
            Ok(())
        })?;

        Ok(())
    }
}
