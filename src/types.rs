//! Core domain types for the task manager.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// A task. Optional fields use `None` for "absent"; a NULL in storage
/// never leaks past the row mapper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub notes: Option<String>,
    /// Calendar date the task is due, no time component.
    pub due_date: Option<NaiveDate>,
    /// Calendar date the task is planned for.
    pub scheduled_date: Option<NaiveDate>,
    /// 0 = none, higher = more urgent.
    pub priority: i32,
    pub completed: bool,
    /// Set iff `completed` is true; every write path keeps this in sync.
    pub completed_at: Option<DateTime<Utc>>,
    /// Owning list; `None` means the task lives in the inbox.
    pub list_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A user-defined list grouping tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct List {
    pub id: String,
    pub name: String,
    pub color: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Partial update for a task, restricted to the mutable field allow-list.
///
/// The outer `Option` carries field *presence*, the inner one the stored
/// value: `None` leaves the field untouched, `Some(None)` clears it,
/// `Some(Some(v))` writes `v`. In JSON, an omitted key is `None` and an
/// explicit `null` is `Some(None)`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present"
    )]
    pub notes: Option<Option<String>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present"
    )]
    pub due_date: Option<Option<NaiveDate>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present"
    )]
    pub scheduled_date: Option<Option<NaiveDate>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present"
    )]
    pub list_id: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present"
    )]
    pub completed_at: Option<Option<DateTime<Utc>>>,
}

/// Deserialize a field that was present in the input, keeping `null` as an
/// explicit clear. Combined with `#[serde(default)]`, absence stays `None`.
fn present<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

impl TaskPatch {
    /// True when no field is present at all.
    pub fn is_empty(&self) -> bool {
        self == &TaskPatch::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn omitted_field_stays_absent() {
        let patch: TaskPatch = serde_json::from_str(r#"{"title": "x"}"#).unwrap();
        assert_eq!(patch.title, Some("x".to_string()));
        assert_eq!(patch.notes, None);
    }

    #[test]
    fn explicit_null_clears() {
        let patch: TaskPatch = serde_json::from_str(r#"{"notes": null}"#).unwrap();
        assert_eq!(patch.notes, Some(None));
    }

    #[test]
    fn explicit_value_sets() {
        let patch: TaskPatch = serde_json::from_str(r#"{"notes": "remember"}"#).unwrap();
        assert_eq!(patch.notes, Some(Some("remember".to_string())));
    }

    #[test]
    fn empty_patch_is_empty() {
        let patch: TaskPatch = serde_json::from_str("{}").unwrap();
        assert!(patch.is_empty());
    }
}
