//! Integration tests for the store layer.
//!
//! These tests verify the gateway operations using an in-memory SQLite
//! database. Tests are organized by operation.

use chrono::Days;
use taskdeck::db::{Database, today_local};
use taskdeck::error::ErrorCode;
use taskdeck::types::TaskPatch;
use taskdeck::views::View;

/// Helper to create a fresh in-memory database for testing.
fn setup_db() -> Database {
    Database::open_in_memory().expect("Failed to create in-memory database")
}

mod create_tests {
    use super::*;

    #[test]
    fn create_task_applies_defaults() {
        let db = setup_db();

        let task = db.create_task("Write report", None, None).unwrap();

        assert_eq!(task.title, "Write report");
        assert_eq!(task.priority, 0);
        assert!(!task.completed);
        assert!(task.completed_at.is_none());
        assert!(task.list_id.is_none());
        assert!(task.due_date.is_none());
        assert!(task.scheduled_date.is_none());
        assert_eq!(task.created_at, task.updated_at);
    }

    #[test]
    fn create_task_stores_trimmed_title() {
        let db = setup_db();

        let task = db.create_task("  Buy milk  ", None, None).unwrap();

        assert_eq!(task.title, "Buy milk");
        let stored = db.get_task(&task.id).unwrap().unwrap();
        assert_eq!(stored.title, "Buy milk");
    }

    #[test]
    fn create_task_rejects_blank_title_and_persists_nothing() {
        let db = setup_db();

        let err = db.create_task("   ", None, None).unwrap_err();

        assert_eq!(err.code, ErrorCode::MissingRequiredField);
        assert!(db.list_tasks(None).unwrap().is_empty());
    }

    #[test]
    fn create_task_with_today_hint_is_scheduled_for_today() {
        let db = setup_db();

        let task = db
            .create_task("Morning run", None, Some(&View::Today))
            .unwrap();

        assert_eq!(task.scheduled_date, Some(today_local()));
    }

    #[test]
    fn create_task_with_other_hints_leaves_schedule_absent() {
        let db = setup_db();

        let week = db.create_task("a", None, Some(&View::Week)).unwrap();
        let inbox = db.create_task("b", None, Some(&View::Inbox)).unwrap();

        assert!(week.scheduled_date.is_none());
        assert!(inbox.scheduled_date.is_none());
    }

    #[test]
    fn create_task_keeps_list_reference() {
        let db = setup_db();
        let list = db.create_list("Groceries", None).unwrap();

        let task = db
            .create_task("Buy milk", Some(list.id.clone()), None)
            .unwrap();

        assert_eq!(task.list_id, Some(list.id));
    }
}

mod update_tests {
    use super::*;

    #[test]
    fn present_absent_field_clears_stored_value() {
        let db = setup_db();
        let task = db.create_task("With notes", None, None).unwrap();
        db.update_task(
            &task.id,
            &TaskPatch {
                notes: Some(Some("remember the deadline".to_string())),
                ..TaskPatch::default()
            },
        )
        .unwrap();

        let cleared = db
            .update_task(
                &task.id,
                &TaskPatch {
                    notes: Some(None),
                    ..TaskPatch::default()
                },
            )
            .unwrap();

        assert_eq!(cleared.notes, None);
        assert_eq!(db.get_task(&task.id).unwrap().unwrap().notes, None);
    }

    #[test]
    fn omitted_field_is_left_untouched() {
        let db = setup_db();
        let task = db.create_task("With notes", None, None).unwrap();
        db.update_task(
            &task.id,
            &TaskPatch {
                notes: Some(Some("keep me".to_string())),
                ..TaskPatch::default()
            },
        )
        .unwrap();

        let updated = db
            .update_task(
                &task.id,
                &TaskPatch {
                    priority: Some(2),
                    ..TaskPatch::default()
                },
            )
            .unwrap();

        assert_eq!(updated.notes, Some("keep me".to_string()));
        assert_eq!(updated.priority, 2);
    }

    #[test]
    fn empty_patch_still_refreshes_updated_at() {
        let db = setup_db();
        let task = db.create_task("x", None, None).unwrap();

        std::thread::sleep(std::time::Duration::from_millis(10));
        let updated = db.update_task(&task.id, &TaskPatch::default()).unwrap();

        assert!(updated.updated_at > task.updated_at);
        assert_eq!(updated.created_at, task.created_at);
    }

    #[test]
    fn update_unknown_id_is_not_found() {
        let db = setup_db();

        let err = db
            .update_task("no-such-task", &TaskPatch::default())
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::TaskNotFound);
    }

    #[test]
    fn update_rejects_blank_title() {
        let db = setup_db();
        let task = db.create_task("valid", None, None).unwrap();

        let err = db
            .update_task(
                &task.id,
                &TaskPatch {
                    title: Some("   ".to_string()),
                    ..TaskPatch::default()
                },
            )
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::MissingRequiredField);
        assert_eq!(db.get_task(&task.id).unwrap().unwrap().title, "valid");
    }

    #[test]
    fn completing_via_update_stamps_completion_time() {
        let db = setup_db();
        let task = db.create_task("x", None, None).unwrap();

        let updated = db
            .update_task(
                &task.id,
                &TaskPatch {
                    completed: Some(true),
                    ..TaskPatch::default()
                },
            )
            .unwrap();

        assert!(updated.completed);
        assert!(updated.completed_at.is_some());
    }

    #[test]
    fn reopening_via_update_clears_completion_time_even_if_patched() {
        let db = setup_db();
        let task = db.create_task("x", None, None).unwrap();
        db.toggle_task(&task.id, true).unwrap();

        // A patch that claims not-completed but carries a stamp: the
        // invariant wins.
        let updated = db
            .update_task(
                &task.id,
                &TaskPatch {
                    completed: Some(false),
                    completed_at: Some(Some(taskdeck::db::now())),
                    ..TaskPatch::default()
                },
            )
            .unwrap();

        assert!(!updated.completed);
        assert_eq!(updated.completed_at, None);
    }

    #[test]
    fn moving_task_between_lists_and_back_to_inbox() {
        let db = setup_db();
        let list = db.create_list("Errands", None).unwrap();
        let task = db.create_task("x", None, None).unwrap();

        let moved = db
            .update_task(
                &task.id,
                &TaskPatch {
                    list_id: Some(Some(list.id.clone())),
                    ..TaskPatch::default()
                },
            )
            .unwrap();
        assert_eq!(moved.list_id, Some(list.id));

        let back = db
            .update_task(
                &task.id,
                &TaskPatch {
                    list_id: Some(None),
                    ..TaskPatch::default()
                },
            )
            .unwrap();
        assert_eq!(back.list_id, None);
    }
}

mod toggle_tests {
    use super::*;

    #[test]
    fn completed_at_present_iff_completed() {
        let db = setup_db();
        let task = db.create_task("x", None, None).unwrap();

        let done = db.toggle_task(&task.id, true).unwrap();
        assert!(done.completed);
        assert!(done.completed_at.is_some());

        let reopened = db.toggle_task(&task.id, false).unwrap();
        assert!(!reopened.completed);
        assert_eq!(reopened.completed_at, None);
    }

    #[test]
    fn toggle_refreshes_updated_at() {
        let db = setup_db();
        let task = db.create_task("x", None, None).unwrap();

        std::thread::sleep(std::time::Duration::from_millis(10));
        let done = db.toggle_task(&task.id, true).unwrap();

        assert!(done.updated_at > task.updated_at);
    }

    #[test]
    fn toggle_unknown_id_is_not_found() {
        let db = setup_db();

        let err = db.toggle_task("no-such-task", true).unwrap_err();

        assert_eq!(err.code, ErrorCode::TaskNotFound);
    }
}

mod delete_tests {
    use super::*;

    #[test]
    fn delete_removes_the_row() {
        let db = setup_db();
        let task = db.create_task("x", None, None).unwrap();

        db.delete_task(&task.id).unwrap();

        assert!(db.get_task(&task.id).unwrap().is_none());
    }

    #[test]
    fn delete_is_idempotent() {
        let db = setup_db();
        let task = db.create_task("x", None, None).unwrap();

        db.delete_task(&task.id).unwrap();
        // Second delete of the same id, and a delete of a never-existing
        // id, both succeed.
        db.delete_task(&task.id).unwrap();
        db.delete_task("never-existed").unwrap();
    }
}

mod view_tests {
    use super::*;

    fn set_due(db: &Database, id: &str, date: chrono::NaiveDate) {
        db.update_task(
            id,
            &TaskPatch {
                due_date: Some(Some(date)),
                ..TaskPatch::default()
            },
        )
        .unwrap();
    }

    fn set_scheduled(db: &Database, id: &str, date: chrono::NaiveDate) {
        db.update_task(
            id,
            &TaskPatch {
                scheduled_date: Some(Some(date)),
                ..TaskPatch::default()
            },
        )
        .unwrap();
    }

    #[test]
    fn today_includes_scheduled_due_and_overdue_open() {
        let db = setup_db();
        let today = today_local();
        let yesterday = today.checked_sub_days(Days::new(1)).unwrap();
        let tomorrow = today.checked_add_days(Days::new(1)).unwrap();

        let scheduled = db.create_task("scheduled today", None, None).unwrap();
        set_scheduled(&db, &scheduled.id, today);

        let due = db.create_task("due today", None, None).unwrap();
        set_due(&db, &due.id, today);

        let overdue_open = db.create_task("overdue open", None, None).unwrap();
        set_due(&db, &overdue_open.id, yesterday);

        let overdue_done = db.create_task("overdue done", None, None).unwrap();
        set_due(&db, &overdue_done.id, yesterday);
        db.toggle_task(&overdue_done.id, true).unwrap();

        let future = db.create_task("due tomorrow", None, None).unwrap();
        set_due(&db, &future.id, tomorrow);

        let unscheduled = db.create_task("floating", None, None).unwrap();

        let ids: Vec<String> = db
            .list_tasks(Some(&View::Today))
            .unwrap()
            .into_iter()
            .map(|t| t.id)
            .collect();

        assert!(ids.contains(&scheduled.id));
        assert!(ids.contains(&due.id));
        assert!(ids.contains(&overdue_open.id));
        assert!(!ids.contains(&overdue_done.id));
        assert!(!ids.contains(&future.id));
        assert!(!ids.contains(&unscheduled.id));
    }

    #[test]
    fn week_range_is_inclusive_at_day_seven() {
        let db = setup_db();
        let today = today_local();

        let day_zero = db.create_task("today", None, None).unwrap();
        set_scheduled(&db, &day_zero.id, today);

        let day_seven = db.create_task("boundary", None, None).unwrap();
        set_scheduled(&db, &day_seven.id, today.checked_add_days(Days::new(7)).unwrap());

        let day_eight = db.create_task("past boundary", None, None).unwrap();
        set_scheduled(&db, &day_eight.id, today.checked_add_days(Days::new(8)).unwrap());

        let ids: Vec<String> = db
            .list_tasks(Some(&View::Week))
            .unwrap()
            .into_iter()
            .map(|t| t.id)
            .collect();

        assert!(ids.contains(&day_zero.id));
        assert!(ids.contains(&day_seven.id));
        assert!(!ids.contains(&day_eight.id));
    }

    #[test]
    fn inbox_holds_only_listless_tasks() {
        let db = setup_db();
        let list = db.create_list("Work", None).unwrap();

        let floating = db.create_task("floating", None, None).unwrap();
        let filed = db.create_task("filed", Some(list.id.clone()), None).unwrap();

        let ids: Vec<String> = db
            .list_tasks(Some(&View::Inbox))
            .unwrap()
            .into_iter()
            .map(|t| t.id)
            .collect();

        assert!(ids.contains(&floating.id));
        assert!(!ids.contains(&filed.id));
    }

    #[test]
    fn list_view_matches_exact_list_id() {
        let db = setup_db();
        let groceries = db.create_list("Groceries", None).unwrap();
        let work = db.create_list("Work", None).unwrap();

        let milk = db
            .create_task("milk", Some(groceries.id.clone()), None)
            .unwrap();
        let report = db.create_task("report", Some(work.id.clone()), None).unwrap();

        let tasks = db
            .list_tasks(Some(&View::ByList(groceries.id.clone())))
            .unwrap();

        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].id, milk.id);
        assert_ne!(tasks[0].id, report.id);
    }

    #[test]
    fn no_selector_returns_everything_newest_first() {
        let db = setup_db();

        let first = db.create_task("first", None, None).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));
        let second = db.create_task("second", None, None).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));
        let third = db.create_task("third", None, None).unwrap();

        let ids: Vec<String> = db
            .list_tasks(None)
            .unwrap()
            .into_iter()
            .map(|t| t.id)
            .collect();

        assert_eq!(ids, vec![third.id, second.id, first.id]);
    }

    #[test]
    fn created_task_appears_in_inbox_exactly_once() {
        let db = setup_db();

        let task = db.create_task("X", None, None).unwrap();

        let matches: Vec<_> = db
            .list_tasks(Some(&View::Inbox))
            .unwrap()
            .into_iter()
            .filter(|t| t.id == task.id)
            .collect();

        assert_eq!(matches.len(), 1);
    }
}

mod list_tests {
    use super::*;

    #[test]
    fn lists_come_back_oldest_first() {
        let db = setup_db();

        let a = db.create_list("A", None).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));
        let b = db.create_list("B", Some("#ff0000".to_string())).unwrap();

        let lists = db.list_lists().unwrap();

        assert_eq!(lists.len(), 2);
        assert_eq!(lists[0].id, a.id);
        assert_eq!(lists[1].id, b.id);
        assert_eq!(lists[1].color, Some("#ff0000".to_string()));
    }

    #[test]
    fn blank_list_name_is_rejected() {
        let db = setup_db();

        let err = db.create_list("  ", None).unwrap_err();

        assert_eq!(err.code, ErrorCode::MissingRequiredField);
        assert!(db.list_lists().unwrap().is_empty());
    }

    #[test]
    fn deleting_a_list_moves_its_tasks_to_the_inbox() {
        let db = setup_db();
        let list = db.create_list("Doomed", None).unwrap();
        let task = db
            .create_task("survivor", Some(list.id.clone()), None)
            .unwrap();

        db.delete_list(&list.id).unwrap();

        assert!(db.list_lists().unwrap().is_empty());
        let survivor = db.get_task(&task.id).unwrap().unwrap();
        assert_eq!(survivor.list_id, None);

        let inbox_ids: Vec<String> = db
            .list_tasks(Some(&View::Inbox))
            .unwrap()
            .into_iter()
            .map(|t| t.id)
            .collect();
        assert!(inbox_ids.contains(&task.id));
    }

    #[test]
    fn deleting_an_unknown_list_is_not_an_error() {
        let db = setup_db();

        db.delete_list("never-existed").unwrap();
    }
}

mod persistence_tests {
    use super::*;

    #[test]
    fn data_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.db");

        {
            let db = Database::open(&path).unwrap();
            db.create_task("durable", None, None).unwrap();
            db.close().unwrap();
        }

        let db = Database::open(&path).unwrap();
        let tasks = db.list_tasks(None).unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].title, "durable");
    }
}
