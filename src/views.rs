//! View selectors and their SQL filter predicates.
//!
//! The active view determines which tasks are shown: the date-based views,
//! the inbox, or a custom list. Each variant builds one SQL predicate plus
//! its ordered parameter values; the date views take "today" from the
//! caller so it is computed exactly once per query, in local time.

use chrono::{Days, NaiveDate};
use std::fmt;

/// The active filter determining which tasks are shown.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum View {
    /// Tasks scheduled or due today, plus overdue tasks still open.
    Today,
    /// Tasks scheduled within the next 7 calendar days, inclusive.
    Week,
    /// Tasks with no owning list.
    Inbox,
    /// Tasks belonging to one specific list.
    ByList(String),
}

impl View {
    /// Parse a selector token. The three reserved tokens map to the named
    /// views; anything else is treated as a list identifier.
    pub fn parse(token: &str) -> View {
        match token {
            "today" => View::Today,
            "week" => View::Week,
            "inbox" => View::Inbox,
            other => View::ByList(other.to_string()),
        }
    }

    /// The selector token this view round-trips through.
    pub fn token(&self) -> &str {
        match self {
            View::Today => "today",
            View::Week => "week",
            View::Inbox => "inbox",
            View::ByList(id) => id,
        }
    }

    /// Build the SQL predicate and its ordered parameters.
    ///
    /// `today` must be the current calendar date in the caller's local
    /// timezone. Dates are compared as ISO `YYYY-MM-DD` strings.
    pub fn filter(&self, today: NaiveDate) -> (String, Vec<String>) {
        match self {
            View::Today => (
                "(scheduled_date = ?1 OR due_date = ?1 \
                 OR (due_date < ?1 AND completed = 0))"
                    .to_string(),
                vec![today.to_string()],
            ),
            View::Week => {
                let end = today.checked_add_days(Days::new(7)).unwrap_or(today);
                (
                    "(scheduled_date >= ?1 AND scheduled_date <= ?2)".to_string(),
                    vec![today.to_string(), end.to_string()],
                )
            }
            View::Inbox => ("list_id IS NULL".to_string(), Vec::new()),
            View::ByList(id) => ("list_id = ?1".to_string(), vec![id.clone()]),
        }
    }

    /// Stable key for change-feed subscriptions.
    pub fn feed_key(&self) -> &'static str {
        match self {
            View::Today => "tasks://today",
            View::Week => "tasks://week",
            View::Inbox => "tasks://inbox",
            View::ByList(_) => "tasks://list",
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.token())
    }
}
