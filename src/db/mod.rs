//! Database layer for the task manager.

pub mod lists;
pub mod tasks;

use anyhow::Result;
use chrono::{DateTime, Local, NaiveDate, Utc};
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Database handle wrapping a SQLite connection.
///
/// Constructed once at startup and handed to the gateways; each operation
/// takes the lock for its scope, so the connection is acquired and released
/// unconditionally per call.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create the database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;

        // Enable WAL mode for concurrent access
        conn.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA foreign_keys=ON;
             PRAGMA busy_timeout=5000;",
        )?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.run_migrations()?;

        Ok(db)
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;

        conn.execute_batch("PRAGMA foreign_keys=ON;")?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.run_migrations()?;

        Ok(db)
    }

    /// Run database migrations.
    fn run_migrations(&self) -> Result<()> {
        let mut conn = self.conn.lock().unwrap();
        embedded::migrations::runner().run(&mut *conn)?;
        Ok(())
    }

    /// Execute a function with exclusive access to the connection.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.conn.lock().unwrap();
        f(&conn)
    }

    /// Execute a function with mutable access to the connection (for transactions).
    pub fn with_conn_mut<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T>,
    {
        let mut conn = self.conn.lock().unwrap();
        f(&mut conn)
    }

    /// Close the underlying connection. Only the last live handle actually
    /// closes; earlier calls are a no-op and the connection closes on drop.
    pub fn close(self) -> Result<()> {
        if let Ok(mutex) = Arc::try_unwrap(self.conn) {
            let conn = mutex.into_inner().unwrap();
            conn.close().map_err(|(_, e)| anyhow::Error::from(e))?;
        }
        Ok(())
    }
}

/// Current instant in UTC. Persisted as RFC 3339 text, so lexicographic
/// order in the store matches chronological order.
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Current calendar date in the local timezone, for the date-based views.
pub fn today_local() -> NaiveDate {
    Local::now().date_naive()
}
