use crate::errors::{LedgerError, Result};
use crate::model::RowCounts;
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

/// Handle to the results database.
#[derive(Clone)]
pub struct Store {
    pub conn: Arc<Mutex<Connection>>,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::init_connection(&conn)?;
        debug!("opened results store at {}", path.display());
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_connection(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn init_connection(conn: &Connection) -> Result<()> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        // WAL for file-backed DBs; in-memory DBs report "memory" and that is fine.
        let _ = conn.query_row("PRAGMA journal_mode = WAL", [], |r| r.get::<_, String>(0));
        Ok(())
    }

    pub fn init_schema(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.execute_batch(crate::storage::schema::DDL)?;
        Ok(())
    }

    pub(crate) fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| LedgerError::Database("store lock poisoned".into()))
    }

    /// Runs `f` inside `BEGIN IMMEDIATE`; commits on `Ok`, rolls back on `Err`.
    pub(crate) fn write_txn<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let conn = self.lock()?;
        conn.execute("BEGIN IMMEDIATE", [])?;
        let result = f(&conn);
        match &result {
            Ok(_) => {
                conn.execute("COMMIT", [])?;
            }
            Err(_) => {
                let _ = conn.execute("ROLLBACK", []);
            }
        }
        result
    }

    pub fn row_counts(&self) -> Result<RowCounts> {
        let conn = self.lock()?;
        let count = |table: &str| -> Result<i64> {
            let sql = format!("SELECT COUNT(*) FROM {}", table);
            Ok(conn.query_row(&sql, [], |r| r.get(0))?)
        };
        Ok(RowCounts {
            tests: count("tests")?,
            test_groups: count("test_groups")?,
            suites: count("suites")?,
            test_results: count("test_results")?,
        })
    }

    /// Latest `run_date` present in `test_results`, if any.
    pub fn max_run_date(&self) -> Result<Option<String>> {
        let conn = self.lock()?;
        let max: Option<String> =
            conn.query_row("SELECT MAX(run_date) FROM test_results", [], |r| r.get(0))?;
        Ok(max)
    }
}
