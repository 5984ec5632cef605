//! SQLite-backed task store.
//!
//! One `tasks` table holds every owner's tasks. Deadlines are stored twice:
//! as RFC 3339 text (round-trips the canonical offset) and as epoch
//! milliseconds, which every time comparison and ordering uses.

use std::path::Path;

use chrono::{DateTime, FixedOffset};
use parking_lot::Mutex;
use roastbot_proto::task::{NewTask, OwnerId, Task, TaskFilter, TaskId};
use rusqlite::{Connection, OptionalExtension, params};

use super::{StoreError, TaskStore};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS tasks (
        id          TEXT PRIMARY KEY,
        owner       TEXT NOT NULL,
        description TEXT NOT NULL,
        deadline    TEXT NOT NULL,
        deadline_ms INTEGER NOT NULL,
        completed   INTEGER NOT NULL DEFAULT 0
    );
    CREATE INDEX IF NOT EXISTS idx_tasks_owner_deadline ON tasks(owner, deadline_ms);
    CREATE INDEX IF NOT EXISTS idx_tasks_completed_deadline ON tasks(completed, deadline_ms);
";

const COLUMNS: &str = "id, owner, description, deadline, completed";

/// Raw row as read from SQLite, before id and deadline parsing.
type RawRow = (String, String, String, String, bool);

/// Persistent [`TaskStore`] on a single SQLite connection.
///
/// The connection sits behind a mutex, which serializes all statements.
/// Each call holds the lock only for the duration of its own statement.
pub struct SqliteTaskStore {
    conn: Mutex<Connection>,
}

impl SqliteTaskStore {
    /// Opens (or creates) the database at `path`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the parent directory cannot be
    /// created, or [`StoreError::Sqlite`] if the database cannot be opened.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::Unavailable(format!("cannot create {}: {e}", parent.display()))
            })?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        Self::with_connection(conn)
    }

    /// Opens a private in-memory database.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlite`] if the schema cannot be created.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn query_tasks(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> Result<Vec<Task>, StoreError> {
        let rows: Vec<RawRow> = {
            let conn = self.conn.lock();
            let mut stmt = conn.prepare_cached(sql)?;
            let mapped = stmt.query_map(params, read_row)?;
            mapped.collect::<Result<_, _>>()?
        };
        rows.into_iter().map(into_task).collect()
    }
}

fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
    ))
}

fn into_task((id, owner, description, deadline, completed): RawRow) -> Result<Task, StoreError> {
    let id = TaskId::parse(&id).map_err(|e| StoreError::Corrupt(e.to_string()))?;
    let deadline = DateTime::parse_from_rfc3339(&deadline)
        .map_err(|e| StoreError::Corrupt(format!("task {id}: bad deadline {deadline:?}: {e}")))?;
    Ok(Task {
        id,
        owner: OwnerId::new(owner),
        description,
        deadline,
        completed,
    })
}

/// SQL predicate on the `completed` column for a filter.
const fn filter_clause(filter: TaskFilter) -> &'static str {
    match filter {
        TaskFilter::All => "1 = 1",
        TaskFilter::Pending => "completed = 0",
        TaskFilter::Completed => "completed = 1",
    }
}

impl TaskStore for SqliteTaskStore {
    async fn insert(&self, task: &NewTask) -> Result<TaskId, StoreError> {
        let id = TaskId::new();
        self.conn.lock().execute(
            "INSERT INTO tasks (id, owner, description, deadline, deadline_ms, completed)
             VALUES (?1, ?2, ?3, ?4, ?5, 0)",
            params![
                id.to_string(),
                task.owner.as_str(),
                task.description,
                task.deadline.to_rfc3339(),
                task.deadline.timestamp_millis(),
            ],
        )?;
        Ok(id)
    }

    async fn find_by_owner_and_description(
        &self,
        owner: &OwnerId,
        description: &str,
        filter: TaskFilter,
    ) -> Result<Option<Task>, StoreError> {
        let sql = format!(
            "SELECT {COLUMNS} FROM tasks
             WHERE owner = ?1 AND description = ?2 AND {}
             ORDER BY deadline_ms ASC, id ASC LIMIT 1",
            filter_clause(filter)
        );
        let row: Option<RawRow> = self
            .conn
            .lock()
            .query_row(&sql, params![owner.as_str(), description], read_row)
            .optional()?;
        row.map(into_task).transpose()
    }

    async fn update_completed(&self, id: &TaskId, completed: bool) -> Result<(), StoreError> {
        let changed = self.conn.lock().execute(
            "UPDATE tasks SET completed = ?1 WHERE id = ?2",
            params![completed, id.to_string()],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(id.clone()));
        }
        Ok(())
    }

    async fn delete(&self, id: &TaskId) -> Result<(), StoreError> {
        let changed = self
            .conn
            .lock()
            .execute("DELETE FROM tasks WHERE id = ?1", params![id.to_string()])?;
        if changed == 0 {
            return Err(StoreError::NotFound(id.clone()));
        }
        Ok(())
    }

    async fn list_by_owner(
        &self,
        owner: &OwnerId,
        filter: TaskFilter,
    ) -> Result<Vec<Task>, StoreError> {
        let sql = format!(
            "SELECT {COLUMNS} FROM tasks WHERE owner = ?1 AND {}
             ORDER BY deadline_ms ASC, id ASC",
            filter_clause(filter)
        );
        self.query_tasks(&sql, params![owner.as_str()])
    }

    async fn list_overdue_incomplete(
        &self,
        now: DateTime<FixedOffset>,
    ) -> Result<Vec<Task>, StoreError> {
        let sql = format!(
            "SELECT {COLUMNS} FROM tasks WHERE completed = 0 AND deadline_ms < ?1
             ORDER BY deadline_ms ASC, id ASC"
        );
        self.query_tasks(&sql, params![now.timestamp_millis()])
    }

    async fn list_upcoming_incomplete(
        &self,
        now: DateTime<FixedOffset>,
    ) -> Result<Vec<Task>, StoreError> {
        let sql = format!(
            "SELECT {COLUMNS} FROM tasks WHERE completed = 0 AND deadline_ms > ?1
             ORDER BY deadline_ms ASC, id ASC"
        );
        self.query_tasks(&sql, params![now.timestamp_millis()])
    }
}
