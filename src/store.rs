// Task store on SQLite with transactional label reconciliation

use crate::error::{StoreError, StoreResult};
use crate::labels::{dedup_labels, difference};
use crate::models::{LabelId, Task, TaskId, UserId};
use crate::storage::TaskStorage;
use rusqlite::types::Value;
use rusqlite::vtab::array::{self, Array};
use rusqlite::{Connection, OptionalExtension, Params, Row, Transaction};
use std::rc::Rc;
use tracing::{debug, info, warn};

const TASK_COLUMNS: &str = "id, opened, closed, author_id, assigned_id, title, content";

/// Persistent task store backed by a single SQLite connection
pub struct Store {
    db: Connection,
}

impl Store {
    /// Open the database named by `conn_str` and bootstrap the schema
    ///
    /// `conn_str` is a filesystem path, `:memory:`, or a `file:` URI.
    pub fn open(conn_str: &str) -> StoreResult<Self> {
        info!(database = conn_str, "Opening task store");

        let connect = |source: rusqlite::Error| StoreError::Connection {
            target: conn_str.to_string(),
            source,
        };

        let db = Connection::open(conn_str).map_err(connect)?;
        let store = Self { db };
        store.bootstrap().map_err(connect)?;

        Ok(store)
    }

    /// Open a private in-memory store
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::open(":memory:")
    }

    /// Get a reference to the SQLite database connection
    pub fn db(&self) -> &Connection {
        &self.db
    }

    fn bootstrap(&self) -> rusqlite::Result<()> {
        self.db.execute_batch("PRAGMA foreign_keys = ON;")?;
        array::load_module(&self.db)?;
        self.create_schema()
    }

    /// Create database schema
    fn create_schema(&self) -> rusqlite::Result<()> {
        debug!("Creating database schema");

        self.db.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS tasks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                opened INTEGER NOT NULL DEFAULT (CAST(strftime('%s', 'now') AS INTEGER)),
                closed INTEGER NOT NULL DEFAULT 0,
                author_id INTEGER NOT NULL DEFAULT 0,
                assigned_id INTEGER NOT NULL DEFAULT 0,
                title TEXT NOT NULL,
                content TEXT NOT NULL
            );

            -- Label associations; rows must go before their task
            CREATE TABLE IF NOT EXISTS tasks_labels (
                task_id INTEGER NOT NULL REFERENCES tasks(id),
                label_id INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_tasks_author ON tasks(author_id);
            CREATE INDEX IF NOT EXISTS idx_tasks_labels_task ON tasks_labels(task_id);
            CREATE INDEX IF NOT EXISTS idx_tasks_labels_label ON tasks_labels(label_id);
            "#,
        )
    }

    // ========================================================================
    // Writes
    // ========================================================================

    /// Create a task and its label associations, returning the new id
    ///
    /// `id`, `opened` and `closed` on the input are ignored. Nothing is
    /// persisted unless every association insert succeeds.
    pub fn create_task(&mut self, task: &Task) -> StoreResult<TaskId> {
        let labels = dedup_labels(task.label_ids.iter().copied());
        debug!(author_id = task.author_id, label_count = labels.len(), "create_task: called");

        let id = self.in_transaction("create_task", |tx| {
            tx.execute(
                "INSERT INTO tasks (author_id, assigned_id, title, content)
                 VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![task.author_id, task.assigned_id, task.title, task.content],
            )?;
            let id = tx.last_insert_rowid();

            for &label_id in &labels {
                insert_label(tx, id, label_id)?;
            }

            Ok(id)
        })?;

        info!(task_id = id, "Created task");
        Ok(id)
    }

    /// Update a task's mutable fields and reconcile its label set
    ///
    /// The task is expected to come from a prior fetch: every field is
    /// written, there is no partial update. Labels are reconciled by set
    /// difference against what is persisted, inside the same transaction.
    ///
    /// Returns `NotFound` when no row has `task.id`, whatever the label set,
    /// and writes nothing.
    pub fn update_task(&mut self, task: &Task) -> StoreResult<()> {
        debug!(task_id = task.id, "update_task: called");

        let (added, removed) = self.in_transaction("update_task", |tx| {
            let changed = tx.execute(
                "UPDATE tasks
                 SET closed = ?1,
                     author_id = ?2,
                     assigned_id = ?3,
                     title = ?4,
                     content = ?5
                 WHERE id = ?6",
                rusqlite::params![
                    task.closed,
                    task.author_id,
                    task.assigned_id,
                    task.title,
                    task.content,
                    task.id
                ],
            )?;
            if changed == 0 {
                return Err(StoreError::NotFound(task.id));
            }

            let current = labels_for(tx, task.id)?;
            let to_add = difference(task.label_ids.iter().copied(), current.iter().copied());
            let to_remove = difference(current.iter().copied(), task.label_ids.iter().copied());

            for &label_id in &to_add {
                insert_label(tx, task.id, label_id)?;
            }
            for &label_id in &to_remove {
                debug!(task_id = task.id, label_id, "update_task: removing label");
                tx.execute(
                    "DELETE FROM tasks_labels WHERE task_id = ?1 AND label_id = ?2",
                    rusqlite::params![task.id, label_id],
                )?;
            }

            Ok((to_add.len(), to_remove.len()))
        })?;

        info!(task_id = task.id, added, removed, "Updated task");
        Ok(())
    }

    /// Delete a task and all of its label associations
    ///
    /// Deleting an unknown id is a no-op.
    pub fn delete_task(&mut self, id: TaskId) -> StoreResult<()> {
        debug!(task_id = id, "delete_task: called");

        let removed = self.in_transaction("delete_task", |tx| {
            tx.execute("DELETE FROM tasks_labels WHERE task_id = ?1", [id])?;
            Ok(tx.execute("DELETE FROM tasks WHERE id = ?1", [id])?)
        })?;

        if removed == 0 {
            debug!(task_id = id, "delete_task: no matching row");
        } else {
            info!(task_id = id, "Deleted task");
        }
        Ok(())
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Get a task by id, with its current label set
    pub fn task(&self, id: TaskId) -> StoreResult<Task> {
        let sql = format!("SELECT {} FROM tasks WHERE id = ?1", TASK_COLUMNS);
        let task = self.db.query_row(&sql, [id], task_from_row).optional()?;

        match task {
            Some(mut task) => {
                task.label_ids = labels_for(&self.db, id)?;
                Ok(task)
            }
            None => Err(StoreError::NotFound(id)),
        }
    }

    /// List every task ordered by id
    pub fn tasks(&self) -> StoreResult<Vec<Task>> {
        let sql = format!("SELECT {} FROM tasks ORDER BY id", TASK_COLUMNS);
        self.load_tasks(&sql, [])
    }

    /// List tasks created by `author_id`, ordered by id
    ///
    /// The author id is not checked against any user table.
    pub fn tasks_by_author(&self, author_id: UserId) -> StoreResult<Vec<Task>> {
        let sql = format!("SELECT {} FROM tasks WHERE author_id = ?1 ORDER BY id", TASK_COLUMNS);
        self.load_tasks(&sql, [author_id])
    }

    /// List tasks carrying `label_id`, ordered by id
    pub fn tasks_by_label(&self, label_id: LabelId) -> StoreResult<Vec<Task>> {
        let task_ids: Vec<TaskId> = {
            let mut stmt = self
                .db
                .prepare("SELECT DISTINCT task_id FROM tasks_labels WHERE label_id = ?1")?;
            stmt.query_map([label_id], |row| row.get(0))?
                .collect::<rusqlite::Result<_>>()?
        };

        // rarray() with nothing in it would still be a valid query, but there
        // is nothing to fetch
        if task_ids.is_empty() {
            debug!(label_id, "tasks_by_label: no associations");
            return Ok(Vec::new());
        }

        let ids: Array = Rc::new(task_ids.into_iter().map(Value::from).collect());
        let sql = format!("SELECT {} FROM tasks WHERE id IN rarray(?1) ORDER BY id", TASK_COLUMNS);
        self.load_tasks(&sql, [ids])
    }

    /// Label ids associated with a task, ascending
    ///
    /// An unknown task id yields an empty list.
    pub fn labels_for_task(&self, id: TaskId) -> StoreResult<Vec<LabelId>> {
        Ok(labels_for(&self.db, id)?)
    }

    // ========================================================================
    // Helper methods
    // ========================================================================

    fn load_tasks<P: Params>(&self, sql: &str, params: P) -> StoreResult<Vec<Task>> {
        let mut stmt = self.db.prepare(sql)?;
        let mut tasks = stmt
            .query_map(params, task_from_row)?
            .collect::<rusqlite::Result<Vec<Task>>>()?;

        for task in &mut tasks {
            task.label_ids = labels_for(&self.db, task.id)?;
        }

        debug!(count = tasks.len(), "load_tasks: loaded");
        Ok(tasks)
    }

    /// Run `f` inside a transaction, committing on success
    ///
    /// On failure the transaction is rolled back explicitly and the original
    /// error is returned; a rollback failure is only logged.
    fn in_transaction<T, F>(&mut self, op: &'static str, f: F) -> StoreResult<T>
    where
        F: FnOnce(&Transaction<'_>) -> StoreResult<T>,
    {
        let tx = self.db.transaction().map_err(StoreError::Transaction)?;

        match f(&tx) {
            Ok(value) => {
                tx.commit().map_err(StoreError::Transaction)?;
                Ok(value)
            }
            Err(err) => {
                debug!(op, error = %err, "Rolling back");
                if let Err(rollback_err) = tx.rollback() {
                    warn!(op, error = %rollback_err, "Rollback failed");
                }
                Err(err)
            }
        }
    }
}

impl TaskStorage for Store {
    fn create_task(&mut self, task: &Task) -> StoreResult<TaskId> {
        Store::create_task(self, task)
    }

    fn task(&self, id: TaskId) -> StoreResult<Task> {
        Store::task(self, id)
    }

    fn tasks(&self) -> StoreResult<Vec<Task>> {
        Store::tasks(self)
    }

    fn tasks_by_author(&self, author_id: UserId) -> StoreResult<Vec<Task>> {
        Store::tasks_by_author(self, author_id)
    }

    fn tasks_by_label(&self, label_id: LabelId) -> StoreResult<Vec<Task>> {
        Store::tasks_by_label(self, label_id)
    }

    fn update_task(&mut self, task: &Task) -> StoreResult<()> {
        Store::update_task(self, task)
    }

    fn delete_task(&mut self, id: TaskId) -> StoreResult<()> {
        Store::delete_task(self, id)
    }
}

fn task_from_row(row: &Row<'_>) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get(0)?,
        opened: row.get(1)?,
        closed: row.get(2)?,
        author_id: row.get(3)?,
        assigned_id: row.get(4)?,
        title: row.get(5)?,
        content: row.get(6)?,
        label_ids: Vec::new(),
    })
}

fn labels_for(conn: &Connection, task_id: TaskId) -> rusqlite::Result<Vec<LabelId>> {
    let mut stmt =
        conn.prepare("SELECT DISTINCT label_id FROM tasks_labels WHERE task_id = ?1 ORDER BY label_id")?;
    stmt.query_map([task_id], |row| row.get(0))?.collect()
}

fn insert_label(conn: &Connection, task_id: TaskId, label_id: LabelId) -> rusqlite::Result<()> {
    debug!(task_id, label_id, "insert_label: inserting");
    conn.execute(
        "INSERT INTO tasks_labels (task_id, label_id) VALUES (?1, ?2)",
        rusqlite::params![task_id, label_id],
    )?;
    Ok(())
}
