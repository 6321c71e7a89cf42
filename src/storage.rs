// Storage contract for task persistence

use crate::error::StoreResult;
use crate::models::{LabelId, Task, TaskId, UserId};

/// Operations every task backend provides
///
/// [`Store`](crate::Store) is the SQLite implementation. Callers that only
/// need CRUD can hold a `&mut dyn TaskStorage` instead of the concrete store.
pub trait TaskStorage {
    /// Creates a task with its labels and returns the assigned id.
    fn create_task(&mut self, task: &Task) -> StoreResult<TaskId>;
    /// Gets one task by id; `NotFound` if absent.
    fn task(&self, id: TaskId) -> StoreResult<Task>;
    /// Lists every task ordered by id.
    fn tasks(&self) -> StoreResult<Vec<Task>>;
    /// Lists tasks by author, ordered by id.
    fn tasks_by_author(&self, author_id: UserId) -> StoreResult<Vec<Task>>;
    /// Lists tasks carrying a label, ordered by id.
    fn tasks_by_label(&self, label_id: LabelId) -> StoreResult<Vec<Task>>;
    /// Writes every mutable field and reconciles the label set.
    fn update_task(&mut self, task: &Task) -> StoreResult<()>;
    /// Removes a task and its label associations.
    fn delete_task(&mut self, id: TaskId) -> StoreResult<()>;
}
