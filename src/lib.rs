// tasktrack - Task records with label associations on SQLite

pub mod config;
pub mod error;
pub mod labels;
pub mod models;
pub mod storage;
pub mod store;

// Re-export main types for convenience
pub use error::{StoreError, StoreResult};
pub use labels::difference;
pub use models::{LabelId, Task, TaskId, UserId, now_secs};
pub use storage::TaskStorage;
pub use store::Store;

// Re-export rusqlite for callers that need raw access through Store::db
pub use rusqlite;
