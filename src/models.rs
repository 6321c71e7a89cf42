// Data models for tasktrack

use serde::{Deserialize, Serialize};

/// Store-assigned task identifier
pub type TaskId = i64;

/// Label identifier, owned by a collaborator table
pub type LabelId = i64;

/// User identifier for authors and assignees
pub type UserId = i64;

/// A tracked unit of work
///
/// `id` and `opened` are assigned by the store on creation and ignored on
/// write. `closed == 0` means the task is still open.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub opened: i64,
    pub closed: i64,
    pub author_id: UserId,
    pub assigned_id: UserId,
    pub title: String,
    pub content: String,
    /// Label set; sorted ascending and distinct after any read
    pub label_ids: Vec<LabelId>,
}

impl Task {
    pub fn is_closed(&self) -> bool {
        self.closed != 0
    }
}

/// Current time in seconds since the Unix epoch
pub fn now_secs() -> i64 {
    chrono::Utc::now().timestamp()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_secs() {
        let ts = now_secs();
        // Should be reasonable timestamp (after year 2020)
        assert!(ts > 1_600_000_000);
    }

    #[test]
    fn test_default_task_is_open() {
        let task = Task::default();
        assert!(!task.is_closed());
        assert!(task.label_ids.is_empty());

        let task = Task {
            closed: now_secs(),
            ..Default::default()
        };
        assert!(task.is_closed());
    }

    #[test]
    fn test_task_serialization() {
        let task = Task {
            id: 7,
            title: "Write docs".to_string(),
            label_ids: vec![1, 3],
            ..Default::default()
        };

        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["title"], "Write docs");
        assert_eq!(json["label_ids"], serde_json::json!([1, 3]));
        assert_eq!(json["closed"], 0);
    }
}
