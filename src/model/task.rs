use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of a task record. Unique and stable for the task's lifetime.
pub type TaskId = i64;

/// Priority assigned when a new task does not name one
pub const DEFAULT_PRIORITY: i64 = 1;

/// A single task record as stored by the repository.
///
/// Records are flat: the tree shape is carried only by `parent_id`. The one
/// record with `parent_id == None` is the root of the mind map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskNode {
    pub id: TaskId,
    pub title: String,
    #[serde(default)]
    pub parent_id: Option<TaskId>,
    #[serde(default = "default_priority")]
    pub priority: i64,
    #[serde(default)]
    pub is_completed: bool,
    pub created_at: DateTime<Utc>,
    /// Optional due date (informational only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<NaiveDate>,
}

impl TaskNode {
    /// Create an incomplete record with the default priority, created now.
    pub fn new(id: TaskId, title: impl Into<String>, parent_id: Option<TaskId>) -> Self {
        TaskNode {
            id,
            title: title.into(),
            parent_id,
            priority: DEFAULT_PRIORITY,
            is_completed: false,
            created_at: Utc::now(),
            deadline: None,
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

fn default_priority() -> i64 {
    DEFAULT_PRIORITY
}

/// Fields accepted when creating a task
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTask {
    pub title: String,
    pub parent_id: Option<TaskId>,
    /// `None` means the configured default priority
    #[serde(default)]
    pub priority: Option<i64>,
    #[serde(default)]
    pub deadline: Option<NaiveDate>,
}

impl NewTask {
    /// A task with no parent
    pub fn root(title: impl Into<String>) -> Self {
        NewTask {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn child_of(parent_id: TaskId, title: impl Into<String>) -> Self {
        NewTask {
            title: title.into(),
            parent_id: Some(parent_id),
            ..Default::default()
        }
    }
}

/// A partial update. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_completed: Option<bool>,
}

impl TaskPatch {
    pub fn title(title: impl Into<String>) -> Self {
        TaskPatch {
            title: Some(title.into()),
            ..Default::default()
        }
    }

    pub fn priority(priority: i64) -> Self {
        TaskPatch {
            priority: Some(priority),
            ..Default::default()
        }
    }

    pub fn completed(is_completed: bool) -> Self {
        TaskPatch {
            is_completed: Some(is_completed),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.priority.is_none() && self.is_completed.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_fills_defaults() {
        let task: TaskNode = serde_json::from_str(
            r#"{"id":4,"title":"Write docs","created_at":"2025-05-01T10:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(task.parent_id, None);
        assert_eq!(task.priority, DEFAULT_PRIORITY);
        assert!(!task.is_completed);
        assert!(task.deadline.is_none());
        assert!(task.is_root());
    }

    #[test]
    fn patch_skips_absent_fields() {
        let json = serde_json::to_string(&TaskPatch::completed(true)).unwrap();
        assert_eq!(json, r#"{"is_completed":true}"#);
        assert!(TaskPatch::default().is_empty());
        assert!(!TaskPatch::priority(3).is_empty());
    }
}
