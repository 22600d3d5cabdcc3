use std::collections::{HashSet, VecDeque};

use chrono::Utc;

use crate::model::task::{NewTask, TaskId, TaskNode, TaskPatch};

/// Error type for task operations
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    #[error("task not found: {0}")]
    NotFound(TaskId),
    #[error("parent task not found: {0}")]
    ParentNotFound(TaskId),
    #[error("task title cannot be empty")]
    EmptyTitle,
    #[error("cannot delete root task {0}")]
    RootDelete(TaskId),
}

// ---------------------------------------------------------------------------
// CRUD on a flat record list
// ---------------------------------------------------------------------------

/// Append a new task with the given id. The parent, when named, must exist.
pub fn create_task(
    tasks: &mut Vec<TaskNode>,
    id: TaskId,
    new: NewTask,
    default_priority: i64,
) -> Result<TaskNode, TaskError> {
    let title = clean_title(&new.title)?;
    if let Some(parent_id) = new.parent_id
        && find_task(tasks, parent_id).is_none()
    {
        return Err(TaskError::ParentNotFound(parent_id));
    }

    let task = TaskNode {
        id,
        title,
        parent_id: new.parent_id,
        priority: new.priority.unwrap_or(default_priority),
        is_completed: false,
        created_at: Utc::now(),
        deadline: new.deadline,
    };
    tasks.push(task.clone());
    Ok(task)
}

/// Apply the fields present in `patch`. Returns the updated record.
pub fn update_task(
    tasks: &mut [TaskNode],
    id: TaskId,
    patch: TaskPatch,
) -> Result<TaskNode, TaskError> {
    let title = patch.title.as_deref().map(clean_title).transpose()?;
    let task = find_task_mut(tasks, id).ok_or(TaskError::NotFound(id))?;
    if let Some(title) = title {
        task.title = title;
    }
    if let Some(priority) = patch.priority {
        task.priority = priority;
    }
    if let Some(done) = patch.is_completed {
        task.is_completed = done;
    }
    Ok(task.clone())
}

/// Remove a task and all of its descendants. Returns the removed records in
/// their original order.
pub fn delete_task(tasks: &mut Vec<TaskNode>, id: TaskId) -> Result<Vec<TaskNode>, TaskError> {
    let task = find_task(tasks, id).ok_or(TaskError::NotFound(id))?;
    if task.parent_id.is_none() {
        return Err(TaskError::RootDelete(id));
    }

    let doomed: HashSet<TaskId> = subtree_ids(tasks, id).into_iter().collect();
    let mut removed = Vec::with_capacity(doomed.len());
    let mut kept = Vec::with_capacity(tasks.len() - doomed.len());
    for task in tasks.drain(..) {
        if doomed.contains(&task.id) {
            removed.push(task);
        } else {
            kept.push(task);
        }
    }
    *tasks = kept;
    Ok(removed)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub fn find_task(tasks: &[TaskNode], id: TaskId) -> Option<&TaskNode> {
    tasks.iter().find(|t| t.id == id)
}

pub fn find_task_mut(tasks: &mut [TaskNode], id: TaskId) -> Option<&mut TaskNode> {
    tasks.iter_mut().find(|t| t.id == id)
}

/// `id` plus every record whose parent chain leads to it, breadth-first
pub fn subtree_ids(tasks: &[TaskNode], id: TaskId) -> Vec<TaskId> {
    let mut out = Vec::new();
    let mut seen = HashSet::new();
    let mut queue = VecDeque::from([id]);
    while let Some(next) = queue.pop_front() {
        if !seen.insert(next) {
            continue;
        }
        out.push(next);
        queue.extend(
            tasks
                .iter()
                .filter(|t| t.parent_id == Some(next))
                .map(|t| t.id),
        );
    }
    out
}

/// Next id after the highest one in use
pub fn next_id(tasks: &[TaskNode]) -> TaskId {
    tasks.iter().map(|t| t.id).max().unwrap_or(0) + 1
}

fn clean_title(title: &str) -> Result<String, TaskError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        Err(TaskError::EmptyTitle)
    } else {
        Ok(trimmed.to_string())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tasks() -> Vec<TaskNode> {
        vec![
            TaskNode::new(1, "Life", None),
            TaskNode::new(2, "Garden", Some(1)),
            TaskNode::new(3, "Plant tomatoes", Some(2)),
            TaskNode::new(4, "Buy seeds", Some(3)),
            TaskNode::new(5, "Taxes", Some(1)),
        ]
    }

    // --- create ---

    #[test]
    fn test_create_child() {
        let mut tasks = sample_tasks();
        let task = create_task(&mut tasks, 6, NewTask::child_of(5, "  File forms  "), 1).unwrap();
        assert_eq!(task.id, 6);
        assert_eq!(task.title, "File forms");
        assert_eq!(task.parent_id, Some(5));
        assert_eq!(task.priority, 1);
        assert!(!task.is_completed);
        assert_eq!(tasks.len(), 6);
    }

    #[test]
    fn test_create_uses_explicit_priority() {
        let mut tasks = sample_tasks();
        let new = NewTask {
            priority: Some(7),
            ..NewTask::child_of(1, "Urgent")
        };
        let task = create_task(&mut tasks, 6, new, 1).unwrap();
        assert_eq!(task.priority, 7);
    }

    #[test]
    fn test_create_missing_parent() {
        let mut tasks = sample_tasks();
        let result = create_task(&mut tasks, 6, NewTask::child_of(42, "Lost"), 1);
        assert!(matches!(result, Err(TaskError::ParentNotFound(42))));
        assert_eq!(tasks.len(), 5);
    }

    #[test]
    fn test_create_empty_title() {
        let mut tasks = sample_tasks();
        let result = create_task(&mut tasks, 6, NewTask::child_of(1, "   "), 1);
        assert!(matches!(result, Err(TaskError::EmptyTitle)));
    }

    // --- update ---

    #[test]
    fn test_update_only_present_fields() {
        let mut tasks = sample_tasks();
        let updated = update_task(&mut tasks, 3, TaskPatch::completed(true)).unwrap();
        assert!(updated.is_completed);
        assert_eq!(updated.title, "Plant tomatoes");
        assert_eq!(updated.priority, 1);

        let updated = update_task(&mut tasks, 3, TaskPatch::title("Plant peppers")).unwrap();
        assert_eq!(updated.title, "Plant peppers");
        assert!(updated.is_completed);

        let updated = update_task(&mut tasks, 3, TaskPatch::priority(4)).unwrap();
        assert_eq!(updated.priority, 4);
        assert_eq!(find_task(&tasks, 3).unwrap().priority, 4);
    }

    #[test]
    fn test_update_rejects_empty_title() {
        let mut tasks = sample_tasks();
        let result = update_task(&mut tasks, 3, TaskPatch::title(""));
        assert!(matches!(result, Err(TaskError::EmptyTitle)));
        assert_eq!(find_task(&tasks, 3).unwrap().title, "Plant tomatoes");
    }

    #[test]
    fn test_update_not_found() {
        let mut tasks = sample_tasks();
        assert!(matches!(
            update_task(&mut tasks, 99, TaskPatch::priority(2)),
            Err(TaskError::NotFound(99))
        ));
    }

    // --- delete ---

    #[test]
    fn test_delete_cascades() {
        let mut tasks = sample_tasks();
        let removed = delete_task(&mut tasks, 2).unwrap();
        let removed_ids: Vec<TaskId> = removed.iter().map(|t| t.id).collect();
        assert_eq!(removed_ids, vec![2, 3, 4]);
        let kept: Vec<TaskId> = tasks.iter().map(|t| t.id).collect();
        assert_eq!(kept, vec![1, 5]);
    }

    #[test]
    fn test_delete_leaf() {
        let mut tasks = sample_tasks();
        delete_task(&mut tasks, 4).unwrap();
        assert_eq!(tasks.len(), 4);
        assert!(find_task(&tasks, 3).is_some());
    }

    #[test]
    fn test_delete_root_refused() {
        let mut tasks = sample_tasks();
        assert!(matches!(
            delete_task(&mut tasks, 1),
            Err(TaskError::RootDelete(1))
        ));
        assert_eq!(tasks.len(), 5);
    }

    #[test]
    fn test_subtree_survives_parent_cycle() {
        let mut tasks = sample_tasks();
        tasks.push(TaskNode::new(6, "Loop a", Some(7)));
        tasks.push(TaskNode::new(7, "Loop b", Some(6)));
        assert_eq!(subtree_ids(&tasks, 6), vec![6, 7]);
    }

    #[test]
    fn test_next_id() {
        assert_eq!(next_id(&[]), 1);
        assert_eq!(next_id(&sample_tasks()), 6);
    }
}
