use std::collections::HashSet;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;

use crate::model::config::ChooseConfig;
use crate::model::task::{TaskId, TaskNode};

/// A task together with the score that picked it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredTask {
    #[serde(flatten)]
    pub task: TaskNode,
    pub score: f64,
}

/// Leaves that are not completed, highest priority first. Ties keep input
/// order.
pub fn actionable_leaves(tasks: &[TaskNode]) -> Vec<TaskNode> {
    let parents: HashSet<TaskId> = tasks.iter().filter_map(|t| t.parent_id).collect();
    let mut leaves: Vec<TaskNode> = tasks
        .iter()
        .filter(|t| !t.is_completed && !parents.contains(&t.id))
        .cloned()
        .collect();
    leaves.sort_by(|a, b| b.priority.cmp(&a.priority));
    leaves
}

/// Fractional days since the task was created (never negative)
pub fn age_in_days(task: &TaskNode, now: DateTime<Utc>) -> f64 {
    let millis = (now - task.created_at).num_milliseconds().max(0);
    millis as f64 / 86_400_000.0
}

/// `priority * priority_weight + age_days * age_weight + noise * jitter`,
/// where `noise` is in `[0, 1)`.
pub fn score(task: &TaskNode, now: DateTime<Utc>, weights: &ChooseConfig, noise: f64) -> f64 {
    task.priority as f64 * weights.priority_weight
        + age_in_days(task, now) * weights.age_weight
        + noise * weights.jitter
}

/// Pick the highest-scoring actionable leaf, or `None` when nothing is
/// actionable.
pub fn choose_actionable<R: Rng + ?Sized>(
    tasks: &[TaskNode],
    now: DateTime<Utc>,
    weights: &ChooseConfig,
    rng: &mut R,
) -> Option<ScoredTask> {
    actionable_leaves(tasks)
        .into_iter()
        .map(|task| {
            let noise: f64 = rng.r#gen();
            let score = score(&task, now, weights, noise);
            ScoredTask { task, score }
        })
        .max_by(|a, b| a.score.total_cmp(&b.score))
}
