use std::collections::{HashMap, VecDeque};

use crate::model::TaskId;

use super::forest::Forest;

/// Completion percentage per node, each in `[0, 100]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgressMap {
    values: HashMap<TaskId, f64>,
}

impl ProgressMap {
    pub fn get(&self, id: TaskId) -> Option<f64> {
        self.values.get(&id).copied()
    }

    /// Rounded whole percent for display
    pub fn percent(&self, id: TaskId) -> Option<u8> {
        self.get(id).map(round_percent)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

pub fn round_percent(value: f64) -> u8 {
    value.clamp(0.0, 100.0).round() as u8
}

/// Fractal progress for every node in the forest.
///
/// Leaves are 100 when completed and 0 otherwise. A node with children is the
/// unweighted mean of its direct children, whatever the size of each child's
/// subtree; its own completion flag is ignored.
pub fn compute_progress(forest: &Forest) -> ProgressMap {
    // Breadth-first order puts every parent before its children, so walking it
    // backwards fills children first.
    let mut order: Vec<TaskId> = Vec::with_capacity(forest.len());
    let mut queue: VecDeque<TaskId> = forest.roots().iter().copied().collect();
    while let Some(id) = queue.pop_front() {
        let Some(node) = forest.get(id) else {
            continue;
        };
        order.push(id);
        queue.extend(node.children.iter().copied());
    }

    let mut values = HashMap::with_capacity(order.len());
    for &id in order.iter().rev() {
        let Some(node) = forest.get(id) else {
            continue;
        };
        let value = if node.children.is_empty() {
            if node.record.is_completed { 100.0 } else { 0.0 }
        } else {
            let sum: f64 = node
                .children
                .iter()
                .map(|child| values.get(child).copied().unwrap_or(0.0))
                .sum();
            sum / node.children.len() as f64
        };
        values.insert(id, value);
    }
    ProgressMap { values }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TaskNode;
    use crate::tree::forest::build_forest;

    fn task(id: TaskId, parent_id: Option<TaskId>, done: bool) -> TaskNode {
        let mut t = TaskNode::new(id, format!("task {}", id), parent_id);
        t.is_completed = done;
        t
    }

    #[test]
    fn two_children_one_done() {
        let forest = build_forest(&[
            task(1, None, false),
            task(2, Some(1), true),
            task(3, Some(1), false),
        ]);
        let progress = compute_progress(&forest);
        assert_eq!(progress.get(1), Some(50.0));
        assert_eq!(progress.get(2), Some(100.0));
        assert_eq!(progress.get(3), Some(0.0));
    }

    #[test]
    fn mean_is_unweighted_by_subtree_size() {
        // Node 1: one finished leaf (2) and one branch (3) with ten open leaves
        let mut records = vec![task(1, None, false), task(2, Some(1), true), task(3, Some(1), false)];
        for id in 10..20 {
            records.push(task(id, Some(3), false));
        }
        let progress = compute_progress(&build_forest(&records));
        assert_eq!(progress.get(3), Some(0.0));
        assert_eq!(progress.get(1), Some(50.0));
    }

    #[test]
    fn parent_completion_flag_is_ignored() {
        let forest = build_forest(&[task(1, None, true), task(2, Some(1), false)]);
        let progress = compute_progress(&forest);
        assert_eq!(progress.get(1), Some(0.0));
    }

    #[test]
    fn nested_averages_keep_precision() {
        // 1 -> {2, 3}; 2 -> {4, 5, 6} with one of three done
        let forest = build_forest(&[
            task(1, None, false),
            task(2, Some(1), false),
            task(3, Some(1), true),
            task(4, Some(2), true),
            task(5, Some(2), false),
            task(6, Some(2), false),
        ]);
        let progress = compute_progress(&forest);
        let two = progress.get(2).unwrap();
        assert!((two - 100.0 / 3.0).abs() < 1e-9);
        let one = progress.get(1).unwrap();
        assert!((one - (100.0 / 3.0 + 100.0) / 2.0).abs() < 1e-9);
        assert_eq!(progress.percent(1), Some(67));
        assert_eq!(progress.percent(2), Some(33));
    }

    #[test]
    fn every_value_in_range() {
        let forest = build_forest(&[
            task(1, None, false),
            task(2, Some(1), true),
            task(3, Some(2), true),
            task(4, Some(2), false),
            task(5, None, true),
        ]);
        let progress = compute_progress(&forest);
        assert_eq!(progress.len(), 5);
        for node in forest.iter() {
            let value = progress.get(node.id()).unwrap();
            assert!((0.0..=100.0).contains(&value));
        }
        assert_eq!(progress.get(5), Some(100.0));
    }

    #[test]
    fn deep_chain_does_not_recurse() {
        let depth = 20_000;
        let mut records = vec![task(1, None, false)];
        for id in 2..=depth {
            records.push(task(id, Some(id - 1), false));
        }
        records.last_mut().unwrap().is_completed = true;

        let progress = compute_progress(&build_forest(&records));
        assert_eq!(progress.len(), depth as usize);
        assert_eq!(progress.get(depth), Some(100.0));
        assert_eq!(progress.get(1), Some(100.0));
    }

    #[test]
    fn empty_forest_gives_empty_map() {
        assert!(compute_progress(&build_forest(&[])).is_empty());
    }
}
