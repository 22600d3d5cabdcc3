use std::collections::{HashSet, VecDeque};

use serde::Serialize;

use crate::model::TaskId;

use super::forest::Forest;
use super::progress::ProgressMap;

/// Ids of nodes whose descendants are hidden
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FoldSet {
    ids: HashSet<TaskId>,
}

impl FoldSet {
    /// A fold set containing every node of the forest
    pub fn all(forest: &Forest) -> Self {
        FoldSet {
            ids: forest.iter().map(|n| n.id()).collect(),
        }
    }

    pub fn contains(&self, id: TaskId) -> bool {
        self.ids.contains(&id)
    }

    /// Flip membership. Returns true if the node is folded afterwards.
    pub fn toggle(&mut self, id: TaskId) -> bool {
        if self.ids.remove(&id) {
            false
        } else {
            self.ids.insert(id);
            true
        }
    }

    pub fn fold(&mut self, id: TaskId) {
        self.ids.insert(id);
    }

    pub fn unfold(&mut self, id: TaskId) {
        self.ids.remove(&id);
    }

    /// Drop ids that are not in the forest
    pub fn retain_present(&mut self, forest: &Forest) {
        self.ids.retain(|id| forest.contains(*id));
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }
}

impl FromIterator<TaskId> for FoldSet {
    fn from_iter<I: IntoIterator<Item = TaskId>>(iter: I) -> Self {
        FoldSet {
            ids: iter.into_iter().collect(),
        }
    }
}

/// A node that should be rendered
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisibleNode {
    pub id: TaskId,
    pub title: String,
    pub priority: i64,
    pub is_completed: bool,
    pub parent_id: Option<TaskId>,
    pub is_folded: bool,
    pub has_children: bool,
    pub progress: f64,
    /// Distance from the traversal root (0 for roots and the hoisted node)
    pub depth: usize,
    /// Completion flipped locally while a toggle is in flight
    pub pending: bool,
}

/// A parent → child edge between two visible nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct VisibleEdge {
    pub source: TaskId,
    pub target: TaskId,
}

/// Breadth-first ordered nodes and edges to render
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Visibility {
    pub nodes: Vec<VisibleNode>,
    pub edges: Vec<VisibleEdge>,
}

/// Compute the visible nodes and edges.
///
/// Traversal starts at the hoisted node when it exists in the forest, else at
/// every root. A folded node is itself visible but none of its descendants
/// are. Traversal roots get no incoming edge, even a hoisted node that has a
/// real parent.
pub fn resolve_visibility(
    forest: &Forest,
    progress: &ProgressMap,
    folds: &FoldSet,
    hoisted: Option<TaskId>,
) -> Visibility {
    let start: Vec<TaskId> = match hoisted.filter(|id| forest.contains(*id)) {
        Some(id) => vec![id],
        None => forest.roots().to_vec(),
    };

    let mut out = Visibility::default();
    let mut queue: VecDeque<(TaskId, usize)> = start.iter().map(|&id| (id, 0)).collect();

    while let Some((id, depth)) = queue.pop_front() {
        let Some(node) = forest.get(id) else {
            continue;
        };
        let is_folded = folds.contains(id);
        out.nodes.push(VisibleNode {
            id,
            title: node.record.title.clone(),
            priority: node.record.priority,
            is_completed: node.record.is_completed,
            parent_id: forest.parent_of(id),
            is_folded,
            has_children: !node.children.is_empty(),
            progress: progress.get(id).unwrap_or(0.0),
            depth,
            pending: false,
        });
        if depth > 0
            && let Some(parent) = forest.parent_of(id)
        {
            out.edges.push(VisibleEdge {
                source: parent,
                target: id,
            });
        }
        if !is_folded {
            queue.extend(node.children.iter().map(|&child| (child, depth + 1)));
        }
    }

    out
}
