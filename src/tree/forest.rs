use std::collections::{HashSet, VecDeque};

use indexmap::IndexMap;

use crate::model::{TaskId, TaskNode};

/// A data-integrity problem found while building the forest. None of these
/// are fatal: the affected records are repaired or left out.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IntegrityWarning {
    #[error("task {id} references missing parent {parent_id}; treating it as a root")]
    OrphanParent { id: TaskId, parent_id: TaskId },
    #[error("duplicate task id {id}; keeping the first record")]
    DuplicateId { id: TaskId },
    #[error("tasks {ids:?} are not reachable from any root (parent cycle); excluding them")]
    Cycle { ids: Vec<TaskId> },
}

/// A record plus the ids of its direct children, in input order
#[derive(Debug, Clone, PartialEq)]
pub struct ForestNode {
    pub record: TaskNode,
    pub children: Vec<TaskId>,
}

impl ForestNode {
    pub fn id(&self) -> TaskId {
        self.record.id
    }
}

/// Parent → children adjacency built from a flat record list.
///
/// A forest is rebuilt wholesale from the records on every recompute and is
/// never patched in place.
#[derive(Debug, Clone, Default)]
pub struct Forest {
    nodes: IndexMap<TaskId, ForestNode>,
    roots: Vec<TaskId>,
    warnings: Vec<IntegrityWarning>,
}

/// Build a forest from records in repository order (ascending id).
///
/// Child order follows input order. A record whose parent is missing becomes a
/// root. Records whose parent chain never reaches a root (cycles, including a
/// record that is its own parent) are dropped together with their subtrees.
pub fn build_forest(records: &[TaskNode]) -> Forest {
    let mut nodes: IndexMap<TaskId, ForestNode> = IndexMap::with_capacity(records.len());
    let mut warnings = Vec::new();

    for record in records {
        if nodes.contains_key(&record.id) {
            warnings.push(IntegrityWarning::DuplicateId { id: record.id });
            continue;
        }
        nodes.insert(
            record.id,
            ForestNode {
                record: record.clone(),
                children: Vec::new(),
            },
        );
    }

    let mut roots = Vec::new();
    for idx in 0..nodes.len() {
        let (id, parent_id) = {
            let node = &nodes[idx];
            (node.record.id, node.record.parent_id)
        };
        match parent_id {
            None => roots.push(id),
            // Self-parented: left unlinked so the reachability pass drops it
            Some(pid) if pid == id => {}
            Some(pid) => match nodes.get_mut(&pid) {
                Some(parent) => parent.children.push(id),
                None => {
                    warnings.push(IntegrityWarning::OrphanParent { id, parent_id: pid });
                    roots.push(id);
                }
            },
        }
    }

    let mut reachable: HashSet<TaskId> = HashSet::with_capacity(nodes.len());
    let mut queue: VecDeque<TaskId> = roots.iter().copied().collect();
    while let Some(id) = queue.pop_front() {
        if !reachable.insert(id) {
            continue;
        }
        if let Some(node) = nodes.get(&id) {
            queue.extend(node.children.iter().copied());
        }
    }

    if reachable.len() < nodes.len() {
        let ids: Vec<TaskId> = nodes
            .keys()
            .filter(|id| !reachable.contains(id))
            .copied()
            .collect();
        warnings.push(IntegrityWarning::Cycle { ids });
        // Children of a reachable node are reachable, so no dangling links remain.
        nodes.retain(|id, _| reachable.contains(id));
    }

    Forest {
        nodes,
        roots,
        warnings,
    }
}

impl Forest {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: TaskId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn get(&self, id: TaskId) -> Option<&ForestNode> {
        self.nodes.get(&id)
    }

    pub fn record(&self, id: TaskId) -> Option<&TaskNode> {
        self.nodes.get(&id).map(|n| &n.record)
    }

    /// Direct children in input order. Unknown ids have none.
    pub fn children(&self, id: TaskId) -> &[TaskId] {
        self.nodes.get(&id).map_or(&[], |n| n.children.as_slice())
    }

    /// Parent within this forest. Roots (including promoted orphans) have none.
    pub fn parent_of(&self, id: TaskId) -> Option<TaskId> {
        self.record(id)
            .and_then(|r| r.parent_id)
            .filter(|pid| *pid != id && self.nodes.contains_key(pid))
    }

    /// Top-level nodes in input order
    pub fn roots(&self) -> &[TaskId] {
        &self.roots
    }

    pub fn warnings(&self) -> &[IntegrityWarning] {
        &self.warnings
    }

    /// All nodes in input order
    pub fn iter(&self) -> impl Iterator<Item = &ForestNode> {
        self.nodes.values()
    }

    /// Every descendant of `id` (excluding `id`), breadth-first
    pub fn descendants(&self, id: TaskId) -> Vec<TaskId> {
        let mut out = Vec::new();
        let mut queue: VecDeque<TaskId> = self.children(id).iter().copied().collect();
        while let Some(next) = queue.pop_front() {
            out.push(next);
            queue.extend(self.children(next).iter().copied());
        }
        out
    }

    /// Nodes sharing `id`'s parent (roots share the root level), ordered by id.
    /// Includes `id` itself.
    pub fn siblings(&self, id: TaskId) -> Vec<TaskId> {
        if !self.contains(id) {
            return Vec::new();
        }
        let mut siblings = match self.parent_of(id) {
            Some(pid) => self.children(pid).to_vec(),
            None => self.roots.clone(),
        };
        siblings.sort_unstable();
        siblings
    }

    /// The lowest-id root, if any
    pub fn first_root(&self) -> Option<TaskId> {
        self.roots.iter().copied().min()
    }
}
