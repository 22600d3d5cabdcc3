use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::model::{TaskId, TaskNode};

use super::focus::{self, Direction};
use super::forest::{Forest, IntegrityWarning, build_forest};
use super::highlight::{StyledEdge, StyledNode, ancestor_chain, resolve_highlight};
use super::progress::{ProgressMap, compute_progress};
use super::visibility::{FoldSet, resolve_visibility};

/// Everything derived from one generation of inputs.
///
/// Published as a unit: a consumer holding a snapshot never sees nodes and
/// edges from different generations.
#[derive(Debug, Default)]
pub struct Snapshot {
    pub generation: u64,
    pub forest: Forest,
    pub progress: ProgressMap,
    pub nodes: Vec<StyledNode>,
    pub edges: Vec<StyledEdge>,
}

/// Identifies one record refresh. Later refreshes get larger tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RefreshToken(u64);

/// What happened to a completed refresh
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Records replaced and outputs recomputed
    Applied,
    /// A newer refresh was already applied; the response was dropped
    Stale,
    /// The fetch failed; previous outputs are unchanged
    Failed(String),
}

/// Owns the tree inputs (records, folds, hoist, hover, focus) and the last
/// published outputs. Every input change recomputes the whole pipeline:
/// forest → progress → visibility → highlight.
#[derive(Debug)]
pub struct TreeState {
    records: Vec<TaskNode>,
    folds: FoldSet,
    loaded: bool,
    hoisted: Option<TaskId>,
    hovered: Option<TaskId>,
    focused: Option<TaskId>,
    /// Nodes whose completion toggle is in flight
    pending: HashSet<TaskId>,
    snapshot: Arc<Snapshot>,
    issued_token: u64,
    applied_token: u64,
}

impl Default for TreeState {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeState {
    pub fn new() -> Self {
        TreeState {
            records: Vec::new(),
            folds: FoldSet::default(),
            loaded: false,
            hoisted: None,
            hovered: None,
            focused: None,
            pending: HashSet::new(),
            snapshot: Arc::new(Snapshot::default()),
            issued_token: 0,
            applied_token: 0,
        }
    }

    // -----------------------------------------------------------------------
    // Inputs
    // -----------------------------------------------------------------------

    /// Replace the record set.
    ///
    /// The first load with records folds every node, as does the first load
    /// after an empty record set. Later loads keep the user's folds, minus ids
    /// that disappeared, even when the user has unfolded everything. Hover and hoist on vanished
    /// nodes are cleared and focus falls back to the first root. Any refresh
    /// still in flight becomes stale.
    pub fn load_records(&mut self, records: Vec<TaskNode>) {
        self.applied_token = self.issued_token;
        self.apply_records(records);
    }

    fn apply_records(&mut self, records: Vec<TaskNode>) {
        let seed_folds = !self.loaded || self.records.is_empty();
        self.records = records;
        self.pending.clear();
        self.loaded = true;

        let forest = build_forest(&self.records);
        for warning in forest.warnings() {
            warn!(%warning, "task data integrity");
        }

        if seed_folds {
            self.folds = FoldSet::all(&forest);
        } else {
            self.folds.retain_present(&forest);
        }
        if self.hoisted.is_some_and(|id| !forest.contains(id)) {
            self.hoisted = None;
        }
        if self.hovered.is_some_and(|id| !forest.contains(id)) {
            self.hovered = None;
        }
        if !self.focused.is_some_and(|id| forest.contains(id)) {
            self.focused = forest.first_root();
        }

        self.publish(forest);
    }

    /// Issue a token for a refresh about to be fetched
    pub fn begin_refresh(&mut self) -> RefreshToken {
        self.issued_token += 1;
        RefreshToken(self.issued_token)
    }

    /// Deliver the result of the refresh identified by `token`.
    ///
    /// Responses older than the last applied refresh are dropped. A failed
    /// fetch keeps the previous records; only pending toggle marks are
    /// cleared, since no load will arrive to resolve them.
    pub fn complete_refresh<E: fmt::Display>(
        &mut self,
        token: RefreshToken,
        result: Result<Vec<TaskNode>, E>,
    ) -> RefreshOutcome {
        if token.0 <= self.applied_token {
            debug!(
                token = token.0,
                applied = self.applied_token,
                "dropping stale refresh"
            );
            return RefreshOutcome::Stale;
        }
        match result {
            Ok(records) => {
                self.applied_token = token.0;
                self.apply_records(records);
                RefreshOutcome::Applied
            }
            Err(e) => {
                warn!(token = token.0, error = %e, "refresh failed; keeping previous tree");
                if !self.pending.is_empty() {
                    self.pending.clear();
                    self.recompute();
                }
                RefreshOutcome::Failed(e.to_string())
            }
        }
    }

    /// Flip a node's fold state. Unknown ids are ignored.
    pub fn toggle_fold(&mut self, id: TaskId) {
        if !self.snapshot.forest.contains(id) {
            return;
        }
        self.folds.toggle(id);
        self.recompute();
    }

    /// Unfold every node
    pub fn expand_all(&mut self) {
        if !self.folds.is_empty() {
            self.folds = FoldSet::default();
            self.recompute();
        }
    }

    /// Fold every node
    pub fn collapse_all(&mut self) {
        self.folds = FoldSet::all(&self.snapshot.forest);
        self.recompute();
    }

    /// Unfold every ancestor of `id` so that it becomes visible
    pub fn reveal(&mut self, id: TaskId) {
        let chain = ancestor_chain(&self.snapshot.forest, id);
        let hidden: Vec<TaskId> = chain
            .iter()
            .take(chain.len().saturating_sub(1))
            .copied()
            .filter(|a| self.folds.contains(*a))
            .collect();
        if hidden.is_empty() {
            return;
        }
        for ancestor in hidden {
            self.folds.unfold(ancestor);
        }
        self.recompute();
    }

    /// Zoom to a sub-tree, or back to the whole tree with `None`.
    /// Unknown ids are ignored.
    pub fn set_hoist(&mut self, id: Option<TaskId>) {
        if id.is_some_and(|id| !self.snapshot.forest.contains(id)) || id == self.hoisted {
            return;
        }
        self.hoisted = id;
        self.recompute();
    }

    pub fn set_hover(&mut self, id: Option<TaskId>) {
        if id.is_some_and(|id| !self.snapshot.forest.contains(id)) || id == self.hovered {
            return;
        }
        self.hovered = id;
        self.recompute();
    }

    /// Move focus along the full tree, ignoring folds
    pub fn move_focus(&mut self, direction: Direction) {
        let next = focus::move_focus(&self.snapshot.forest, self.focused, direction);
        if next != self.focused {
            self.focused = next;
            self.recompute();
        }
    }

    /// Focus a node directly (e.g. on click). Unknown ids are ignored.
    pub fn set_focus(&mut self, id: TaskId) {
        if !self.snapshot.forest.contains(id) || self.focused == Some(id) {
            return;
        }
        self.focused = Some(id);
        self.recompute();
    }

    /// Show a completion toggle as pending on the node's visible descriptor
    /// until the next applied load. The forest and progress are unaffected.
    pub fn mark_pending_toggle(&mut self, id: TaskId) {
        if self.snapshot.forest.contains(id) && self.pending.insert(id) {
            self.recompute();
        }
    }

    // -----------------------------------------------------------------------
    // Pipeline
    // -----------------------------------------------------------------------

    fn recompute(&mut self) {
        let forest = build_forest(&self.records);
        self.publish(forest);
    }

    fn publish(&mut self, forest: Forest) {
        let progress = compute_progress(&forest);
        let mut visibility = resolve_visibility(&forest, &progress, &self.folds, self.hoisted);
        for node in &mut visibility.nodes {
            if self.pending.contains(&node.id) {
                node.is_completed = !node.is_completed;
                node.pending = true;
            }
        }
        let (nodes, edges) = resolve_highlight(&visibility, &forest, self.hovered);

        let generation = self.snapshot.generation + 1;
        debug!(
            generation,
            nodes = nodes.len(),
            edges = edges.len(),
            "recomputed tree state"
        );
        self.snapshot = Arc::new(Snapshot {
            generation,
            forest,
            progress,
            nodes,
            edges,
        });
    }

    // -----------------------------------------------------------------------
    // Outputs
    // -----------------------------------------------------------------------

    /// The current outputs as one consistent unit
    pub fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&self.snapshot)
    }

    pub fn visible_nodes(&self) -> &[StyledNode] {
        &self.snapshot.nodes
    }

    pub fn visible_edges(&self) -> &[StyledEdge] {
        &self.snapshot.edges
    }

    pub fn progress_for(&self, id: TaskId) -> Option<f64> {
        self.snapshot.progress.get(id)
    }

    pub fn is_folded(&self, id: TaskId) -> bool {
        self.folds.contains(id)
    }

    pub fn is_focused(&self, id: TaskId) -> bool {
        self.focused == Some(id)
    }

    pub fn focused(&self) -> Option<TaskId> {
        self.focused
    }

    pub fn hovered(&self) -> Option<TaskId> {
        self.hovered
    }

    pub fn hoisted(&self) -> Option<TaskId> {
        self.hoisted
    }

    pub fn records(&self) -> &[TaskNode] {
        &self.records
    }

    pub fn forest(&self) -> &Forest {
        &self.snapshot.forest
    }

    pub fn warnings(&self) -> &[IntegrityWarning] {
        self.snapshot.forest.warnings()
    }

    /// Root-first ancestor chain of `id`, inclusive
    pub fn ancestors(&self, id: TaskId) -> Vec<TaskId> {
        ancestor_chain(&self.snapshot.forest, id)
    }
}
