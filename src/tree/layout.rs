use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::model::TaskId;

use super::highlight::{StyledEdge, StyledNode};
use super::visibility::VisibleNode;

pub const NODE_WIDTH: f64 = 280.0;
pub const NODE_HEIGHT: f64 = 140.0;
pub const COLUMN_SPACING: f64 = 200.0;
pub const ROW_SPACING: f64 = 150.0;

/// Seed position of a visible node for a directed (top → bottom) layout
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NodePosition {
    pub id: TaskId,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Layered placement: one row per depth, nodes spread around x = 0 in
/// traversal order. Identical inputs always give identical positions.
pub fn layered_positions(nodes: &[VisibleNode]) -> Vec<NodePosition> {
    let max_depth = nodes.iter().map(|n| n.depth).max().unwrap_or(0);
    let mut row_len = vec![0usize; max_depth + 1];
    for node in nodes {
        row_len[node.depth] += 1;
    }

    let mut row_index = vec![0usize; max_depth + 1];
    nodes
        .iter()
        .map(|node| {
            let index = row_index[node.depth];
            row_index[node.depth] += 1;
            let total = row_len[node.depth] as f64;
            NodePosition {
                id: node.id,
                x: (index as f64 - total / 2.0) * COLUMN_SPACING + 100.0,
                y: node.depth as f64 * ROW_SPACING,
                width: NODE_WIDTH,
                height: NODE_HEIGHT,
            }
        })
        .collect()
}

/// Depth-first order of the visible nodes, following the visible edges.
/// Returns indices into `nodes`. Nodes without a visible incoming edge start
/// a new top-level entry.
pub fn outline_order(nodes: &[StyledNode], edges: &[StyledEdge]) -> Vec<usize> {
    let index: HashMap<TaskId, usize> = nodes
        .iter()
        .enumerate()
        .map(|(i, n)| (n.node.id, i))
        .collect();
    let mut children: HashMap<TaskId, Vec<TaskId>> = HashMap::new();
    let mut has_parent = HashSet::new();
    for e in edges {
        children.entry(e.edge.source).or_default().push(e.edge.target);
        has_parent.insert(e.edge.target);
    }

    let mut stack: Vec<TaskId> = nodes
        .iter()
        .map(|n| n.node.id)
        .filter(|id| !has_parent.contains(id))
        .rev()
        .collect();
    let mut seen = HashSet::new();
    let mut order = Vec::with_capacity(nodes.len());
    while let Some(id) = stack.pop() {
        if !seen.insert(id) {
            continue;
        }
        if let Some(&i) = index.get(&id) {
            order.push(i);
        }
        if let Some(kids) = children.get(&id) {
            stack.extend(kids.iter().rev());
        }
    }
    order
}
