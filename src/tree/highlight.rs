use std::collections::HashSet;

use serde::Serialize;

use crate::model::TaskId;

use super::forest::Forest;
use super::visibility::{VisibleEdge, VisibleNode, Visibility};

/// Opacity of nodes and edges off the hovered path
pub const DIMMED_OPACITY: f32 = 0.1;
/// Stroke width of an edge on the hovered path
pub const PATH_STROKE_WIDTH: u8 = 3;
pub const NORMAL_STROKE_WIDTH: u8 = 1;
/// Stacking priority of an edge on the hovered path (all others are 0)
pub const PATH_Z_INDEX: i32 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Emphasis {
    /// Nothing is hovered
    Neutral,
    /// On the hovered node's ancestor chain
    Highlighted,
    /// Off the chain while something is hovered
    Dimmed,
}

impl Emphasis {
    pub fn opacity(self) -> f32 {
        match self {
            Emphasis::Neutral | Emphasis::Highlighted => 1.0,
            Emphasis::Dimmed => DIMMED_OPACITY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StyledNode {
    #[serde(flatten)]
    pub node: VisibleNode,
    pub emphasis: Emphasis,
    /// Dimmed nodes do not take pointer input
    pub interactive: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StyledEdge {
    #[serde(flatten)]
    pub edge: VisibleEdge,
    pub emphasis: Emphasis,
    pub stroke_width: u8,
    pub z_index: i32,
}

/// `id` and all of its ancestors, root first.
///
/// Follows `parent_id` pointers upward and stops at a node without a parent in
/// the forest. Unknown ids give an empty chain.
pub fn ancestor_chain(forest: &Forest, id: TaskId) -> Vec<TaskId> {
    let mut chain = Vec::new();
    let mut seen = HashSet::new();
    let mut current = forest.contains(id).then_some(id);
    while let Some(next) = current {
        if !seen.insert(next) {
            break;
        }
        chain.push(next);
        current = forest.parent_of(next);
    }
    chain.reverse();
    chain
}

/// Style the visible set for the hovered node. Never adds or removes entries.
///
/// With no hover (or a hover on an unknown node) everything is neutral.
/// Otherwise nodes on the ancestor chain are highlighted, everything else is
/// dimmed and non-interactive, and an edge is on the path when both of its
/// endpoints are on the chain.
pub fn resolve_highlight(
    visibility: &Visibility,
    forest: &Forest,
    hovered: Option<TaskId>,
) -> (Vec<StyledNode>, Vec<StyledEdge>) {
    let chain: Option<HashSet<TaskId>> = hovered
        .map(|id| ancestor_chain(forest, id))
        .filter(|chain| !chain.is_empty())
        .map(|chain| chain.into_iter().collect());

    let nodes = visibility
        .nodes
        .iter()
        .map(|node| {
            let emphasis = match &chain {
                None => Emphasis::Neutral,
                Some(set) if set.contains(&node.id) => Emphasis::Highlighted,
                Some(_) => Emphasis::Dimmed,
            };
            StyledNode {
                node: node.clone(),
                emphasis,
                interactive: emphasis != Emphasis::Dimmed,
            }
        })
        .collect();

    let edges = visibility
        .edges
        .iter()
        .map(|&edge| {
            let emphasis = match &chain {
                None => Emphasis::Neutral,
                Some(set) if set.contains(&edge.source) && set.contains(&edge.target) => {
                    Emphasis::Highlighted
                }
                Some(_) => Emphasis::Dimmed,
            };
            let on_path = emphasis == Emphasis::Highlighted;
            StyledEdge {
                edge,
                emphasis,
                stroke_width: if on_path {
                    PATH_STROKE_WIDTH
                } else {
                    NORMAL_STROKE_WIDTH
                },
                z_index: if on_path { PATH_Z_INDEX } else { 0 },
            }
        })
        .collect();

    (nodes, edges)
}
