use indexmap::IndexMap;
use serde::Serialize;

use crate::model::task::{TaskId, TaskNode};
use crate::ops::choose::ScoredTask;
use crate::tree::highlight::{StyledEdge, StyledNode};
use crate::tree::layout::{NodePosition, outline_order};
use crate::tree::progress::round_percent;
use crate::tree::visibility::VisibleNode;

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct TreeJson<'a> {
    pub nodes: &'a [StyledNode],
    pub edges: &'a [StyledEdge],
    pub layout: Vec<NodePosition>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

#[derive(Serialize)]
pub struct ShowJson<'a> {
    #[serde(flatten)]
    pub task: &'a TaskNode,
    pub progress: f64,
    pub percent: u8,
    pub children: Vec<TaskId>,
    pub ancestors: Vec<&'a TaskNode>,
}

#[derive(Serialize)]
pub struct DeletedJson {
    pub deleted: Vec<TaskId>,
}

// ---------------------------------------------------------------------------
// Text formatting
// ---------------------------------------------------------------------------

/// `[x]`, `[ ]`, or `[~]` while a toggle is pending
pub fn checkbox(is_completed: bool, pending: bool) -> &'static str {
    match (pending, is_completed) {
        (true, _) => "[~]",
        (false, true) => "[x]",
        (false, false) => "[ ]",
    }
}

/// `▸` folded branch, `▾` open branch, blank for a leaf
pub fn fold_marker(node: &VisibleNode) -> &'static str {
    match (node.has_children, node.is_folded) {
        (true, true) => "▸",
        (true, false) => "▾",
        (false, _) => " ",
    }
}

pub fn format_tree_row(node: &VisibleNode) -> String {
    format!(
        "{}{} {} {}  {}%  #{} p{}",
        "  ".repeat(node.depth),
        fold_marker(node),
        checkbox(node.is_completed, node.pending),
        node.title,
        round_percent(node.progress),
        node.id,
        node.priority,
    )
}

/// One line per visible node in outline order
pub fn format_tree(nodes: &[StyledNode], edges: &[StyledEdge]) -> Vec<String> {
    outline_order(nodes, edges)
        .into_iter()
        .map(|i| format_tree_row(&nodes[i].node))
        .collect()
}

pub fn format_task_line(task: &TaskNode) -> String {
    let mut line = format!(
        "{} #{} {} (p{})",
        checkbox(task.is_completed, false),
        task.id,
        task.title,
        task.priority
    );
    if let Some(deadline) = task.deadline {
        line.push_str(&format!(" due {}", deadline));
    }
    line
}

/// Task detail: the record, its progress, and the path from the root
pub fn format_task_detail(task: &TaskNode, progress: f64, ancestors: &[&TaskNode]) -> Vec<String> {
    let mut lines = vec![format_task_line(task)];
    lines.push(format!("progress: {}%", round_percent(progress)));
    lines.push(format!(
        "created: {}",
        task.created_at
            .to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
    ));
    if !ancestors.is_empty() {
        let path: Vec<&str> = ancestors.iter().map(|a| a.title.as_str()).collect();
        lines.push(format!("path: {}", path.join(" > ")));
    }
    lines
}

/// Leaves grouped under their parent's title, groups in order of their
/// most important leaf
pub fn format_leaves(leaves: &[TaskNode], all: &[TaskNode]) -> Vec<String> {
    let mut groups: IndexMap<Option<TaskId>, Vec<&TaskNode>> = IndexMap::new();
    for leaf in leaves {
        groups.entry(leaf.parent_id).or_default().push(leaf);
    }

    let mut lines = Vec::new();
    for (parent, tasks) in groups {
        let heading = parent
            .and_then(|pid| all.iter().find(|t| t.id == pid))
            .map_or("(top level)", |t| t.title.as_str());
        if !lines.is_empty() {
            lines.push(String::new());
        }
        lines.push(format!("{}:", heading));
        for task in tasks {
            lines.push(format!("  {}", format_task_line(task)));
        }
    }
    lines
}

pub fn format_choice(chosen: &ScoredTask) -> String {
    format!(
        "{}  score {:.1}",
        format_task_line(&chosen.task),
        chosen.score
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::TreeState;

    fn task(id: TaskId, parent_id: Option<TaskId>, done: bool) -> TaskNode {
        let mut t = TaskNode::new(id, format!("task {}", id), parent_id);
        t.is_completed = done;
        t
    }

    #[test]
    fn tree_lines_follow_outline() {
        let mut state = TreeState::new();
        state.load_records(vec![
            task(1, None, false),
            task(2, Some(1), true),
            task(3, Some(1), false),
            task(4, Some(3), false),
        ]);
        state.expand_all();
        let lines = format_tree(state.visible_nodes(), state.visible_edges());
        assert_eq!(
            lines,
            vec![
                "▾ [ ] task 1  50%  #1 p1",
                "    [x] task 2  100%  #2 p1",
                "  ▾ [ ] task 3  0%  #3 p1",
                "      [ ] task 4  0%  #4 p1",
            ]
        );

        state.toggle_fold(3);
        let lines = format_tree(state.visible_nodes(), state.visible_edges());
        assert_eq!(lines[2], "  ▸ [ ] task 3  0%  #3 p1");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn leaves_grouped_by_parent() {
        let all = vec![
            task(1, None, false),
            TaskNode::new(2, "Garden", Some(1)),
            TaskNode::new(3, "Water", Some(2)),
            TaskNode::new(4, "Taxes", Some(1)),
            TaskNode::new(5, "Weed", Some(2)),
        ];
        let leaves = vec![all[2].clone(), all[3].clone(), all[4].clone()];
        let lines = format_leaves(&leaves, &all);
        assert_eq!(
            lines,
            vec![
                "Garden:",
                "  [ ] #3 Water (p1)",
                "  [ ] #5 Weed (p1)",
                "",
                "task 1:",
                "  [ ] #4 Taxes (p1)",
            ]
        );
    }

    #[test]
    fn detail_includes_path() {
        let root = task(1, None, false);
        let child = TaskNode::new(2, "Garden", Some(1));
        let lines = format_task_detail(&child, 50.0, &[&root, &child]);
        assert_eq!(lines[0], "[ ] #2 Garden (p1)");
        assert_eq!(lines[1], "progress: 50%");
        assert_eq!(lines[3], "path: task 1 > Garden");
    }

    #[test]
    fn checkbox_states() {
        assert_eq!(checkbox(true, false), "[x]");
        assert_eq!(checkbox(false, false), "[ ]");
        assert_eq!(checkbox(false, true), "[~]");
    }
}
