use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::model::TaskId;

use super::forest::Forest;

/// Direction of a focus move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// To the parent
    Up,
    /// To the first child
    Down,
    /// To the previous sibling
    Left,
    /// To the next sibling
    Right,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => write!(f, "up"),
            Direction::Down => write!(f, "down"),
            Direction::Left => write!(f, "left"),
            Direction::Right => write!(f, "right"),
        }
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "up" => Ok(Direction::Up),
            "down" => Ok(Direction::Down),
            "left" => Ok(Direction::Left),
            "right" => Ok(Direction::Right),
            _ => Err(format!("unknown direction: {}", s)),
        }
    }
}

/// Where focus lands after moving from `current` in `direction`.
///
/// Moves over the whole forest, ignoring folds. A move without a target keeps
/// the current focus. With no current focus (or a focus on a node that no
/// longer exists) the first root is chosen.
pub fn move_focus(forest: &Forest, current: Option<TaskId>, direction: Direction) -> Option<TaskId> {
    let Some(id) = current.filter(|id| forest.contains(*id)) else {
        return forest.first_root();
    };

    let target = match direction {
        Direction::Up => forest.parent_of(id),
        Direction::Down => forest.children(id).iter().copied().min(),
        Direction::Left | Direction::Right => {
            let siblings = forest.siblings(id);
            let pos = siblings.iter().position(|&s| s == id);
            match (direction, pos) {
                (Direction::Left, Some(p)) if p > 0 => Some(siblings[p - 1]),
                (Direction::Right, Some(p)) => siblings.get(p + 1).copied(),
                _ => None,
            }
        }
    };

    Some(target.unwrap_or(id))
}
