use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::task::DEFAULT_PRIORITY;

/// Configuration from config.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub project: ProjectInfo,
    #[serde(default)]
    pub tasks: TaskConfig,
    #[serde(default)]
    pub choose: ChooseConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectInfo {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskConfig {
    /// Priority given to tasks created without one
    #[serde(default = "default_priority")]
    pub default_priority: i64,
}

impl Default for TaskConfig {
    fn default() -> Self {
        TaskConfig {
            default_priority: DEFAULT_PRIORITY,
        }
    }
}

/// Weights for the actionable-task scoring heuristic:
/// `priority * priority_weight + age_days * age_weight + U(0, jitter)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChooseConfig {
    #[serde(default = "default_priority_weight")]
    pub priority_weight: f64,
    #[serde(default = "default_age_weight")]
    pub age_weight: f64,
    #[serde(default = "default_jitter")]
    pub jitter: f64,
}

impl Default for ChooseConfig {
    fn default() -> Self {
        ChooseConfig {
            priority_weight: default_priority_weight(),
            age_weight: default_age_weight(),
            jitter: default_jitter(),
        }
    }
}

fn default_priority() -> i64 {
    DEFAULT_PRIORITY
}

fn default_priority_weight() -> f64 {
    10.0
}

fn default_age_weight() -> f64 {
    2.0
}

fn default_jitter() -> f64 {
    5.0
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default = "default_true")]
    pub show_key_hints: bool,
    /// Hex color overrides keyed by theme slot (e.g. `highlight = "#FB4196"`)
    #[serde(default)]
    pub colors: HashMap<String, String>,
}

impl Default for UiConfig {
    fn default() -> Self {
        UiConfig {
            show_key_hints: true,
            colors: HashMap::new(),
        }
    }
}
