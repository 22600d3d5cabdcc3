use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::model::task::TaskId;

#[derive(Parser)]
#[command(name = "ft", about = concat!("fractal v", env!("CARGO_PKG_VERSION"), " - every task is a tree of smaller ones"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Run against a different project directory
    #[arg(short = 'C', long = "project-dir", global = true)]
    pub project_dir: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new fractal project in the current directory
    Init(InitArgs),
    /// Print the task tree with progress
    Tree(TreeArgs),
    /// Show one task with its progress and ancestors
    Show(ShowArgs),
    /// List actionable leaves (incomplete tasks without children)
    Leaves,
    /// Add a child task
    Add(AddArgs),
    /// Change a task's title
    Rename(RenameArgs),
    /// Set a task's priority
    Priority(PriorityArgs),
    /// Toggle a task's completion
    Toggle(IdArg),
    /// Delete a task and everything below it
    Delete(IdArg),
    /// Pick an actionable task to work on next
    Choose,
}

#[derive(Args)]
pub struct InitArgs {
    /// Project name (default: inferred from directory name)
    #[arg(long)]
    pub name: Option<String>,
    /// Reinitialize even if fractal/ already exists
    #[arg(long)]
    pub force: bool,
}

#[derive(Args)]
pub struct TreeArgs {
    /// Show only this task and its descendants
    #[arg(long)]
    pub hoist: Option<TaskId>,
    /// Fold a task, hiding its descendants (repeatable)
    #[arg(long, action = clap::ArgAction::Append)]
    pub fold: Vec<TaskId>,
    /// Start with every task folded, as the TUI does
    #[arg(long)]
    pub collapsed: bool,
}

#[derive(Args)]
pub struct ShowArgs {
    /// Task ID to show
    pub id: TaskId,
}

#[derive(Args)]
pub struct AddArgs {
    /// Parent task ID
    pub parent: TaskId,
    /// Task title
    pub title: String,
    /// Priority (default from config)
    #[arg(long, short)]
    pub priority: Option<i64>,
    /// Deadline as YYYY-MM-DD
    #[arg(long)]
    pub deadline: Option<NaiveDate>,
}

#[derive(Args)]
pub struct RenameArgs {
    pub id: TaskId,
    /// New title
    pub title: String,
}

#[derive(Args)]
pub struct PriorityArgs {
    pub id: TaskId,
    /// New priority (higher is more important)
    #[arg(allow_negative_numbers = true)]
    pub priority: i64,
}

#[derive(Args)]
pub struct IdArg {
    /// Task ID
    pub id: TaskId,
}
