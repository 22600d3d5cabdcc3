mod init;
pub use init::cmd_init;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::config_io::{self, Project};
use crate::io::store::TaskRepository;
use crate::model::task::{NewTask, TaskId, TaskNode, TaskPatch};
use crate::ops::task_ops;
use crate::tree::layout::layered_positions;
use crate::tree::{RefreshOutcome, Session};

type CmdResult = Result<(), Box<dyn std::error::Error>>;

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> CmdResult {
    let json = cli.json;
    let start = start_dir(cli.project_dir.as_deref())?;

    match cli.command {
        None => crate::tui::run(&start),
        Some(cmd) => match cmd {
            Commands::Init(args) => cmd_init(args, &start, json),

            // Read commands
            Commands::Tree(args) => cmd_tree(args, &start, json),
            Commands::Show(args) => cmd_show(args, &start, json),
            Commands::Leaves => cmd_leaves(&start, json),
            Commands::Choose => cmd_choose(&start, json),

            // Write commands
            Commands::Add(args) => cmd_add(args, &start, json),
            Commands::Rename(args) => cmd_update(args.id, TaskPatch::title(args.title), &start, json),
            Commands::Priority(args) => {
                cmd_update(args.id, TaskPatch::priority(args.priority), &start, json)
            }
            Commands::Toggle(args) => cmd_toggle(args.id, &start, json),
            Commands::Delete(args) => cmd_delete(args.id, &start, json),
        },
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// The directory commands run against: `-C` if given, else the cwd
pub fn start_dir(project_dir: Option<&str>) -> Result<PathBuf, Box<dyn std::error::Error>> {
    match project_dir {
        Some(dir) => Ok(std::fs::canonicalize(dir)
            .map_err(|e| format!("cannot resolve -C path '{}': {}", dir, e))?),
        None => Ok(std::env::current_dir()?),
    }
}

/// A session over the project's store with the records loaded
fn load_session(project: &Project) -> Result<Session, Box<dyn std::error::Error>> {
    let mut session = Session::new(Arc::new(project.store()));
    match session.refresh() {
        RefreshOutcome::Failed(msg) => Err(msg.into()),
        _ => Ok(session),
    }
}

fn print_task(task: &TaskNode, verb: &str, json: bool) -> CmdResult {
    if json {
        println!("{}", serde_json::to_string_pretty(task)?);
    } else {
        println!("{} {}", verb, format_task_line(task));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Read commands
// ---------------------------------------------------------------------------

fn cmd_tree(args: TreeArgs, start: &Path, json: bool) -> CmdResult {
    let project = config_io::load_project(start)?;
    let mut session = load_session(&project)?;
    let state = session.state_mut();

    if !args.collapsed {
        state.expand_all();
    }
    for id in args.fold {
        if !state.forest().contains(id) {
            return Err(format!("task not found: {}", id).into());
        }
        if !state.is_folded(id) {
            state.toggle_fold(id);
        }
    }
    if let Some(id) = args.hoist {
        if !state.forest().contains(id) {
            return Err(format!("task not found: {}", id).into());
        }
        state.set_hoist(Some(id));
    }

    let snapshot = state.snapshot();
    if json {
        let visible: Vec<_> = snapshot.nodes.iter().map(|n| n.node.clone()).collect();
        let out = TreeJson {
            nodes: &snapshot.nodes,
            edges: &snapshot.edges,
            layout: layered_positions(&visible),
            warnings: state.warnings().iter().map(|w| w.to_string()).collect(),
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else if snapshot.nodes.is_empty() {
        println!("no tasks");
    } else {
        for line in format_tree(&snapshot.nodes, &snapshot.edges) {
            println!("{}", line);
        }
    }
    Ok(())
}

fn cmd_show(args: ShowArgs, start: &Path, json: bool) -> CmdResult {
    let project = config_io::load_project(start)?;
    let session = load_session(&project)?;
    let state = session.state();
    let forest = state.forest();

    let task = forest
        .record(args.id)
        .ok_or_else(|| format!("task not found: {}", args.id))?;
    let progress = state.progress_for(args.id).unwrap_or(0.0);
    let ancestors: Vec<&TaskNode> = state
        .ancestors(args.id)
        .into_iter()
        .filter_map(|id| forest.record(id))
        .collect();

    if json {
        let out = ShowJson {
            task,
            progress,
            percent: crate::tree::progress::round_percent(progress),
            children: forest.children(args.id).to_vec(),
            ancestors,
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        for line in format_task_detail(task, progress, &ancestors) {
            println!("{}", line);
        }
        let children = forest.children(args.id);
        if !children.is_empty() {
            println!();
            println!("children:");
            for child in children.iter().filter_map(|id| forest.record(*id)) {
                println!("  {}", format_task_line(child));
            }
        }
    }
    Ok(())
}

fn cmd_leaves(start: &Path, json: bool) -> CmdResult {
    let project = config_io::load_project(start)?;
    let store = project.store();
    let leaves = store.list_actionable_leaves()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&leaves)?);
    } else if leaves.is_empty() {
        println!("nothing actionable");
    } else {
        let all = store.list_tasks()?;
        for line in format_leaves(&leaves, &all) {
            println!("{}", line);
        }
    }
    Ok(())
}

fn cmd_choose(start: &Path, json: bool) -> CmdResult {
    let project = config_io::load_project(start)?;
    let chosen = project.store().choose_actionable_task()?;

    match (json, &chosen) {
        (true, _) => println!("{}", serde_json::to_string_pretty(&chosen)?),
        (false, Some(scored)) => println!("{}", format_choice(scored)),
        (false, None) => println!("nothing actionable"),
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Write commands
// ---------------------------------------------------------------------------

fn cmd_add(args: AddArgs, start: &Path, json: bool) -> CmdResult {
    let project = config_io::load_project(start)?;
    let task = project.store().create_task(NewTask {
        title: args.title,
        parent_id: Some(args.parent),
        priority: args.priority,
        deadline: args.deadline,
    })?;
    print_task(&task, "added", json)
}

fn cmd_update(id: TaskId, patch: TaskPatch, start: &Path, json: bool) -> CmdResult {
    let project = config_io::load_project(start)?;
    let task = project.store().update_task(id, patch)?;
    print_task(&task, "updated", json)
}

fn cmd_toggle(id: TaskId, start: &Path, json: bool) -> CmdResult {
    let project = config_io::load_project(start)?;
    let store = project.store();
    let tasks = store.list_tasks()?;
    let current = task_ops::find_task(&tasks, id).ok_or(task_ops::TaskError::NotFound(id))?;
    let task = store.update_task(id, TaskPatch::completed(!current.is_completed))?;
    let verb = if task.is_completed { "done" } else { "reopened" };
    print_task(&task, verb, json)
}

fn cmd_delete(id: TaskId, start: &Path, json: bool) -> CmdResult {
    let project = config_io::load_project(start)?;
    let removed = project.store().delete_task(id)?;

    if json {
        let out = DeletedJson {
            deleted: removed.iter().map(|t| t.id).collect(),
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        let below = removed.len().saturating_sub(1);
        match below {
            0 => println!("deleted #{}", id),
            1 => println!("deleted #{} and 1 task below it", id),
            n => println!("deleted #{} and {} tasks below it", id, n),
        }
    }
    Ok(())
}
