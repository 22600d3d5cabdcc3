use std::fs;
use std::path::{Path, PathBuf};

use crate::io::recovery::{RecoveryCategory, RecoveryEntry, atomic_write, log_recovery};
use crate::io::store::{JsonStore, RepoError, StoreSettings, TASKS_FILE, TaskRepository};
use crate::model::config::Config;
use crate::model::task::{NewTask, TaskNode};

/// Directory under the project root holding config, store and logs
pub const DATA_DIR: &str = "fractal";
pub const CONFIG_FILE: &str = "config.toml";

const CONFIG_TEMPLATE: &str = r##"[project]
name = ""

[tasks]
# priority for tasks added without one
default_priority = 1

# Scoring for `ft choose`:
#   priority * priority_weight + age_in_days * age_weight + random(0, jitter)
[choose]
priority_weight = 10.0
age_weight = 2.0
jitter = 5.0

[ui]
show_key_hints = true

# Uncomment to override theme colors.
# [ui.colors]
# background = "#0C001B"
# text = "#B0AAFF"
# text_bright = "#FFFFFF"
# highlight = "#FB4196"
# dim = "#7D78BF"
# done = "#44FF88"
# pending = "#FFD700"
# red = "#FF4444"
"##;

/// Error type for project discovery and config I/O
#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    #[error("not a fractal project: no fractal/config.toml found")]
    NotAProject,
    #[error("fractal project already exists in {0}")]
    AlreadyInitialized(PathBuf),
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse config.toml: {0}")]
    ConfigParse(#[from] toml::de::Error),
    #[error("invalid config template: {0}")]
    Template(#[from] toml_edit::TomlError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// A located project: root directory, its data directory and config
#[derive(Debug, Clone)]
pub struct Project {
    pub root: PathBuf,
    pub data_dir: PathBuf,
    pub config: Config,
}

impl Project {
    pub fn store(&self) -> JsonStore {
        JsonStore::new(&self.data_dir, StoreSettings::from(&self.config))
    }

    pub fn tasks_path(&self) -> PathBuf {
        self.data_dir.join(TASKS_FILE)
    }

    /// Display name, falling back to the root directory name
    pub fn name(&self) -> String {
        if !self.config.project.name.is_empty() {
            return self.config.project.name.clone();
        }
        self.root
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("fractal")
            .to_string()
    }
}

/// Walk up from `start` looking for `fractal/config.toml`.
pub fn discover_project(start: &Path) -> Result<PathBuf, ProjectError> {
    let mut current = start.to_path_buf();
    loop {
        if current.join(DATA_DIR).join(CONFIG_FILE).is_file() {
            return Ok(current);
        }
        if !current.pop() {
            return Err(ProjectError::NotAProject);
        }
    }
}

pub fn load_config(data_dir: &Path) -> Result<Config, ProjectError> {
    let path = data_dir.join(CONFIG_FILE);
    let text = fs::read_to_string(&path).map_err(|source| ProjectError::Read { path, source })?;
    Ok(toml::from_str(&text)?)
}

/// Locate the project containing `start` and read its config.
pub fn load_project(start: &Path) -> Result<Project, ProjectError> {
    let root = discover_project(start)?;
    let data_dir = root.join(DATA_DIR);
    let config = load_config(&data_dir)?;
    Ok(Project {
        root,
        data_dir,
        config,
    })
}

/// The config template with the project name filled in. Comments survive.
pub fn render_config(name: &str) -> Result<String, ProjectError> {
    let mut doc: toml_edit::DocumentMut = CONFIG_TEMPLATE.parse()?;
    doc["project"]["name"] = toml_edit::value(name);
    Ok(doc.to_string())
}

/// Create `fractal/` under `root` with a config file and a store holding a
/// single root task named after the project. Returns the root task.
///
/// With `force`, an existing config is rewritten and an existing store is
/// replaced.
pub fn init_project(root: &Path, name: &str, force: bool) -> Result<TaskNode, ProjectError> {
    let data_dir = root.join(DATA_DIR);
    let config_path = data_dir.join(CONFIG_FILE);
    if config_path.exists() && !force {
        return Err(ProjectError::AlreadyInitialized(data_dir));
    }

    fs::create_dir_all(&data_dir).map_err(|source| ProjectError::Write {
        path: data_dir.clone(),
        source,
    })?;
    atomic_write(&config_path, render_config(name)?.as_bytes()).map_err(|source| {
        ProjectError::Write {
            path: config_path.clone(),
            source,
        }
    })?;

    let tasks_path = data_dir.join(TASKS_FILE);
    if let Ok(previous) = fs::read_to_string(&tasks_path) {
        log_recovery(
            &data_dir,
            RecoveryEntry::new(RecoveryCategory::Delete, "store replaced by init --force")
                .field("Target", tasks_path.display())
                .body(previous),
        );
        fs::remove_file(&tasks_path).map_err(|source| ProjectError::Write {
            path: tasks_path.clone(),
            source,
        })?;
    }

    let config = load_config(&data_dir)?;
    let store = JsonStore::new(&data_dir, StoreSettings::from(&config));
    Ok(store.create_task(NewTask::root(name))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_render_config_sets_name_and_keeps_comments() {
        let text = render_config("Garden \"plan\"").unwrap();
        assert!(text.contains("# priority for tasks added without one"));
        let config: Config = toml::from_str(&text).unwrap();
        assert_eq!(config.project.name, "Garden \"plan\"");
        assert_eq!(config.tasks.default_priority, 1);
        assert_eq!(config.choose.priority_weight, 10.0);
    }

    #[test]
    fn test_init_creates_store_with_root() {
        let tmp = TempDir::new().unwrap();
        let root = init_project(tmp.path(), "Life", false).unwrap();
        assert_eq!(root.id, 1);
        assert_eq!(root.title, "Life");
        assert!(root.parent_id.is_none());

        let project = load_project(tmp.path()).unwrap();
        assert_eq!(project.name(), "Life");
        let tasks = project.store().list_tasks().unwrap();
        assert_eq!(tasks.len(), 1);
    }

    #[test]
    fn test_init_twice_needs_force() {
        let tmp = TempDir::new().unwrap();
        init_project(tmp.path(), "Life", false).unwrap();
        assert!(matches!(
            init_project(tmp.path(), "Life", false),
            Err(ProjectError::AlreadyInitialized(_))
        ));
        let root = init_project(tmp.path(), "Work", true).unwrap();
        assert_eq!(root.title, "Work");
        let project = load_project(tmp.path()).unwrap();
        assert_eq!(project.store().list_tasks().unwrap().len(), 1);
        let log = fs::read_to_string(project.data_dir.join(".recovery.log")).unwrap();
        assert!(log.contains("store replaced by init --force"));
    }

    #[test]
    fn test_discover_walks_up() {
        let tmp = TempDir::new().unwrap();
        init_project(tmp.path(), "Life", false).unwrap();
        let nested = tmp.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();
        assert_eq!(discover_project(&nested).unwrap(), tmp.path());
    }

    #[test]
    fn test_discover_without_project() {
        let tmp = TempDir::new().unwrap();
        // a bare fractal/ without config is not a project
        fs::create_dir_all(tmp.path().join(DATA_DIR)).unwrap();
        assert!(matches!(
            discover_project(tmp.path()),
            Err(ProjectError::NotAProject)
        ));
    }

    #[test]
    fn test_bad_config_is_parse_error() {
        let tmp = TempDir::new().unwrap();
        let data_dir = tmp.path().join(DATA_DIR);
        fs::create_dir_all(&data_dir).unwrap();
        fs::write(data_dir.join(CONFIG_FILE), "[tasks]\ndefault_priority = \"high\"\n").unwrap();
        assert!(matches!(
            load_project(tmp.path()),
            Err(ProjectError::ConfigParse(_))
        ));
    }
}
