use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::io::lock::{DEFAULT_LOCK_TIMEOUT, LockError, StoreLock};
use crate::io::recovery::{atomic_write, log_task_deletion, log_write_failure};
use crate::model::config::{ChooseConfig, Config};
use crate::model::task::{DEFAULT_PRIORITY, NewTask, TaskId, TaskNode, TaskPatch};
use crate::ops::choose::{ScoredTask, actionable_leaves, choose_actionable};
use crate::ops::task_ops::{self, TaskError};

/// File name of the task store inside the data directory
pub const TASKS_FILE: &str = "tasks.json";

/// Error type for repository calls
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error(transparent)]
    Task(#[from] TaskError),
    #[error(transparent)]
    Lock(#[from] LockError),
    #[error("could not read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("could not write {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
    #[error("{path} is not a valid task store: {source}")]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl RepoError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, RepoError::Task(TaskError::NotFound(_)))
    }
}

/// The persistence boundary the tree engine talks to.
///
/// `list_tasks` is ascending by id. `delete_task` removes the whole subtree
/// and returns the removed records.
pub trait TaskRepository: Send + Sync {
    fn list_tasks(&self) -> Result<Vec<TaskNode>, RepoError>;
    fn list_actionable_leaves(&self) -> Result<Vec<TaskNode>, RepoError>;
    fn create_task(&self, new: NewTask) -> Result<TaskNode, RepoError>;
    fn update_task(&self, id: TaskId, patch: TaskPatch) -> Result<TaskNode, RepoError>;
    fn delete_task(&self, id: TaskId) -> Result<Vec<TaskNode>, RepoError>;
    fn choose_actionable_task(&self) -> Result<Option<ScoredTask>, RepoError>;
}

/// Per-project knobs the stores need
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StoreSettings {
    pub default_priority: i64,
    pub choose: ChooseConfig,
}

impl Default for StoreSettings {
    fn default() -> Self {
        StoreSettings {
            default_priority: DEFAULT_PRIORITY,
            choose: ChooseConfig::default(),
        }
    }
}

impl From<&Config> for StoreSettings {
    fn from(config: &Config) -> Self {
        StoreSettings {
            default_priority: config.tasks.default_priority,
            choose: config.choose,
        }
    }
}

/// On-disk shape of `tasks.json`
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreFile {
    #[serde(default)]
    next_id: TaskId,
    #[serde(default)]
    tasks: Vec<TaskNode>,
}

impl StoreFile {
    fn allocate_id(&mut self) -> TaskId {
        let id = self.next_id.max(task_ops::next_id(&self.tasks));
        self.next_id = id + 1;
        id
    }
}

fn sorted(mut tasks: Vec<TaskNode>) -> Vec<TaskNode> {
    tasks.sort_by_key(|t| t.id);
    tasks
}

// ---------------------------------------------------------------------------
// JsonStore
// ---------------------------------------------------------------------------

/// File-backed repository at `<data_dir>/tasks.json`.
///
/// Reads take no lock. Each mutation locks the data directory, re-reads the
/// file, applies the change and replaces the file atomically.
#[derive(Debug, Clone)]
pub struct JsonStore {
    data_dir: PathBuf,
    settings: StoreSettings,
    lock_timeout: Duration,
}

impl JsonStore {
    pub fn new(data_dir: impl Into<PathBuf>, settings: StoreSettings) -> Self {
        JsonStore {
            data_dir: data_dir.into(),
            settings,
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }

    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    pub fn path(&self) -> PathBuf {
        self.data_dir.join(TASKS_FILE)
    }

    /// A missing file is an empty store.
    fn read_file(&self) -> Result<StoreFile, RepoError> {
        let path = self.path();
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(StoreFile::default()),
            Err(source) => return Err(RepoError::Read { path, source }),
        };
        serde_json::from_str(&text).map_err(|source| RepoError::Corrupt { path, source })
    }

    fn write_file(&self, file: &StoreFile) -> Result<(), RepoError> {
        let path = self.path();
        let content = serde_json::to_string_pretty(file).map_err(|e| RepoError::Write {
            path: path.clone(),
            source: io::Error::other(e),
        })?;
        if let Err(source) = atomic_write(&path, content.as_bytes()) {
            warn!(path = %path.display(), error = %source, "task store write failed");
            log_write_failure(&self.data_dir, &path, &source, &content);
            return Err(RepoError::Write { path, source });
        }
        Ok(())
    }

    fn mutate<T>(
        &self,
        f: impl FnOnce(&mut StoreFile) -> Result<T, TaskError>,
    ) -> Result<T, RepoError> {
        let lock = StoreLock::acquire(&self.data_dir, self.lock_timeout)?;
        debug!(lock = %lock.path().display(), "store locked");
        let mut file = self.read_file()?;
        let out = f(&mut file)?;
        self.write_file(&file)?;
        drop(lock);
        Ok(out)
    }
}

impl TaskRepository for JsonStore {
    fn list_tasks(&self) -> Result<Vec<TaskNode>, RepoError> {
        Ok(sorted(self.read_file()?.tasks))
    }

    fn list_actionable_leaves(&self) -> Result<Vec<TaskNode>, RepoError> {
        Ok(actionable_leaves(&self.list_tasks()?))
    }

    fn create_task(&self, new: NewTask) -> Result<TaskNode, RepoError> {
        let default_priority = self.settings.default_priority;
        let task = self.mutate(|file| {
            let id = file.allocate_id();
            task_ops::create_task(&mut file.tasks, id, new, default_priority)
        })?;
        debug!(id = task.id, parent = ?task.parent_id, "task created");
        Ok(task)
    }

    fn update_task(&self, id: TaskId, patch: TaskPatch) -> Result<TaskNode, RepoError> {
        let task = self.mutate(|file| task_ops::update_task(&mut file.tasks, id, patch))?;
        debug!(id, "task updated");
        Ok(task)
    }

    fn delete_task(&self, id: TaskId) -> Result<Vec<TaskNode>, RepoError> {
        let removed = self.mutate(|file| task_ops::delete_task(&mut file.tasks, id))?;
        debug!(id, removed = removed.len(), "task deleted");
        log_task_deletion(&self.data_dir, id, &removed);
        Ok(removed)
    }

    fn choose_actionable_task(&self) -> Result<Option<ScoredTask>, RepoError> {
        let tasks = self.list_tasks()?;
        Ok(choose_actionable(
            &tasks,
            Utc::now(),
            &self.settings.choose,
            &mut rand::thread_rng(),
        ))
    }
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// In-process repository. Same semantics as [`JsonStore`] without a file.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<StoreFile>,
    settings: StoreSettings,
}

impl MemoryStore {
    pub fn new(settings: StoreSettings) -> Self {
        MemoryStore {
            inner: Mutex::new(StoreFile::default()),
            settings,
        }
    }

    /// Start from existing records (ids kept as given)
    pub fn with_tasks(tasks: Vec<TaskNode>) -> Self {
        let mut file = StoreFile { next_id: 0, tasks };
        file.next_id = task_ops::next_id(&file.tasks);
        MemoryStore {
            inner: Mutex::new(file),
            settings: StoreSettings::default(),
        }
    }

    fn state(&self) -> MutexGuard<'_, StoreFile> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TaskRepository for MemoryStore {
    fn list_tasks(&self) -> Result<Vec<TaskNode>, RepoError> {
        Ok(sorted(self.state().tasks.clone()))
    }

    fn list_actionable_leaves(&self) -> Result<Vec<TaskNode>, RepoError> {
        Ok(actionable_leaves(&self.list_tasks()?))
    }

    fn create_task(&self, new: NewTask) -> Result<TaskNode, RepoError> {
        let mut state = self.state();
        let id = state.next_id.max(task_ops::next_id(&state.tasks));
        let task =
            task_ops::create_task(&mut state.tasks, id, new, self.settings.default_priority)?;
        state.next_id = id + 1;
        Ok(task)
    }

    fn update_task(&self, id: TaskId, patch: TaskPatch) -> Result<TaskNode, RepoError> {
        Ok(task_ops::update_task(&mut self.state().tasks, id, patch)?)
    }

    fn delete_task(&self, id: TaskId) -> Result<Vec<TaskNode>, RepoError> {
        Ok(task_ops::delete_task(&mut self.state().tasks, id)?)
    }

    fn choose_actionable_task(&self) -> Result<Option<ScoredTask>, RepoError> {
        let tasks = self.list_tasks()?;
        Ok(choose_actionable(
            &tasks,
            Utc::now(),
            &self.settings.choose,
            &mut rand::thread_rng(),
        ))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
