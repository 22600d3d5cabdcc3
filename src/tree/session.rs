use std::sync::Arc;

use tracing::{debug, warn};

use crate::io::store::{RepoError, TaskRepository};
use crate::model::task::{NewTask, TaskId, TaskNode, TaskPatch};
use crate::ops::choose::ScoredTask;
use crate::ops::task_ops::TaskError;

use super::controller::{RefreshOutcome, RefreshToken, TreeState};

/// A change to send to the repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Create(NewTask),
    Update(TaskId, TaskPatch),
    Delete(TaskId),
}

/// What a successful mutation returned
#[derive(Debug, Clone, PartialEq)]
pub enum MutationDone {
    Created(TaskNode),
    Updated(TaskNode),
    Deleted(Vec<TaskNode>),
}

impl Mutation {
    fn apply(self, repo: &dyn TaskRepository) -> Result<MutationDone, RepoError> {
        match self {
            Mutation::Create(new) => repo.create_task(new).map(MutationDone::Created),
            Mutation::Update(id, patch) => repo.update_task(id, patch).map(MutationDone::Updated),
            Mutation::Delete(id) => repo.delete_task(id).map(MutationDone::Deleted),
        }
    }
}

/// An optional mutation followed by a full re-fetch. Runs without touching
/// the tree state, so it can be moved to another thread.
#[derive(Debug)]
pub struct Job {
    pub token: RefreshToken,
    pub mutation: Option<Mutation>,
}

#[derive(Debug)]
pub struct JobResult {
    pub token: RefreshToken,
    pub mutation: Option<Result<MutationDone, RepoError>>,
    pub records: Result<Vec<TaskNode>, RepoError>,
}

impl Job {
    pub fn run(self, repo: &dyn TaskRepository) -> JobResult {
        let mutation = self.mutation.map(|m| m.apply(repo));
        if let Some(Err(e)) = &mutation {
            warn!(error = %e, "mutation failed");
        }
        // refetch even after a failed mutation so pending marks resolve
        JobResult {
            token: self.token,
            mutation,
            records: repo.list_tasks(),
        }
    }
}

/// How a job ended, as seen by the caller
#[derive(Debug)]
pub struct JobReport {
    pub refresh: RefreshOutcome,
    pub mutation: Option<Result<MutationDone, RepoError>>,
}

impl JobReport {
    /// First error worth showing to the user
    pub fn error_message(&self) -> Option<String> {
        if let Some(Err(e)) = &self.mutation {
            return Some(e.to_string());
        }
        match &self.refresh {
            RefreshOutcome::Failed(msg) => Some(msg.clone()),
            _ => None,
        }
    }
}

/// A tree state bound to the repository it loads from.
///
/// Every mutation is followed by a full refresh; nothing is applied to the
/// forest optimistically.
pub struct Session {
    repo: Arc<dyn TaskRepository>,
    state: TreeState,
}

impl Session {
    pub fn new(repo: Arc<dyn TaskRepository>) -> Self {
        Session {
            repo,
            state: TreeState::new(),
        }
    }

    pub fn repo(&self) -> Arc<dyn TaskRepository> {
        Arc::clone(&self.repo)
    }

    pub fn state(&self) -> &TreeState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut TreeState {
        &mut self.state
    }

    // -----------------------------------------------------------------------
    // Jobs
    // -----------------------------------------------------------------------

    /// Issue a refresh token and mark a pending completion toggle, if any.
    pub fn prepare(&mut self, mutation: Option<Mutation>) -> Job {
        if let Some(Mutation::Update(id, patch)) = &mutation
            && patch.is_completed.is_some()
        {
            self.state.mark_pending_toggle(*id);
        }
        Job {
            token: self.state.begin_refresh(),
            mutation,
        }
    }

    /// Apply a finished job's records and follow up on its mutation.
    pub fn finish(&mut self, result: JobResult) -> JobReport {
        let refresh = self.state.complete_refresh(result.token, result.records);
        if refresh == RefreshOutcome::Applied
            && let Some(Ok(done)) = &result.mutation
        {
            self.follow_up(done);
        }
        JobReport {
            refresh,
            mutation: result.mutation,
        }
    }

    /// Run a job on the calling thread
    pub fn run(&mut self, mutation: Option<Mutation>) -> JobReport {
        let job = self.prepare(mutation);
        let result = job.run(self.repo.as_ref());
        self.finish(result)
    }

    fn follow_up(&mut self, done: &MutationDone) {
        match done {
            MutationDone::Created(task) => self.focus_created(task),
            MutationDone::Deleted(removed) => self.focus_after_delete(removed),
            MutationDone::Updated(_) => {}
        }
    }

    fn focus_created(&mut self, task: &TaskNode) {
        self.state.reveal(task.id);
        self.state.set_focus(task.id);
    }

    fn focus_after_delete(&mut self, removed: &[TaskNode]) {
        if let Some(parent) = removed.first().and_then(|t| t.parent_id) {
            self.state.set_focus(parent);
        }
    }

    /// Refresh after a synchronous mutation. True when the refresh applied.
    fn settle<T>(&mut self, result: &Result<T, RepoError>) -> bool {
        if let Err(e) = result {
            warn!(error = %e, "mutation failed");
        }
        self.refresh() == RefreshOutcome::Applied
    }

    // -----------------------------------------------------------------------
    // Operations
    // -----------------------------------------------------------------------

    pub fn refresh(&mut self) -> RefreshOutcome {
        self.run(None).refresh
    }

    pub fn add_child(&mut self, new: NewTask) -> Result<TaskNode, RepoError> {
        let result = self.repo.create_task(new);
        if self.settle(&result)
            && let Ok(task) = &result
        {
            self.focus_created(task);
        }
        result
    }

    pub fn update(&mut self, id: TaskId, patch: TaskPatch) -> Result<TaskNode, RepoError> {
        if patch.is_completed.is_some() {
            self.state.mark_pending_toggle(id);
        }
        let result = self.repo.update_task(id, patch);
        self.settle(&result);
        result
    }

    pub fn rename(&mut self, id: TaskId, title: &str) -> Result<TaskNode, RepoError> {
        self.update(id, TaskPatch::title(title))
    }

    pub fn set_priority(&mut self, id: TaskId, priority: i64) -> Result<TaskNode, RepoError> {
        self.update(id, TaskPatch::priority(priority))
    }

    /// Flip completion of `id` based on the last loaded record.
    pub fn toggle_complete(&mut self, id: TaskId) -> Result<TaskNode, RepoError> {
        let patch = self.toggle_patch(id)?;
        self.update(id, patch)
    }

    /// The patch that flips completion of `id`
    pub fn toggle_patch(&self, id: TaskId) -> Result<TaskPatch, RepoError> {
        let record = self
            .state
            .forest()
            .record(id)
            .ok_or(TaskError::NotFound(id))?;
        Ok(TaskPatch::completed(!record.is_completed))
    }

    pub fn delete(&mut self, id: TaskId) -> Result<Vec<TaskNode>, RepoError> {
        let result = self.repo.delete_task(id);
        if self.settle(&result)
            && let Ok(removed) = &result
        {
            self.focus_after_delete(removed);
        }
        result
    }

    /// Ask the repository for a task to work on and focus it.
    pub fn choose(&mut self) -> Result<Option<ScoredTask>, RepoError> {
        let chosen = self.repo.choose_actionable_task()?;
        if let Some(scored) = &chosen {
            debug!(id = scored.task.id, score = scored.score, "task chosen");
            self.state.reveal(scored.task.id);
            self.state.set_focus(scored.task.id);
        }
        Ok(chosen)
    }
}
