use std::io;
use std::path::Path;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

use crossterm::event::{self, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tracing::{debug, info, warn};

use crate::io::config_io::load_project;
use crate::io::store::TaskRepository;
use crate::io::watcher::StoreWatcher;
use crate::model::{NewTask, TaskId, TaskPatch, UiConfig};
use crate::tree::session::{Job, JobResult, Mutation, MutationDone};
use crate::tree::{Direction, RefreshOutcome, Session, TreeState};

use super::input;
use super::render;
use super::theme::Theme;

/// Log file under the data directory while the TUI owns the terminal
pub const LOG_FILE: &str = "fractal.log";

/// Current interaction mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Navigate,
    /// Typing a title into the status row
    Edit,
    /// Waiting for y/n on a delete
    Confirm,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditTarget {
    AddChild(TaskId),
    Rename(TaskId),
}

/// Single-line title editor. `cursor` counts chars, not bytes.
#[derive(Debug, Clone)]
pub struct EditState {
    pub target: EditTarget,
    pub buffer: String,
    pub cursor: usize,
}

impl EditState {
    pub fn new(target: EditTarget, initial: &str) -> Self {
        EditState {
            target,
            buffer: initial.to_string(),
            cursor: initial.chars().count(),
        }
    }

    fn byte_offset(&self) -> usize {
        self.buffer
            .char_indices()
            .nth(self.cursor)
            .map_or(self.buffer.len(), |(i, _)| i)
    }

    pub fn insert(&mut self, c: char) {
        let at = self.byte_offset();
        self.buffer.insert(at, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        let at = self.byte_offset();
        self.buffer.remove(at);
    }

    pub fn left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.buffer.chars().count());
    }

    pub fn home(&mut self) {
        self.cursor = 0;
    }

    pub fn end(&mut self) {
        self.cursor = self.buffer.chars().count();
    }
}

/// A delete waiting for confirmation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmDelete {
    pub id: TaskId,
    pub title: String,
    /// Number of descendants removed with it
    pub below: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub is_error: bool,
}

// ---------------------------------------------------------------------------
// Worker
// ---------------------------------------------------------------------------

/// Runs repository jobs one at a time on a background thread
pub struct Worker {
    jobs: Sender<Job>,
    results: Receiver<JobResult>,
}

impl Worker {
    pub fn spawn(repo: Arc<dyn TaskRepository>) -> Self {
        let (jobs, job_rx) = mpsc::channel::<Job>();
        let (result_tx, results) = mpsc::channel();
        thread::spawn(move || {
            for job in job_rx {
                if result_tx.send(job.run(repo.as_ref())).is_err() {
                    break;
                }
            }
            debug!("worker stopped");
        });
        Worker { jobs, results }
    }

    /// Hand a job to the worker, or give it back if the worker is gone
    fn submit(&self, job: Job) -> Result<(), Job> {
        self.jobs.send(job).map_err(|e| e.0)
    }

    fn try_recv(&self) -> Option<JobResult> {
        self.results.try_recv().ok()
    }

    #[cfg(test)]
    fn recv_timeout(&self, timeout: Duration) -> Option<JobResult> {
        self.results.recv_timeout(timeout).ok()
    }
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

/// Main application state
pub struct App {
    pub project_name: String,
    pub session: Session,
    pub theme: Theme,
    pub show_key_hints: bool,
    pub mode: Mode,
    pub edit: Option<EditState>,
    pub confirm: Option<ConfirmDelete>,
    pub status: Option<StatusMessage>,
    /// First outline row on screen
    pub scroll_offset: usize,
    pub should_quit: bool,
    worker: Worker,
    in_flight: usize,
}

impl App {
    pub fn new(project_name: impl Into<String>, session: Session, ui: &UiConfig) -> Self {
        let worker = Worker::spawn(session.repo());
        App {
            project_name: project_name.into(),
            session,
            theme: Theme::from_config(ui),
            show_key_hints: ui.show_key_hints,
            mode: Mode::Navigate,
            edit: None,
            confirm: None,
            status: None,
            scroll_offset: 0,
            should_quit: false,
            worker,
            in_flight: 0,
        }
    }

    pub fn state(&self) -> &TreeState {
        self.session.state()
    }

    pub fn focused(&self) -> Option<TaskId> {
        self.session.state().focused()
    }

    /// True while a job is queued or running
    pub fn busy(&self) -> bool {
        self.in_flight > 0
    }

    pub fn info(&mut self, text: impl Into<String>) {
        self.status = Some(StatusMessage {
            text: text.into(),
            is_error: false,
        });
    }

    pub fn error(&mut self, text: impl Into<String>) {
        self.status = Some(StatusMessage {
            text: text.into(),
            is_error: true,
        });
    }

    // -----------------------------------------------------------------------
    // Loading
    // -----------------------------------------------------------------------

    /// Blocking load, used before the first frame
    pub fn load(&mut self) {
        if let RefreshOutcome::Failed(msg) = self.session.refresh() {
            self.error(msg);
        }
        let warnings = self.state().warnings().len();
        if warnings > 0 {
            self.error(format!(
                "{} integrity warning(s), see {}",
                warnings, LOG_FILE
            ));
        }
        self.follow_focus();
    }

    /// Queue a mutation (or a plain re-fetch with `None`) on the worker
    pub fn submit(&mut self, mutation: Option<Mutation>) {
        let job = self.session.prepare(mutation);
        match self.worker.submit(job) {
            Ok(()) => self.in_flight += 1,
            Err(job) => {
                warn!("worker unavailable, running job inline");
                let result = job.run(self.session.repo().as_ref());
                self.apply_result(result);
            }
        }
    }

    pub fn refresh(&mut self) {
        self.submit(None);
    }

    /// Apply every finished job without blocking
    pub fn poll_worker(&mut self) {
        while let Some(result) = self.worker.try_recv() {
            self.in_flight = self.in_flight.saturating_sub(1);
            self.apply_result(result);
        }
    }

    /// Block until every queued job has come back
    #[cfg(test)]
    pub fn wait_for_jobs(&mut self) {
        while self.in_flight > 0 {
            let Some(result) = self.worker.recv_timeout(Duration::from_secs(5)) else {
                panic!("worker did not answer");
            };
            self.in_flight -= 1;
            self.apply_result(result);
        }
    }

    fn apply_result(&mut self, result: JobResult) {
        let report = self.session.finish(result);
        if let Some(msg) = report.error_message() {
            self.error(msg);
        } else if let Some(Ok(done)) = &report.mutation {
            self.info(describe(done));
        }
        self.follow_focus();
    }

    /// Hover tracks keyboard focus, and the focused node is never folded away
    fn follow_focus(&mut self) {
        let state = self.session.state_mut();
        let focused = state.focused();
        if let Some(id) = focused {
            state.reveal(id);
        }
        state.set_hover(focused);
    }

    // -----------------------------------------------------------------------
    // Navigation
    // -----------------------------------------------------------------------

    /// Move focus, staying inside the hoisted sub-tree
    pub fn move_focus(&mut self, direction: Direction) {
        let state = self.session.state_mut();
        let before = state.focused();
        state.move_focus(direction);
        if let (Some(hoisted), Some(now), Some(before)) = (state.hoisted(), state.focused(), before)
            && !state.ancestors(now).contains(&hoisted)
        {
            state.set_focus(before);
        }
        self.follow_focus();
    }

    pub fn toggle_fold(&mut self) {
        if let Some(id) = self.focused() {
            self.session.state_mut().toggle_fold(id);
        }
    }

    /// Hoist the focused node, or unhoist if it is already hoisted
    pub fn toggle_hoist(&mut self) {
        let Some(id) = self.focused() else { return };
        let state = self.session.state_mut();
        if state.hoisted() == Some(id) {
            state.set_hoist(None);
        } else {
            state.set_hoist(Some(id));
        }
        self.scroll_offset = 0;
    }

    pub fn expand_all(&mut self) {
        self.session.state_mut().expand_all();
    }

    pub fn collapse_all(&mut self) {
        self.session.state_mut().collapse_all();
        self.follow_focus();
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    pub fn toggle_complete(&mut self) {
        let Some(id) = self.focused() else { return };
        match self.session.toggle_patch(id) {
            Ok(patch) => self.submit(Some(Mutation::Update(id, patch))),
            Err(e) => self.error(e.to_string()),
        }
    }

    pub fn adjust_priority(&mut self, delta: i64) {
        let Some(id) = self.focused() else { return };
        let Some(current) = self.state().forest().record(id).map(|t| t.priority) else {
            return;
        };
        self.submit(Some(Mutation::Update(
            id,
            TaskPatch::priority(current.saturating_add(delta)),
        )));
    }

    pub fn begin_add(&mut self) {
        let Some(id) = self.focused() else { return };
        self.edit = Some(EditState::new(EditTarget::AddChild(id), ""));
        self.mode = Mode::Edit;
    }

    pub fn begin_rename(&mut self) {
        let Some(id) = self.focused() else { return };
        let Some(title) = self.state().forest().record(id).map(|t| t.title.clone()) else {
            return;
        };
        self.edit = Some(EditState::new(EditTarget::Rename(id), &title));
        self.mode = Mode::Edit;
    }

    pub fn submit_edit(&mut self) {
        self.mode = Mode::Navigate;
        let Some(edit) = self.edit.take() else { return };
        let mutation = match edit.target {
            EditTarget::AddChild(parent) => Mutation::Create(NewTask::child_of(parent, edit.buffer)),
            EditTarget::Rename(id) => Mutation::Update(id, TaskPatch::title(edit.buffer)),
        };
        self.submit(Some(mutation));
    }

    pub fn cancel_edit(&mut self) {
        self.edit = None;
        self.mode = Mode::Navigate;
    }

    pub fn begin_delete(&mut self) {
        let Some(id) = self.focused() else { return };
        let forest = self.state().forest();
        let Some(task) = forest.record(id) else { return };
        if task.is_root() {
            self.error("the root task can't be deleted");
            return;
        }
        self.confirm = Some(ConfirmDelete {
            id,
            title: task.title.clone(),
            below: forest.descendants(id).len(),
        });
        self.mode = Mode::Confirm;
    }

    pub fn confirm_delete(&mut self) {
        self.mode = Mode::Navigate;
        if let Some(pending) = self.confirm.take() {
            self.submit(Some(Mutation::Delete(pending.id)));
        }
    }

    pub fn cancel_delete(&mut self) {
        self.confirm = None;
        self.mode = Mode::Navigate;
    }

    /// Pick a task to work on next and jump to it
    pub fn choose(&mut self) {
        match self.session.choose() {
            Ok(Some(scored)) => {
                self.info(format!("next up: #{} {}", scored.task.id, scored.task.title));
                self.follow_focus();
            }
            Ok(None) => self.info("nothing actionable"),
            Err(e) => self.error(e.to_string()),
        }
    }
}

fn describe(done: &MutationDone) -> String {
    match done {
        MutationDone::Created(task) => format!("added #{} {}", task.id, task.title),
        MutationDone::Updated(task) => format!("updated #{} {}", task.id, task.title),
        MutationDone::Deleted(removed) => match removed.len() {
            1 => "deleted 1 task".to_string(),
            n => format!("deleted {} tasks", n),
        },
    }
}

// ---------------------------------------------------------------------------
// Terminal
// ---------------------------------------------------------------------------

/// Run the TUI against the project containing `start`
pub fn run(start: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let project = load_project(start)?;
    crate::logging::init_file(&project.data_dir.join(LOG_FILE))?;
    info!(store = %project.tasks_path().display(), "starting tui");

    let session = Session::new(Arc::new(project.store()));
    let mut app = App::new(project.name(), session, &project.config.ui);
    app.load();

    let watcher = match StoreWatcher::start(&project.data_dir) {
        Ok(w) => Some(w),
        Err(e) => {
            warn!(error = %e, "store watcher unavailable, external edits need a manual reload");
            None
        }
    };

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    // Install panic hook to restore terminal on panic
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    let result = run_event_loop(&mut terminal, &mut app, watcher.as_ref());

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    watcher: Option<&StoreWatcher>,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        app.poll_worker();
        if let Some(watcher) = watcher
            && watcher.poll_changed()
        {
            debug!("store changed on disk");
            app.refresh();
        }

        terminal.draw(|frame| render::render(frame, app))?;

        if event::poll(Duration::from_millis(100))?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            input::handle_key(app, key);
        }

        if app.should_quit {
            break;
        }
    }
    Ok(())
}
