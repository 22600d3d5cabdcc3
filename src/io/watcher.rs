use std::path::{Path, PathBuf};
use std::sync::mpsc;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use crate::io::store::TASKS_FILE;

/// Sent when the task store changes on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreChanged(pub Vec<PathBuf>);

/// Watches the data directory for edits to `tasks.json`, including the
/// rename that completes an atomic write.
pub struct StoreWatcher {
    _watcher: RecommendedWatcher,
    rx: mpsc::Receiver<StoreChanged>,
}

impl StoreWatcher {
    pub fn start(data_dir: &Path) -> Result<Self, notify::Error> {
        let (tx, rx) = mpsc::channel();
        let data_dir_owned = data_dir.to_path_buf();

        let mut watcher = RecommendedWatcher::new(
            move |result: Result<Event, notify::Error>| {
                let Ok(event) = result else {
                    return;
                };
                let relevant = relevant_paths(&data_dir_owned, event);
                if !relevant.is_empty() {
                    let _ = tx.send(StoreChanged(relevant));
                }
            },
            Config::default(),
        )?;

        watcher.watch(data_dir, RecursiveMode::NonRecursive)?;
        Ok(StoreWatcher {
            _watcher: watcher,
            rx,
        })
    }

    /// True when at least one change arrived since the last poll. Drains the
    /// queue so a burst of events causes one refresh.
    pub fn poll_changed(&self) -> bool {
        let mut changed = false;
        while self.rx.try_recv().is_ok() {
            changed = true;
        }
        changed
    }
}

fn relevant_paths(data_dir: &Path, event: Event) -> Vec<PathBuf> {
    match event.kind {
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) => {}
        _ => return Vec::new(),
    }
    event
        .paths
        .into_iter()
        .filter(|p| {
            p.starts_with(data_dir)
                && p.file_name().and_then(|n| n.to_str()) == Some(TASKS_FILE)
        })
        .collect()
}
