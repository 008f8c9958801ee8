use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::store::{MacroStore, MergeStats, RefreshError};

const DEBOUNCE: Duration = Duration::from_millis(250);

#[derive(Debug, Clone)]
pub enum ReloadEvent {
    Reloaded(MergeStats),
    Failed(Arc<RefreshError>),
}

pub struct WatchHandle {
    pub join_handle: JoinHandle<()>,
    event_tx: broadcast::Sender<ReloadEvent>,
    /// Shared with the task, which re-arms it after every reload.
    _watcher: Arc<Mutex<RecommendedWatcher>>,
}

impl WatchHandle {
    pub fn subscribe(&self) -> broadcast::Receiver<ReloadEvent> {
        self.event_tx.subscribe()
    }
}

/// What a notify message means for the pending reload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Schedule,
    Ignore,
    Stop,
}

fn classify(message: Option<notify::Result<notify::Event>>) -> Step {
    match message {
        Some(Ok(event)) if is_relevant(&event.kind) => Step::Schedule,
        Some(Ok(_)) => Step::Ignore,
        // A dropped or overflowed event may hide a change, so reload anyway.
        Some(Err(err)) => {
            warn!("file watcher error: {err}");
            Step::Schedule
        }
        None => Step::Stop,
    }
}

fn is_relevant(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_) | EventKind::Other
    )
}

/// Directories to hand to notify for the given source paths.
///
/// Each source's parent is watched so that creating, deleting or recreating
/// the source itself is noticed; existing directories are watched directly
/// for changes to the files inside them.
fn watch_targets(paths: &[PathBuf]) -> BTreeSet<PathBuf> {
    let mut targets = BTreeSet::new();
    for path in paths {
        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        targets.insert(parent.to_path_buf());
        if path.is_dir() {
            targets.insert(path.clone());
        }
    }
    targets
}

fn arm(watcher: &Mutex<RecommendedWatcher>, paths: &[PathBuf]) {
    let mut watcher = watcher.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    for target in watch_targets(paths) {
        if !target.exists() {
            debug!(path = %target.display(), "not watching missing path");
            continue;
        }
        // inotify drops the watch when a directory is deleted; start over.
        let _ = watcher.unwatch(&target);
        if let Err(err) = watcher.watch(&target, RecursiveMode::NonRecursive) {
            warn!(path = %target.display(), "failed to watch: {err}");
        }
    }
}

/// Watches the macro directory and content pack, refreshing `store` once
/// changes have been quiet for a short debounce window.
pub fn watch_sources(paths: Vec<PathBuf>, store: Arc<MacroStore>) -> notify::Result<WatchHandle> {
    let (event_tx, _event_rx) = broadcast::channel(16);
    let (notify_tx, mut notify_rx) = mpsc::channel(16);

    let watcher = Arc::new(Mutex::new(notify::recommended_watcher(move |res| {
        let _ = notify_tx.blocking_send(res);
    })?));
    arm(&watcher, &paths);

    let task_tx = event_tx.clone();
    let task_watcher = Arc::clone(&watcher);
    let join_handle = tokio::spawn(async move {
        let mut deadline: Option<Instant> = None;
        loop {
            let message = match deadline {
                Some(at) => {
                    tokio::select! {
                        message = notify_rx.recv() => Some(message),
                        _ = tokio::time::sleep_until(at) => None,
                    }
                }
                None => Some(notify_rx.recv().await),
            };

            let Some(message) = message else {
                deadline = None;
                reload_store(&store, &task_tx);
                arm(&task_watcher, &paths);
                continue;
            };
            match classify(message) {
                Step::Schedule => deadline = Some(Instant::now() + DEBOUNCE),
                Step::Ignore => {}
                Step::Stop => break,
            }
        }
    });

    Ok(WatchHandle {
        join_handle,
        event_tx,
        _watcher: watcher,
    })
}

fn reload_store(store: &MacroStore, event_tx: &broadcast::Sender<ReloadEvent>) {
    let event = match store.refresh() {
        Ok(stats) => ReloadEvent::Reloaded(stats),
        Err(err) => ReloadEvent::Failed(Arc::new(err)),
    };
    let _ = event_tx.send(event);
}
