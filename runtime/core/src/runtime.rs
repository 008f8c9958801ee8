use std::sync::Arc;

use notify::Error as NotifyError;
use tokio::task::JoinHandle;
use tracing::{debug, error};

use crate::config::Settings;
use crate::console::{ConsoleManager, ConsoleOutcome};
use crate::runner::CommandSink;
use crate::sources::{ContentPackSource, EmptySource, MacroDir, SecondarySource};
use crate::store::{MacroStore, MergeStats, RefreshError};
use crate::watch::{watch_sources, ReloadEvent, WatchHandle};

#[derive(thiserror::Error, Debug)]
pub enum RuntimeManagerError {
    #[error("invalid settings: {0}")]
    Settings(#[from] crate::config::SettingsError),
    #[error("watch error: {0}")]
    Watch(#[from] NotifyError),
}

/// Host lifecycle events that rebuild the macro table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostEvent {
    Launched,
    SaveLoaded,
}

#[derive(Debug)]
pub enum LineOutcome {
    Console(ConsoleOutcome),
    /// Not addressed to the macro command; handed to the sink as-is.
    Forwarded,
    Ignored,
}

pub struct RuntimeManager<S: CommandSink + 'static> {
    pub store: Arc<MacroStore>,
    pub console: ConsoleManager<S>,
    sink: Arc<S>,
    watch: Option<WatchHandle>,
    listener: Option<JoinHandle<()>>,
}

impl<S: CommandSink + 'static> RuntimeManager<S> {
    /// Wires store, console and (optionally) the watcher. The table stays
    /// empty until the host sends its first [`HostEvent`].
    pub async fn initialize(settings: Settings, sink: Arc<S>) -> Result<Self, RuntimeManagerError> {
        settings.validate()?;
        let secondary: Box<dyn SecondarySource> = match &settings.content_pack {
            Some(path) => Box::new(ContentPackSource::new(path)),
            None => Box::new(EmptySource),
        };
        let store = Arc::new(MacroStore::new(
            Box::new(MacroDir::new(&settings.macros_dir)),
            secondary,
        ));
        let console = ConsoleManager::new(settings.command.clone(), store.clone(), sink.clone());

        let (watch, listener) = if settings.watch {
            let mut paths = vec![settings.macros_dir.clone()];
            paths.extend(settings.content_pack.clone());
            let watch = watch_sources(paths, store.clone())?;
            let mut rx = watch.subscribe();
            let listener = tokio::spawn(async move {
                while let Ok(event) = rx.recv().await {
                    match event {
                        ReloadEvent::Reloaded(stats) => debug!(total = stats.total, "macros reloaded"),
                        ReloadEvent::Failed(err) => error!("Failed to reload macros: {err}"),
                    }
                }
            });
            (Some(watch), Some(listener))
        } else {
            (None, None)
        };

        Ok(Self {
            store,
            console,
            sink,
            watch,
            listener,
        })
    }

    pub fn handle_event(&self, event: HostEvent) -> Result<MergeStats, RefreshError> {
        debug!(?event, "refreshing macros");
        self.store.refresh()
    }

    /// Routes one console line: the macro command goes to the console,
    /// anything else is forwarded to the sink.
    pub fn handle_line(&self, line: &str) -> Result<LineOutcome, RefreshError> {
        let mut tokens = line.split_whitespace();
        let Some(first) = tokens.next() else {
            return Ok(LineOutcome::Ignored);
        };
        if first == self.console.command() {
            let args: Vec<&str> = tokens.collect();
            return Ok(LineOutcome::Console(self.console.handle(&args)?));
        }
        let command = line.trim();
        if let Err(err) = self.sink.dispatch(command) {
            error!("Failed to execute command: \"{command}\": {err}");
        }
        Ok(LineOutcome::Forwarded)
    }

    pub fn shutdown(self) {
        if let Some(watch) = self.watch {
            watch.join_handle.abort();
        }
        if let Some(listener) = self.listener {
            listener.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::QueueSink;
    use std::fs;
    use std::time::Duration;

    fn settings_for(dir: &std::path::Path, watch: bool) -> Settings {
        let content = dir.join("content.yaml");
        fs::write(
            &content,
            "version: 1\nmacros:\n  morning:\n    lines: [\"world_settime 600\", \"warp farm\"]\n",
        )
        .expect("write pack");
        let macros_dir = dir.join("Macros");
        fs::create_dir(&macros_dir).expect("mkdir");
        fs::write(macros_dir.join("morning.txt"), "say overridden").expect("write macro");
        fs::write(macros_dir.join("night.txt"), "world_settime 2200").expect("write macro");
        Settings {
            macros_dir,
            content_pack: Some(content),
            watch,
            ..Settings::default()
        }
    }

    #[tokio::test]
    async fn launch_event_loads_both_sources() {
        let dir = tempfile::tempdir().expect("temp dir");
        let sink = Arc::new(QueueSink::new());
        let manager = RuntimeManager::initialize(settings_for(dir.path(), false), sink.clone())
            .await
            .expect("init");
        assert!(manager.store.list().is_empty());

        let stats = manager.handle_event(HostEvent::Launched).expect("refresh");
        assert_eq!(stats.total, 2);
        assert_eq!(stats.overridden, 1);

        manager.handle_line("macro run morning night").expect("line");
        assert_eq!(
            sink.drain(),
            vec![
                "world_settime 600".to_string(),
                "warp farm".to_string(),
                "world_settime 2200".to_string(),
            ]
        );
        manager.shutdown();
    }

    #[tokio::test]
    async fn other_lines_are_forwarded() {
        let dir = tempfile::tempdir().expect("temp dir");
        let sink = Arc::new(QueueSink::new());
        let manager = RuntimeManager::initialize(settings_for(dir.path(), false), sink.clone())
            .await
            .expect("init");

        assert!(matches!(
            manager.handle_line("  debug warp farm  ").expect("line"),
            LineOutcome::Forwarded
        ));
        assert!(matches!(manager.handle_line("   ").expect("line"), LineOutcome::Ignored));
        assert_eq!(sink.drain(), vec!["debug warp farm".to_string()]);
    }

    #[tokio::test]
    async fn missing_directory_fails_refresh_only() {
        let dir = tempfile::tempdir().expect("temp dir");
        let settings = Settings {
            macros_dir: dir.path().join("absent"),
            ..Settings::default()
        };
        let manager = RuntimeManager::initialize(settings, Arc::new(QueueSink::new()))
            .await
            .expect("init");
        assert!(manager.handle_event(HostEvent::SaveLoaded).is_err());
        assert!(manager.handle_line("macro reload").is_err());
        assert!(matches!(
            manager.handle_line("macro list").expect("line"),
            LineOutcome::Console(ConsoleOutcome::Listed(ref names)) if names.is_empty()
        ));
    }

    #[tokio::test]
    async fn runtime_manager_tracks_file_changes() {
        let dir = tempfile::tempdir().expect("temp dir");
        let settings = settings_for(dir.path(), true);
        let macros_dir = settings.macros_dir.clone();
        let manager = RuntimeManager::initialize(settings, Arc::new(QueueSink::new()))
            .await
            .expect("init");
        manager.handle_event(HostEvent::Launched).expect("refresh");

        fs::write(macros_dir.join("dawn.txt"), "world_settime 600").expect("write macro");
        tokio::time::sleep(Duration::from_secs(2)).await;

        assert!(manager.store.list().iter().any(|name| name == "dawn"));
        manager.shutdown();
    }
}
