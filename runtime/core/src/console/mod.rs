//! The `macro` console command: argument parsing and dispatch to store/runner.

use std::sync::Arc;

use tracing::info;

use crate::runner::{CommandSink, MacroRunner, RunReport};
use crate::store::{MacroStore, MergeStats, RefreshError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Run(Vec<String>),
    List,
    Reload,
    Help,
}

impl ConsoleCommand {
    /// Parses the arguments following the command name.
    pub fn parse<A: AsRef<str>>(args: &[A]) -> Self {
        let first: Option<&str> = args.first().map(|a| a.as_ref());
        match first {
            Some("run") => Self::Run(args[1..].iter().map(|a| a.as_ref().to_string()).collect()),
            Some("list") => Self::List,
            Some("reload") => Self::Reload,
            _ => Self::Help,
        }
    }
}

#[derive(Debug)]
pub enum ConsoleOutcome {
    Ran(RunReport),
    Listed(Vec<String>),
    Reloaded(MergeStats),
    Help(String),
}

#[derive(Debug)]
pub struct ConsoleManager<S: CommandSink + 'static> {
    command: String,
    store: Arc<MacroStore>,
    runner: MacroRunner<S>,
}

impl<S: CommandSink + 'static> ConsoleManager<S> {
    pub fn new(command: impl Into<String>, store: Arc<MacroStore>, sink: Arc<S>) -> Self {
        let runner = MacroRunner::new(store.clone(), sink);
        Self {
            command: command.into(),
            store,
            runner,
        }
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn help_text(&self) -> String {
        let cmd = &self.command;
        format!(
            "Base command for console macro execution and debugging.\n\nCommands:\n {cmd} run <macro> [<macro> ...]\n {cmd} list\n {cmd} reload\n"
        )
    }

    /// Handles one invocation. Only a failed reload is returned as an error;
    /// everything else is reported through the log.
    pub fn handle<A: AsRef<str>>(&self, args: &[A]) -> Result<ConsoleOutcome, RefreshError> {
        match ConsoleCommand::parse(args) {
            ConsoleCommand::Run(names) => Ok(ConsoleOutcome::Ran(self.runner.run(&names))),
            ConsoleCommand::List => {
                let names = self.runner.list();
                info!("Available macros:\n\n {}", names.join(", "));
                Ok(ConsoleOutcome::Listed(names))
            }
            ConsoleCommand::Reload => Ok(ConsoleOutcome::Reloaded(self.store.refresh()?)),
            ConsoleCommand::Help => {
                let text = self.help_text();
                info!("{text}");
                Ok(ConsoleOutcome::Help(text))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::QueueSink;
    use crate::sources::{MacroDir, StaticSource};
    use std::fs;

    fn manager(dir: &std::path::Path) -> (ConsoleManager<QueueSink>, Arc<QueueSink>) {
        let source: StaticSource = [("cheats", "money 1000\nenergy")].into_iter().collect();
        let store = Arc::new(MacroStore::new(
            Box::new(MacroDir::new(dir)),
            Box::new(source),
        ));
        store.refresh().expect("refresh");
        let sink = Arc::new(QueueSink::new());
        (ConsoleManager::new("macro", store, sink.clone()), sink)
    }

    #[test]
    fn parses_subcommands() {
        assert_eq!(
            ConsoleCommand::parse(&["run", "a", "b"]),
            ConsoleCommand::Run(vec!["a".into(), "b".into()])
        );
        assert_eq!(ConsoleCommand::parse(&["list"]), ConsoleCommand::List);
        assert_eq!(ConsoleCommand::parse(&["reload"]), ConsoleCommand::Reload);
        assert_eq!(ConsoleCommand::parse::<&str>(&[]), ConsoleCommand::Help);
        assert_eq!(ConsoleCommand::parse(&["RUN", "a"]), ConsoleCommand::Help);
        assert_eq!(ConsoleCommand::parse(&["run"]), ConsoleCommand::Run(vec![]));
    }

    #[test]
    fn run_dispatches_into_sink() {
        let dir = tempfile::tempdir().expect("temp dir");
        let (console, sink) = manager(dir.path());
        let outcome = console.handle(&["run", "cheats"]).expect("handle");
        assert!(matches!(outcome, ConsoleOutcome::Ran(ref report) if report.dispatched.len() == 2));
        assert_eq!(sink.drain(), vec!["money 1000".to_string(), "energy".to_string()]);
    }

    #[test]
    fn reload_picks_up_new_files() {
        let dir = tempfile::tempdir().expect("temp dir");
        let (console, _sink) = manager(dir.path());
        fs::write(dir.path().join("farm.txt"), "warp farm").expect("write");

        match console.handle(&["reload"]).expect("handle") {
            ConsoleOutcome::Reloaded(stats) => assert_eq!(stats.total, 2),
            other => panic!("unexpected outcome: {other:?}"),
        }
        match console.handle(&["list"]).expect("handle") {
            ConsoleOutcome::Listed(names) => {
                assert_eq!(names, vec!["cheats".to_string(), "farm".to_string()])
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn reload_error_is_returned() {
        let dir = tempfile::tempdir().expect("temp dir");
        let macros = dir.path().join("Macros");
        fs::create_dir(&macros).expect("mkdir");
        let (console, _sink) = manager(&macros);
        fs::remove_dir(&macros).expect("rmdir");
        assert!(console.handle(&["reload"]).is_err());
    }

    #[test]
    fn unknown_subcommand_prints_help() {
        let dir = tempfile::tempdir().expect("temp dir");
        let (console, sink) = manager(dir.path());
        match console.handle(&["frobnicate"]).expect("handle") {
            ConsoleOutcome::Help(text) => assert!(text.contains("macro run <macro>")),
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert!(sink.drain().is_empty());
    }
}
