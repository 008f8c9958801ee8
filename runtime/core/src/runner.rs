//! Macro expansion and per-line command dispatch.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use thiserror::Error;
use tracing::{debug, error};

use crate::store::{MacroStore, MacroTable};

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("command queue is closed")]
    Closed,
    #[error("command queue is unavailable")]
    Unavailable,
    #[error("command rejected: {0}")]
    Rejected(String),
}

/// Submits one command line to the host's command pipeline.
///
/// Implementations must treat empty or blank input as a no-op.
pub trait CommandSink: Send + Sync {
    fn dispatch(&self, command: &str) -> Result<(), DispatchError>;
}

/// In-process command queue drained by the host.
#[derive(Debug, Default)]
pub struct QueueSink {
    queue: Mutex<VecDeque<String>>,
    closed: AtomicBool,
}

impl QueueSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drain(&self) -> Vec<String> {
        match self.queue.lock() {
            Ok(mut queue) => queue.drain(..).collect(),
            Err(poisoned) => poisoned.into_inner().drain(..).collect(),
        }
    }

    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

impl CommandSink for QueueSink {
    fn dispatch(&self, command: &str) -> Result<(), DispatchError> {
        if command.trim().is_empty() {
            return Ok(());
        }
        if self.closed.load(Ordering::SeqCst) {
            return Err(DispatchError::Closed);
        }
        let mut queue = self.queue.lock().map_err(|_| DispatchError::Unavailable)?;
        queue.push_back(command.to_string());
        Ok(())
    }
}

#[derive(Debug)]
pub struct LineFailure {
    pub line: String,
    pub error: DispatchError,
}

/// Outcome of one `run`, line by line.
#[derive(Debug, Default)]
pub struct RunReport {
    pub dispatched: Vec<String>,
    /// Blank lines not sent to the sink.
    pub skipped: usize,
    pub failures: Vec<LineFailure>,
}

/// Resolves each name and concatenates the lines of every macro found.
///
/// Unknown names contribute nothing. Lines are not expanded again.
pub fn expand_commands<N: AsRef<str>>(table: &MacroTable, names: &[N]) -> Vec<String> {
    let mut commands = Vec::new();
    for name in names {
        let Some(body) = table.lookup(name.as_ref()) else {
            continue;
        };
        commands.extend(
            body.split('\n')
                .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string()),
        );
    }
    commands
}

#[derive(Debug)]
pub struct MacroRunner<S: CommandSink + 'static> {
    store: Arc<MacroStore>,
    sink: Arc<S>,
}

impl<S: CommandSink + 'static> MacroRunner<S> {
    pub fn new(store: Arc<MacroStore>, sink: Arc<S>) -> Self {
        Self { store, sink }
    }

    /// Expands `names` against the current table, then dispatches every line
    /// in order. A failing line is recorded and logged; later lines still run.
    pub fn run<N: AsRef<str>>(&self, names: &[N]) -> RunReport {
        let table = self.store.snapshot();
        let commands = expand_commands(&table, names);

        let mut report = RunReport::default();
        for command in commands {
            if command.trim().is_empty() {
                report.skipped += 1;
                continue;
            }
            match self.sink.dispatch(&command) {
                Ok(()) => {
                    debug!(command = %command, "dispatched");
                    report.dispatched.push(command);
                }
                Err(err) => {
                    error!("Failed to execute command: \"{command}\": {err}");
                    report.failures.push(LineFailure {
                        line: command,
                        error: err,
                    });
                }
            }
        }
        report
    }

    pub fn list(&self) -> Vec<String> {
        self.store.list()
    }
}
