pub mod config;
pub mod console;
pub mod runner;
pub mod runtime;
pub mod sources;
pub mod store;
pub mod watch;

#[cfg(test)]
mod test_support;

pub use config::{load_settings_path, load_settings_str, Settings, SettingsError};
pub use console::{ConsoleCommand, ConsoleManager, ConsoleOutcome};
pub use runner::{
    expand_commands, CommandSink, DispatchError, LineFailure, MacroRunner, QueueSink, RunReport,
};
pub use runtime::{HostEvent, LineOutcome, RuntimeManager, RuntimeManagerError};
pub use sources::{
    macro_name_from_file, ContentPackSource, EmptySource, MacroDir, MacroFiles, SecondarySource,
    SourceError, StaticSource,
};
pub use store::{MacroStore, MacroTable, MergeStats, RefreshError};
pub use watch::{watch_sources, ReloadEvent, WatchHandle};
