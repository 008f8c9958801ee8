//! Plugin settings loaded from YAML.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_MACROS_DIR: &str = "Mods/ConsoleMacros/Macros";
pub const DEFAULT_COMMAND: &str = "macro";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Directory holding one macro per file.
    pub macros_dir: PathBuf,
    /// Optional YAML content pack merged over the directory.
    pub content_pack: Option<PathBuf>,
    /// Console command the plugin registers.
    pub command: String,
    /// Reload automatically when the macro sources change on disk.
    pub watch: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            macros_dir: PathBuf::from(DEFAULT_MACROS_DIR),
            content_pack: None,
            command: DEFAULT_COMMAND.to_string(),
            watch: false,
        }
    }
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("I/O error while reading settings: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse settings: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid settings: {0}")]
    Invalid(String),
}

pub fn load_settings_path(path: impl AsRef<Path>) -> Result<Settings, SettingsError> {
    let content = fs::read_to_string(path.as_ref())?;
    load_settings_str(&content)
}

pub fn load_settings_str(content: &str) -> Result<Settings, SettingsError> {
    // An empty document deserializes to unit, not to a map.
    if content.trim().is_empty() {
        return Ok(Settings::default());
    }
    let settings: Settings = serde_yaml::from_str(content)?;
    settings.validate()?;
    Ok(settings)
}

impl Settings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.command.is_empty() || self.command.chars().any(char::is_whitespace) {
            return Err(SettingsError::Invalid(format!(
                "command `{}` must be a single non-empty word",
                self.command
            )));
        }
        Ok(())
    }
}
