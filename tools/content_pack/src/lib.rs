pub mod schema;
pub mod validation;

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use schema::ContentPack;
use serde_yaml::Error as YamlError;
use thiserror::Error;

pub use validation::{Location, Severity, ValidationIssue, validate_pack};

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("YAML parse error: {0}")]
    Parse(#[from] YamlError),
    #[error("I/O error while reading content pack: {0}")]
    Io(#[from] std::io::Error),
    #[error("Validation errors prevented loading: {}", describe_errors(.0))]
    Validation(Vec<ValidationIssue>),
}

fn describe_errors(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .filter(|issue| issue.severity == Severity::Error)
        .map(|issue| format!("{}: {}", issue.path, issue.message))
        .collect::<Vec<_>>()
        .join("; ")
}

/// A content pack that passed validation, with its remaining non-error issues.
#[derive(Debug)]
pub struct LoadedPack {
    pub macros: HashMap<String, String>,
    pub issues: Vec<ValidationIssue>,
}

pub fn parse_pack_str(src: &str) -> Result<ContentPack, ContentError> {
    let pack = serde_yaml::from_str::<ContentPack>(src)?;
    Ok(pack)
}

pub fn load_pack_str(src: &str) -> Result<LoadedPack, ContentError> {
    let pack = parse_pack_str(src)?;
    let issues = validate_pack(&pack, src);
    if issues.iter().any(|i| i.severity == Severity::Error) {
        return Err(ContentError::Validation(issues));
    }
    Ok(LoadedPack {
        macros: pack.into_mapping(),
        issues,
    })
}

pub fn load_pack_path(path: impl AsRef<Path>) -> Result<LoadedPack, ContentError> {
    let content = fs::read_to_string(path.as_ref())?;
    load_pack_str(&content)
}
