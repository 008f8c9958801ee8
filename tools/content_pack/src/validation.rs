use std::collections::HashMap;

use crate::schema::{ContentPack, PACK_VERSION};

#[derive(Debug, Clone, Copy)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone)]
pub struct ValidationIssue {
    pub path: String,
    pub message: String,
    pub location: Option<Location>,
    pub severity: Severity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl ValidationIssue {
    pub fn new(path: String, message: String, severity: Severity) -> Self {
        Self {
            path,
            message,
            location: None,
            severity,
        }
    }
}

pub fn validate_pack(pack: &ContentPack, source: &str) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    if pack.version != PACK_VERSION {
        issues.push(ValidationIssue::new(
            "version".into(),
            format!(
                "Unsupported content pack version {} (expected {PACK_VERSION})",
                pack.version
            ),
            Severity::Error,
        ));
    }

    // Sorted so diagnostics come out in a stable order.
    let mut names: Vec<_> = pack.macros.keys().collect();
    names.sort();

    let mut lowered: HashMap<String, &String> = HashMap::new();
    for name in names {
        let path = format!("macros.{name}");

        if name.trim().is_empty() {
            issues.push(ValidationIssue::new(
                path,
                "Macro name must not be empty".into(),
                Severity::Error,
            ));
            continue;
        }

        if name.chars().any(char::is_whitespace) {
            issues.push(ValidationIssue::new(
                path.clone(),
                format!("Macro name `{name}` contains whitespace and cannot be passed to `macro run`"),
                Severity::Error,
            ));
        }

        if name.contains('.') {
            issues.push(ValidationIssue::new(
                path.clone(),
                format!("Macro name `{name}` contains a dot and cannot be shadowed by a macro file"),
                Severity::Info,
            ));
        }

        if let Some(previous) = lowered.insert(name.to_lowercase(), name) {
            issues.push(ValidationIssue::new(
                path.clone(),
                format!("Macro `{name}` differs from `{previous}` only by case"),
                Severity::Warning,
            ));
        }

        let body = pack.macros[name].body();
        if body.lines().all(|line| line.trim().is_empty()) {
            issues.push(ValidationIssue::new(
                path,
                "Macro has no commands".into(),
                Severity::Warning,
            ));
        }
    }

    attach_locations(source, issues)
}

fn attach_locations(source: &str, mut issues: Vec<ValidationIssue>) -> Vec<ValidationIssue> {
    for issue in &mut issues {
        issue.location = find_location(source, &issue.path);
    }
    issues
}

fn find_location(source: &str, path: &str) -> Option<Location> {
    let lines: Vec<&str> = source.lines().collect();
    match path.strip_prefix("macros.") {
        Some(name) => {
            let section = find_key(&lines, 0, "macros")?;
            find_key(&lines, section.line, name)
        }
        None => find_key(&lines, 0, path),
    }
}

/// First line at or after `start` (0-based) that defines `key` as a mapping
/// key, bare or quoted.
fn find_key(lines: &[&str], start: usize, key: &str) -> Option<Location> {
    let candidates = [
        format!("{key}:"),
        format!("\"{key}\":"),
        format!("'{key}':"),
    ];
    lines
        .iter()
        .enumerate()
        .skip(start)
        .find_map(|(idx, line)| {
            let trimmed = line.trim_start();
            candidates
                .iter()
                .any(|candidate| trimmed.starts_with(candidate.as_str()))
                .then(|| Location {
                    line: idx + 1,
                    column: line.len() - trimmed.len() + 1,
                })
        })
}
