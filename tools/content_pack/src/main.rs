use std::fs;
use std::path::PathBuf;

use clap::Parser;
use content_pack::Severity;

#[derive(Parser, Debug)]
#[command(author, version, about = "Validate console macro content packs", long_about = None)]
struct Cli {
    /// Path to YAML content pack
    path: PathBuf,
}

fn main() {
    let cli = Cli::parse();

    let content = match fs::read_to_string(&cli.path) {
        Ok(c) => c,
        Err(err) => {
            eprintln!("Failed to read {}: {err}", cli.path.display());
            std::process::exit(1);
        }
    };

    match content_pack::parse_pack_str(&content) {
        Ok(pack) => {
            let issues = content_pack::validate_pack(&pack, &content);
            if issues.is_empty() {
                println!(
                    "Validation OK: {} ({} macros)",
                    cli.path.display(),
                    pack.macros.len()
                );
                return;
            }
            let has_errors = issues.iter().any(|i| i.severity == Severity::Error);
            eprintln!("Validation diagnostics:");
            for issue in &issues {
                let level = match issue.severity {
                    Severity::Error => "error",
                    Severity::Warning => "warning",
                    Severity::Info => "info",
                };
                if let Some(loc) = issue.location {
                    eprintln!(
                        "- [{}] {}: {} (line {}, column {})",
                        level, issue.path, issue.message, loc.line, loc.column
                    );
                } else {
                    eprintln!("- [{}] {}: {}", level, issue.path, issue.message);
                }
            }
            if has_errors {
                std::process::exit(2);
            }
        }
        Err(err) => {
            eprintln!("Validation failed: {err}");
            std::process::exit(1);
        }
    }
}
