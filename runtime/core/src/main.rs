use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use console_macros_core::{load_settings_path, HostEvent, QueueSink, RuntimeManager, Settings};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::error;

#[derive(Parser, Debug)]
#[command(author, version, about = "Run console macros against a line-based command host", long_about = None)]
struct Cli {
    /// Path to YAML settings file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Directory containing one macro per file
    #[arg(long)]
    macros_dir: Option<PathBuf>,
    /// YAML content pack merged over the macro directory
    #[arg(long)]
    content_pack: Option<PathBuf>,
    /// Reload macros when their sources change
    #[arg(long)]
    watch: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut settings = match &cli.config {
        Some(path) => load_settings_path(path)
            .with_context(|| format!("loading settings from {}", path.display()))?,
        None => Settings::default(),
    };
    if let Some(dir) = cli.macros_dir {
        settings.macros_dir = dir;
    }
    if cli.content_pack.is_some() {
        settings.content_pack = cli.content_pack;
    }
    settings.watch |= cli.watch;

    let sink = Arc::new(QueueSink::new());
    let manager = RuntimeManager::initialize(settings, sink.clone())
        .await
        .context("starting macro runtime")?;

    if let Err(err) = manager.handle_event(HostEvent::Launched) {
        error!("Failed to load macros: {err}");
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("reading console input")? {
        if matches!(line.trim(), "quit" | "exit") {
            break;
        }
        if let Err(err) = manager.handle_line(&line) {
            error!("Failed to reload macros: {err}");
        }
        for command in sink.drain() {
            println!("> {command}");
        }
    }

    sink.close();
    manager.shutdown();
    Ok(())
}
