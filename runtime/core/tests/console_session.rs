use std::collections::HashSet;
use std::fs;
use std::sync::{Arc, Mutex};

use console_macros_core::{
    CommandSink, ConsoleOutcome, DispatchError, HostEvent, LineOutcome, RuntimeManager, Settings,
};

/// Rejects commands starting with `crash`, records everything else.
#[derive(Default)]
struct RecordingSink {
    commands: Mutex<Vec<String>>,
}

impl CommandSink for RecordingSink {
    fn dispatch(&self, command: &str) -> Result<(), DispatchError> {
        if command.trim().is_empty() {
            return Ok(());
        }
        if command.starts_with("crash") {
            return Err(DispatchError::Rejected(command.to_string()));
        }
        self.commands.lock().expect("lock").push(command.to_string());
        Ok(())
    }
}

#[tokio::test]
async fn operator_session_over_files_and_content_pack() {
    let dir = tempfile::tempdir().expect("temp dir");
    let macros_dir = dir.path().join("Macros");
    fs::create_dir(&macros_dir).expect("mkdir");
    fs::write(macros_dir.join("setup.txt"), "say one\r\ncrash now\r\nsay two\r\n")
        .expect("write macro");
    fs::write(macros_dir.join("warp.cmd.txt"), "warp farm").expect("write macro");
    fs::write(macros_dir.join(".gitkeep"), "").expect("write dotfile");

    let pack = dir.path().join("content.yaml");
    fs::write(&pack, "version: 1\nmacros:\n  warp: \"warp town\"\n  Gift: \"give 1\"\n")
        .expect("write pack");

    let sink = Arc::new(RecordingSink::default());
    let settings = Settings {
        macros_dir,
        content_pack: Some(pack),
        ..Settings::default()
    };
    let manager = RuntimeManager::initialize(settings, sink.clone())
        .await
        .expect("init");
    manager.handle_event(HostEvent::Launched).expect("refresh");

    let names: HashSet<_> = manager.store.list().into_iter().collect();
    let expected: HashSet<_> = ["setup", "warp", "Gift"].iter().map(|s| s.to_string()).collect();
    assert_eq!(names, expected);

    match manager.handle_line("macro run setup WARP missing Gift").expect("line") {
        LineOutcome::Console(ConsoleOutcome::Ran(report)) => {
            assert_eq!(report.failures.len(), 1);
            assert_eq!(report.failures[0].line, "crash now");
            assert_eq!(report.skipped, 1);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(
        *sink.commands.lock().expect("lock"),
        vec!["say one", "say two", "warp town", "give 1"]
    );
    manager.shutdown();
}
