// Integration-adjacent test: simulate registering and running the `pack`
// demonstration command the way `run()` wires it, without going through the
// terminal/REPL loop.
use core_collab::{MemoryBackend, NoopScriptEngine, StdFsProvider, SystemGitProvider};
use core_errors::ShellError;
use core_runtime::{ArgCompleter, Command, Manager};
use core_state::StateManager;
use std::io::Write;
use std::sync::Arc;
use tempfile::NamedTempFile;

fn new_manager() -> Manager {
    Manager::new(
        Box::new(NoopScriptEngine::new()),
        Arc::new(StateManager::new(Arc::new(MemoryBackend::new()))),
        Arc::new(StdFsProvider::new()),
        Arc::new(SystemGitProvider::new()),
    )
}

async fn register_pack(manager: &Manager) {
    manager
        .register_global_command(
            Command::native(
                "pack",
                "pack files into a minimal-depth-unique txtar archive",
                "pack <path>...",
                |args| {
                    if args.is_empty() {
                        return Err(ShellError::invalid_usage("usage: pack <path>..."));
                    }
                    let mut packer = core_txtar::TxtarPacker::new();
                    for arg in args {
                        packer.add_path(std::path::PathBuf::from(arg))?;
                    }
                    print!("{}", packer.get_txtar_string()?);
                    Ok(())
                },
            )
            .with_arg_completers(vec![ArgCompleter::File]),
        )
        .await
        .expect("registering the pack command");
}

#[tokio::test]
async fn pack_command_dispatches_through_the_manager() {
    let manager = new_manager();
    register_pack(&manager).await;

    let mut file = NamedTempFile::new().expect("creating a temp file");
    write!(file, "hello").expect("writing the temp file");
    let path = file.path().to_string_lossy().into_owned();

    let keep_going = manager.executor(&format!("pack {path}")).await;
    assert!(keep_going, "a successful command must not end the session");
}

#[tokio::test]
async fn pack_command_without_arguments_reports_usage_and_continues() {
    let manager = new_manager();
    register_pack(&manager).await;

    let keep_going = manager.executor("pack").await;
    assert!(keep_going);
}

#[tokio::test]
async fn unregistered_command_without_an_active_mode_does_not_end_the_session() {
    let manager = new_manager();
    let keep_going = manager.executor("nonexistent-command").await;
    assert!(keep_going);
}

#[tokio::test]
async fn exit_ends_the_session() {
    let manager = new_manager();
    let keep_going = manager.executor("exit").await;
    assert!(!keep_going);
}
