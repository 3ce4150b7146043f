//! `oxsh` entrypoint: wires the default (noop/std) collaborators into
//! `core-runtime`'s `Manager` and drives a raw-mode REPL loop.

use anyhow::{Context, Result};
use clap::Parser;
use core_collab::{MemoryBackend, NoopScriptEngine, PersistentBackendUnavailable, StdFsProvider, SystemGitProvider};
use core_collab::{Document, PromptCompleter, PromptDriver};
use core_errors::ShellError;
use core_runtime::{ArgCompleter, Command, Manager};
use core_state::StateManager;
use core_terminal::{CrosstermBackend, CrosstermLineReader};
use std::path::PathBuf;
use std::sync::{Arc, Once};
use tracing_appender::non_blocking::WorkerGuard;

/// CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "oxsh", version, about = "A scriptable, mode-driven interactive shell")]
struct Args {
    /// Overrides config discovery (local `oxsh.toml`, then the XDG config dir).
    #[arg(long = "config")]
    config: Option<PathBuf>,
    /// Mode to enter at startup, overriding `startup_mode` from config.
    #[arg(long = "mode")]
    mode: Option<String>,
    /// Overrides `log.level` from config (e.g. "debug", "warn").
    #[arg(long = "log-level")]
    log_level: Option<String>,
    /// Overrides `log.file` from config; logs go to stderr when unset.
    #[arg(long = "log-file")]
    log_file: Option<PathBuf>,
}

fn configure_logging(level: &str, file: Option<&PathBuf>) -> Option<WorkerGuard> {
    let filter = tracing_subscriber::EnvFilter::try_new(level)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    match file {
        Some(path) => {
            let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or_else(|| std::path::Path::new("."));
            let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_else(|| "oxsh.log".to_string());
            let appender = tracing_appender::rolling::never(dir, name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let _ = tracing_subscriber::fmt().with_env_filter(filter).with_writer(writer).try_init();
            Some(guard)
        }
        None => {
            let _ = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).try_init();
            None
        }
    }
}

fn install_panic_hook() {
    static HOOK: Once = Once::new();
    HOOK.call_once(|| {
        let default_panic = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            tracing::error!(target: "runtime.panic", ?info, "panic");
            default_panic(info);
        }));
    });
}

/// Bridges the synchronous `PromptCompleter` seam to the manager's async
/// registries. Runs on the main thread outside any in-flight `block_on`, so
/// this nested `block_on` never panics with "cannot start a runtime from
/// within a runtime" (see DESIGN.md).
struct ManagerCompleter {
    manager: Arc<Manager>,
    handle: tokio::runtime::Handle,
}

impl PromptCompleter for ManagerCompleter {
    fn complete(&self, doc: &dyn Document) -> Vec<(String, String)> {
        let before = doc.text_before_cursor().to_string();
        let full = format!("{}{}", doc.text_before_cursor(), doc.text_after_cursor());
        let suggestions = self.handle.block_on(self.manager.complete(&before, &full));
        suggestions.into_iter().map(|s| (s.text, s.description)).collect()
    }
}

fn register_demo_commands(manager: &Manager, handle: &tokio::runtime::Handle) -> Result<()> {
    handle.block_on(manager.register_global_command(
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
                    packer.add_path(PathBuf::from(arg))?;
                }
                print!("{}", packer.get_txtar_string()?);
                Ok(())
            },
        )
        .with_arg_completers(vec![ArgCompleter::File]),
    ))?;
    Ok(())
}

fn build_state_manager(backend_name: &str) -> Arc<StateManager> {
    let backend: Arc<dyn core_collab::StateBackend> = match backend_name {
        "persistent" => Arc::new(PersistentBackendUnavailable::new()),
        _ => Arc::new(MemoryBackend::new()),
    };
    Arc::new(StateManager::new(backend))
}

fn run(args: Args) -> Result<()> {
    let config = core_config::load_from(args.config.clone()).context("loading configuration")?;
    let log_level = args.log_level.as_deref().unwrap_or(&config.log.level);
    let log_file = args.log_file.as_ref().or(config.log.file.as_ref());
    let _log_guard = configure_logging(log_level, log_file);
    install_panic_hook();

    tracing::info!(target: "runtime", "startup");

    let rt = tokio::runtime::Runtime::new().context("starting the async runtime")?;
    let handle = rt.handle().clone();

    let manager = Arc::new(Manager::new(
        Box::new(NoopScriptEngine::new()),
        build_state_manager(&config.state.backend),
        Arc::new(StdFsProvider::new()),
        Arc::new(SystemGitProvider::new()),
    ));
    register_demo_commands(&manager, &handle)?;

    let startup_mode = args.mode.clone().or_else(|| config.startup_mode.clone());
    if let Some(mode) = &startup_mode {
        tracing::warn!(
            target: "runtime.startup",
            mode = mode.as_str(),
            "no modes are registered by this binary; a real deployment registers modes before entering the REPL"
        );
    }

    let mut terminal = CrosstermBackend::new();
    let _guard = terminal.enter_guard().context("entering raw terminal mode")?;

    let mut reader = CrosstermLineReader::new();
    reader.set_completer(Arc::new(ManagerCompleter {
        manager: manager.clone(),
        handle: handle.clone(),
    }));

    loop {
        let prompt = handle.block_on(manager.prompt_prefix());
        reader.set_prompt_prefix(prompt);

        let line = match reader.read_line() {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(err) => {
                tracing::error!(target: "runtime", %err, "failed reading a line");
                break;
            }
        };

        if !handle.block_on(manager.executor(&line)) {
            break;
        }
    }

    manager.shutdown();
    tracing::info!(target: "runtime", "shutdown");
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    run(args)
}
