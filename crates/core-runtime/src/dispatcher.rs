//! The manager: command dispatch, mode switching, and the built-in command
//! set. `executor` is the single entry point driven by the
//! terminal's read loop.

use crate::completion::snapshot;
use crate::manager::{Command, ManagerState, Mode};
use crate::writer::WriterHandle;
use core_collab::{Callable, FsProvider, GitProvider, ScriptEngine, Value};
use core_completion::Suggestion;
use core_errors::ShellError;
use core_state::StateManager;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex as SyncMutex};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Everything the shell needs to run: the mode/command registry, the write
/// serialization queue, the script collaborator, the state bus, and the
/// filesystem/git collaborators the completion engine consults.
pub struct Manager {
    state: Arc<RwLock<ManagerState>>,
    writer: WriterHandle,
    script: Arc<SyncMutex<Box<dyn ScriptEngine>>>,
    state_manager: Arc<StateManager>,
    fs: Arc<dyn FsProvider>,
    git: Arc<dyn GitProvider>,
    root_cancellation: CancellationToken,
}

impl Manager {
    pub fn new(
        script: Box<dyn ScriptEngine>,
        state_manager: Arc<StateManager>,
        fs: Arc<dyn FsProvider>,
        git: Arc<dyn GitProvider>,
    ) -> Self {
        let state = Arc::new(RwLock::new(ManagerState::default()));
        let root_cancellation = CancellationToken::new();
        let writer = WriterHandle::spawn(state.clone(), root_cancellation.clone());
        Self {
            state,
            writer,
            script: Arc::new(SyncMutex::new(script)),
            state_manager,
            fs,
            git,
            root_cancellation,
        }
    }

    pub async fn register_mode(&self, mode: Mode) -> Result<(), ShellError> {
        self.writer
            .schedule_write_and_wait(move |s| {
                s.register_mode(mode);
                Ok(())
            })
            .await
    }

    pub async fn register_global_command(&self, command: Command) -> Result<(), ShellError> {
        self.writer
            .schedule_write_and_wait(move |s| {
                s.register_global_command(command);
                Ok(())
            })
            .await
    }

    /// Requests that the next line in the read loop stop, per the script
    /// API's `request_exit()` hook.
    pub async fn request_exit(&self) {
        let _ = self
            .writer
            .schedule_write(|s| {
                s.exit_requested = true;
                Ok(())
            })
            .await;
    }

    pub fn shutdown(&self) {
        self.writer.shutdown();
        self.root_cancellation.cancel();
    }

    /// Builds a read-lock snapshot and asks the completion engine for
    /// suggestions; the lock is released before `core_completion::suggest`
    /// runs, so completers never execute under the manager's lock.
    pub async fn complete(&self, before: &str, full: &str) -> Vec<Suggestion> {
        let snap = {
            let guard = self.state.read().await;
            snapshot(&guard)
        };
        core_completion::suggest(before, full, &snap, self.fs.as_ref(), self.git.as_ref())
    }

    /// The prompt a terminal front-end should display for the current mode,
    /// falling back to the mode name and then to a bare shell prompt.
    pub async fn prompt_prefix(&self) -> String {
        let guard = self.state.read().await;
        match guard.active_mode() {
            Some(mode) if !mode.tui_config.prompt_prefix.is_empty() => {
                mode.tui_config.prompt_prefix.clone()
            }
            Some(mode) => format!("oxsh:{}> ", mode.name),
            None => "oxsh> ".to_string(),
        }
    }

    /// Drives one input line. Returns `false` iff the shell should exit.
    pub fn executor<'a>(&'a self, input: &'a str) -> BoxFuture<'a, bool> {
        Box::pin(async move {
            let trimmed = input.trim();
            if trimmed.is_empty() {
                return true;
            }

            let tokens = core_tokenizer::parse_slice(trimmed);
            let Some(name) = tokens.first().cloned() else {
                return true;
            };
            let args = tokens[1..].to_vec();

            if name == "exit" || name == "quit" {
                if let Err(err) = self.run_on_exit_for_active_mode().await {
                    println!("{err}");
                }
                println!("Goodbye!");
                return false;
            }

            if name == "help" {
                self.print_help().await;
            }

            if let Err(err) = self.execute_command(&name, &args, trimmed).await {
                println!("{err}");
            }

            if self.state.read().await.exit_requested {
                if let Err(err) = self.run_on_exit_for_active_mode().await {
                    println!("{err}");
                }
                println!("Goodbye!");
                return false;
            }

            true
        })
    }

    async fn run_on_exit_for_active_mode(&self) -> Result<(), ShellError> {
        let on_exit = {
            let guard = self.state.read().await;
            guard.active_mode().and_then(|m| m.on_exit.clone())
        };
        if let Some(callable) = on_exit {
            self.invoke_script_callable(&callable, &[]).await?;
        }
        Ok(())
    }

    async fn print_help(&self) {
        println!("Built-in commands:");
        for (name, description) in core_completion::BUILTIN_COMMANDS {
            println!("  {name} — {description}");
        }
        let guard = self.state.read().await;
        if !guard.global_command_order.is_empty() {
            println!("Global commands:");
            for name in &guard.global_command_order {
                let c = &guard.global_commands[name];
                println!("  {} — {} ({})", c.name, c.description, c.usage);
            }
        }
        if let Some(mode) = guard.active_mode() {
            println!("'{}' mode commands:", mode.name);
            for name in &mode.command_order {
                let c = &mode.commands[name];
                println!("  {} — {} ({})", c.name, c.description, c.usage);
            }
        }
    }

    /// Resolution order: current-mode commands, then global commands, then
    /// (only if neither registered the name) the four built-ins, then (if a
    /// mode is active) the whole line as a script expression. A registered
    /// command named `mode`/`modes`/`state`/`reset` shadows the built-in of
    /// the same name, symmetric with how a registered `help` can override
    /// the built-in help dump.
    async fn execute_command(
        &self,
        name: &str,
        args: &[String],
        original_line: &str,
    ) -> Result<(), ShellError> {
        let command = {
            let guard = self.state.read().await;
            guard.resolve_command(name).cloned()
        };

        if let Some(command) = command {
            return self.invoke_handler(command, args).await;
        }

        match name {
            "mode" => return self.builtin_mode(args).await,
            "modes" => return self.builtin_modes().await,
            "state" => return self.builtin_state(args).await,
            "reset" => return self.builtin_reset(args).await,
            _ => {}
        }

        let mode_active = { self.state.read().await.active_mode.is_some() };
        if mode_active {
            self.execute_script(original_line).await
        } else {
            println!("Command not found: {name} (type 'help' for a list of commands)");
            Ok(())
        }
    }

    async fn invoke_handler(&self, command: Command, args: &[String]) -> Result<(), ShellError> {
        match command.handler {
            crate::manager::CommandHandler::Native(f) => f(args),
            crate::manager::CommandHandler::Script(callable) => {
                self.invoke_script_callable(&callable, args).await
            }
        }
    }

    async fn execute_script(&self, line: &str) -> Result<(), ShellError> {
        crate::writer::assert_not_under_write_lock();
        let mut engine = self.script.lock().unwrap();
        let handle = engine.load_from_string("<line>", line)?;
        match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| engine.execute(&handle))) {
            Ok(result) => result,
            Err(_) => Err(ShellError::script_failure("script panicked")),
        }
    }

    /// Invokes a resolved script-side callable under the
    /// save-context/run/run-deferred/merge-errors/restore-context procedure.
    /// Real argument marshalling and return-value handling is
    /// interpreter-specific and left to the concrete `ScriptEngine` adapter
    /// that replaces `NoopScriptEngine`; there is nothing behind
    /// `NoopScriptEngine`'s VM to call.
    async fn invoke_script_callable(
        &self,
        callable: &Callable,
        _args: &[String],
    ) -> Result<(), ShellError> {
        crate::writer::assert_not_under_write_lock();
        let mut engine = self.script.lock().unwrap();

        let previous_context = engine.push_context();
        let handler_result = run_callable_sync(&mut **engine, callable);

        let mut deferred_error: Option<ShellError> = None;
        for deferred in engine.take_deferred_callbacks() {
            if let Err(err) = run_callable_sync(&mut **engine, &deferred) {
                deferred_error = Some(match deferred_error {
                    None => err,
                    Some(existing) => existing.merge(Some(err)),
                });
            }
        }
        engine.pop_context(previous_context);

        match handler_result {
            Ok(()) => match deferred_error {
                None => Ok(()),
                Some(deferred) => Err(deferred),
            },
            Err(primary) => Err(primary.merge(deferred_error)),
        }
    }

    /// Verifies the mode exists, runs the outgoing mode's `on_exit`, swaps
    /// the active-mode pointer through the writer, runs the incoming mode's
    /// `on_enter`, then dispatches its `initial_command` if any — matching
    /// "switch_mode... atomically sets the active mode" (the swap
    /// itself is the atomic step; the surrounding callbacks run outside the
    /// lock per the golden invariant).
    pub async fn switch_mode(&self, name: &str) -> Result<(), ShellError> {
        let exists = { self.state.read().await.modes.contains_key(name) };
        if !exists {
            return Err(ShellError::not_found(format!("mode {name}")));
        }

        self.run_on_exit_for_active_mode().await?;

        let name_owned = name.to_string();
        self.writer
            .schedule_write_and_wait(move |s| {
                s.active_mode = Some(name_owned);
                Ok(())
            })
            .await?;

        let (on_enter, initial_command) = {
            let guard = self.state.read().await;
            let mode = guard
                .active_mode()
                .expect("active mode was just set to an existing mode");
            (mode.on_enter.clone(), mode.initial_command.clone())
        };

        if let Some(callable) = on_enter {
            self.invoke_script_callable(&callable, &[]).await?;
        }

        if let Some(line) = initial_command {
            self.executor(&line).await;
        }

        Ok(())
    }

    async fn builtin_mode(&self, args: &[String]) -> Result<(), ShellError> {
        if args.is_empty() {
            let guard = self.state.read().await;
            match &guard.active_mode {
                Some(name) => println!("{name}"),
                None => println!("(no active mode)"),
            }
            return Ok(());
        }
        self.switch_mode(&args[0]).await
    }

    async fn builtin_modes(&self) -> Result<(), ShellError> {
        let guard = self.state.read().await;
        for name in &guard.mode_order {
            let marker = if guard.active_mode.as_deref() == Some(name.as_str()) {
                "*"
            } else {
                " "
            };
            println!("{marker} {name}");
        }
        Ok(())
    }

    async fn builtin_state(&self, args: &[String]) -> Result<(), ShellError> {
        if args.is_empty() {
            for key in self.state_manager.list_keys()? {
                println!("{key}");
            }
            return Ok(());
        }

        match args[0].as_str() {
            "get" => {
                let key = args
                    .get(1)
                    .ok_or_else(|| ShellError::invalid_usage("usage: state get <key>"))?;
                match self.state_manager.get(key) {
                    Some(value) => println!("{}", render_value(&value)),
                    None => println!("<unset>"),
                }
                Ok(())
            }
            "set" => {
                let key = args
                    .get(1)
                    .ok_or_else(|| ShellError::invalid_usage("usage: state set <key> <value>"))?;
                let value = args
                    .get(2)
                    .ok_or_else(|| ShellError::invalid_usage("usage: state set <key> <value>"))?;
                self.state_manager.set(key, Value::String(value.clone()))
            }
            other => Err(ShellError::invalid_usage(format!(
                "usage: state [get <key>|set <key> <value>] (unknown subcommand '{other}')"
            ))),
        }
    }

    async fn builtin_reset(&self, args: &[String]) -> Result<(), ShellError> {
        if !args.is_empty() {
            return Err(ShellError::invalid_usage("usage: reset (takes no arguments)"));
        }
        self.state_manager.clear_all()
    }
}

/// Runs a single callable synchronously, catching a VM panic and converting
/// it to a `ScriptFailure`. Shared by the primary handler invocation and
/// each deferred callback so both go through identical panic handling.
fn run_callable_sync(
    engine: &mut dyn ScriptEngine,
    callable: &Callable,
) -> Result<(), ShellError> {
    let callable = callable.clone();
    match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        engine.run_on_vm_sync(Box::new(move |_vm| {
            let _ = &callable;
        }))
    })) {
        Ok(result) => result,
        Err(_) => Err(ShellError::script_failure("script panicked")),
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Int(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::String(s) => s.clone(),
        Value::List(_) | Value::Map(_) => format!("{value:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manager::Command;
    use core_collab::{
        MemoryBackend, NoopScriptEngine, ScriptContext, ScriptHandle, ScriptVm, StdFsProvider,
        SystemGitProvider,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn new_manager() -> Manager {
        Manager::new(
            Box::new(NoopScriptEngine::new()),
            Arc::new(StateManager::new(Arc::new(MemoryBackend::new()))),
            Arc::new(StdFsProvider),
            Arc::new(SystemGitProvider),
        )
    }

    #[tokio::test]
    async fn empty_line_continues_without_error() {
        let manager = new_manager();
        assert!(manager.executor("   ").await);
    }

    #[tokio::test]
    async fn exit_returns_false() {
        let manager = new_manager();
        assert!(!manager.executor("exit").await);
    }

    #[tokio::test]
    async fn unknown_command_without_active_mode_prints_and_continues() {
        let manager = new_manager();
        assert!(manager.executor("frobnicate").await);
    }

    #[tokio::test]
    async fn native_global_command_runs() {
        let manager = new_manager();
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        manager
            .register_global_command(Command::native("ping", "pings", "ping", move |_args| {
                calls_clone.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }))
            .await
            .unwrap();
        assert!(manager.executor("ping").await);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn mode_switch_and_resolution_order() {
        let manager = new_manager();
        manager
            .register_mode(Mode::new("deploy"))
            .await
            .unwrap();
        manager.switch_mode("deploy").await.unwrap();
        assert_eq!(manager.state.read().await.active_mode.as_deref(), Some("deploy"));
    }

    #[tokio::test]
    async fn switch_mode_rejects_unknown_name() {
        let manager = new_manager();
        let err = manager.switch_mode("nope").await.unwrap_err();
        assert!(matches!(err, ShellError::NotFound { .. }));
    }

    #[tokio::test]
    async fn reset_rejects_arguments() {
        let manager = new_manager();
        let err = manager.builtin_reset(&["x".to_string()]).await.unwrap_err();
        match err {
            ShellError::InvalidUsage { message } => {
                assert_eq!(message, "usage: reset (takes no arguments)");
            }
            other => panic!("expected InvalidUsage, got {other}"),
        }
    }

    #[tokio::test]
    async fn state_set_then_get_round_trips_through_builtin() {
        let manager = new_manager();
        manager
            .builtin_state(&["set".to_string(), "a:b".to_string(), "hello".to_string()])
            .await
            .unwrap();
        assert_eq!(
            manager.state_manager.get("a:b"),
            Some(Value::String("hello".to_string()))
        );
    }

    #[tokio::test]
    async fn modes_lists_registered_modes_with_active_marker() {
        let manager = new_manager();
        manager.register_mode(Mode::new("a")).await.unwrap();
        manager.register_mode(Mode::new("b")).await.unwrap();
        manager.switch_mode("b").await.unwrap();
        manager.builtin_modes().await.unwrap();
    }

    #[tokio::test]
    async fn registered_command_shadows_builtin_of_the_same_name() {
        let manager = new_manager();
        manager
            .state_manager
            .set("a:b", Value::String("keep".to_string()))
            .unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        manager
            .register_global_command(Command::native(
                "reset",
                "custom reset",
                "reset",
                move |_args| {
                    calls_clone.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                },
            ))
            .await
            .unwrap();

        assert!(manager.executor("reset").await);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            manager.state_manager.get("a:b"),
            Some(Value::String("keep".to_string())),
            "the builtin must not run once a command named 'reset' is registered"
        );
    }

    struct CountingFailEngine {
        call_count: usize,
        deferred: Vec<Callable>,
    }

    impl ScriptEngine for CountingFailEngine {
        fn load_from_string(&mut self, name: &str, _src: &str) -> Result<ScriptHandle, ShellError> {
            Ok(ScriptHandle(name.to_string()))
        }
        fn execute(&mut self, _script: &ScriptHandle) -> Result<(), ShellError> {
            Ok(())
        }
        fn run_on_vm_sync(
            &mut self,
            f: Box<dyn FnOnce(&mut dyn ScriptVm) + Send>,
        ) -> Result<(), ShellError> {
            struct Vm;
            impl ScriptVm for Vm {}
            f(&mut Vm);
            self.call_count += 1;
            Err(ShellError::script_failure(format!("call {} failed", self.call_count)))
        }
        fn set_global(&mut self, _name: &str, _value: Value) {}
        fn get_callable(&mut self, name: &str) -> Result<Callable, ShellError> {
            Ok(Callable(name.to_string()))
        }
        fn assert_callable(&self, _value: &Value) -> Option<Callable> {
            None
        }
        fn push_context(&mut self) -> ScriptContext {
            ScriptContext(0)
        }
        fn pop_context(&mut self, _previous: ScriptContext) {}
        fn take_deferred_callbacks(&mut self) -> Vec<Callable> {
            std::mem::take(&mut self.deferred)
        }
    }

    #[tokio::test]
    async fn deferred_callback_error_merges_with_handler_error() {
        let engine = CountingFailEngine {
            call_count: 0,
            deferred: vec![Callable("cleanup".to_string())],
        };
        let manager = Manager::new(
            Box::new(engine),
            Arc::new(StateManager::new(Arc::new(MemoryBackend::new()))),
            Arc::new(StdFsProvider),
            Arc::new(SystemGitProvider),
        );

        let err = manager
            .invoke_script_callable(&Callable("handler".to_string()), &[])
            .await
            .unwrap_err();
        let rendered = err.to_string();
        assert!(rendered.contains("call 1 failed"), "{rendered}");
        assert!(rendered.contains("call 2 failed"), "{rendered}");
    }
}
