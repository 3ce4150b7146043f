//! Script interpreter collaborator. Kept intentionally opaque: the
//! core never inspects interpreter internals, only loads, executes, and
//! resolves callables through this trait. Mirrors `core-plugin::PluginHost`'s
//! "tiny trait plus a noop used until a real backend lands" shape.

use crate::Value;
use core_errors::ShellError;

/// A loaded, not-yet-executed unit of script source.
#[derive(Debug, Clone)]
pub struct ScriptHandle(pub String);

/// A resolved reference to a script-side function.
#[derive(Debug, Clone)]
pub struct Callable(pub String);

/// Opaque handle into interpreter internals, passed to `run_on_vm_sync`
/// callbacks. A real adapter downcasts this to its own VM type; nothing in
/// `core-collab` or its callers is allowed to depend on what's behind it.
pub trait ScriptVm {}

/// Opaque token identifying a previously-installed command context, returned
/// by `push_context` and consumed by the matching `pop_context`. A real
/// adapter keeps the actual saved state on its own side, keyed by this
/// token; callers never inspect it.
#[derive(Debug, Clone)]
pub struct ScriptContext(pub u64);

/// The script interpreter boundary. `core-runtime` routes every script
/// invocation through here so that interpreter mutation never happens
/// concurrently with a write-lock hold (the golden invariant).
pub trait ScriptEngine: Send + Sync {
    fn load_from_string(&mut self, name: &str, src: &str) -> Result<ScriptHandle, ShellError>;
    fn execute(&mut self, script: &ScriptHandle) -> Result<(), ShellError>;
    fn run_on_vm_sync(
        &mut self,
        f: Box<dyn FnOnce(&mut dyn ScriptVm) + Send>,
    ) -> Result<(), ShellError>;
    fn set_global(&mut self, name: &str, value: Value);
    fn get_callable(&mut self, name: &str) -> Result<Callable, ShellError>;
    fn assert_callable(&self, value: &Value) -> Option<Callable>;

    /// Saves the interpreter's current command context and installs a fresh
    /// one for an about-to-run command. The returned value must be passed to
    /// `pop_context` once the command and its deferred callbacks finish.
    fn push_context(&mut self) -> ScriptContext;
    /// Restores a context previously returned by `push_context`, discarding
    /// whatever context was installed in between.
    fn pop_context(&mut self, previous: ScriptContext);
    /// Drains and returns any deferred-cleanup callbacks registered against
    /// the current context (e.g. by a script-side `deferCleanup()` call).
    /// Run after the command handler and before `pop_context`.
    fn take_deferred_callbacks(&mut self) -> Vec<Callable>;
}

impl<T: ScriptEngine + ?Sized> ScriptEngine for &mut T {
    fn load_from_string(&mut self, name: &str, src: &str) -> Result<ScriptHandle, ShellError> {
        (**self).load_from_string(name, src)
    }
    fn execute(&mut self, script: &ScriptHandle) -> Result<(), ShellError> {
        (**self).execute(script)
    }
    fn run_on_vm_sync(
        &mut self,
        f: Box<dyn FnOnce(&mut dyn ScriptVm) + Send>,
    ) -> Result<(), ShellError> {
        (**self).run_on_vm_sync(f)
    }
    fn set_global(&mut self, name: &str, value: Value) {
        (**self).set_global(name, value)
    }
    fn get_callable(&mut self, name: &str) -> Result<Callable, ShellError> {
        (**self).get_callable(name)
    }
    fn assert_callable(&self, value: &Value) -> Option<Callable> {
        (**self).assert_callable(value)
    }
    fn push_context(&mut self) -> ScriptContext {
        (**self).push_context()
    }
    fn pop_context(&mut self, previous: ScriptContext) {
        (**self).pop_context(previous)
    }
    fn take_deferred_callbacks(&mut self) -> Vec<Callable> {
        (**self).take_deferred_callbacks()
    }
}

/// Accepts any script, executes as a no-op, never resolves a callable. Wired
/// by `shell-bin` until a real interpreter (e.g. a `boa_engine` adapter) is
/// substituted.
#[derive(Default)]
pub struct NoopScriptEngine {
    loaded: usize,
}

impl NoopScriptEngine {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ScriptEngine for NoopScriptEngine {
    fn load_from_string(&mut self, name: &str, _src: &str) -> Result<ScriptHandle, ShellError> {
        self.loaded += 1;
        Ok(ScriptHandle(name.to_string()))
    }

    fn execute(&mut self, _script: &ScriptHandle) -> Result<(), ShellError> {
        Ok(())
    }

    fn run_on_vm_sync(
        &mut self,
        f: Box<dyn FnOnce(&mut dyn ScriptVm) + Send>,
    ) -> Result<(), ShellError> {
        struct NoopVm;
        impl ScriptVm for NoopVm {}
        let mut vm = NoopVm;
        f(&mut vm);
        Ok(())
    }

    fn set_global(&mut self, _name: &str, _value: Value) {}

    fn get_callable(&mut self, name: &str) -> Result<Callable, ShellError> {
        Err(ShellError::not_found(format!("callable {name}")))
    }

    fn assert_callable(&self, _value: &Value) -> Option<Callable> {
        None
    }

    fn push_context(&mut self) -> ScriptContext {
        ScriptContext(0)
    }

    fn pop_context(&mut self, _previous: ScriptContext) {}

    fn take_deferred_callbacks(&mut self) -> Vec<Callable> {
        Vec::new()
    }
}
