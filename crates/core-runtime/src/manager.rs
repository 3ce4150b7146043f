//! Registry data model: modes, commands, and the active-mode
//! pointer. Everything here lives behind the manager's single write lock —
//! see `writer` for the serialization discipline.

pub use core_completion::{ArgCompleter, FlagDef};
use core_collab::Callable;
use core_errors::ShellError;
use std::sync::Arc;

pub type NativeHandler = Arc<dyn Fn(&[String]) -> Result<(), ShellError> + Send + Sync>;

#[derive(Clone)]
pub enum CommandHandler {
    Native(NativeHandler),
    Script(Callable),
}

#[derive(Clone)]
pub struct Command {
    pub name: String,
    pub description: String,
    pub usage: String,
    pub handler: CommandHandler,
    pub arg_completers: Vec<ArgCompleter>,
    pub flag_defs: Vec<FlagDef>,
}

impl Command {
    pub fn native(
        name: impl Into<String>,
        description: impl Into<String>,
        usage: impl Into<String>,
        handler: impl Fn(&[String]) -> Result<(), ShellError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            usage: usage.into(),
            handler: CommandHandler::Native(Arc::new(handler)),
            arg_completers: Vec::new(),
            flag_defs: Vec::new(),
        }
    }

    pub fn with_arg_completers(mut self, completers: Vec<ArgCompleter>) -> Self {
        self.arg_completers = completers;
        self
    }

    pub fn with_flag_defs(mut self, flag_defs: Vec<FlagDef>) -> Self {
        self.flag_defs = flag_defs;
        self
    }
}

#[derive(Clone, Default)]
pub struct TuiConfig {
    pub title: String,
    pub prompt_prefix: String,
}

#[derive(Clone, Default)]
pub struct Mode {
    pub name: String,
    pub commands: std::collections::BTreeMap<String, Command>,
    pub command_order: Vec<String>,
    pub commands_builder: Option<Callable>,
    pub on_enter: Option<Callable>,
    pub on_exit: Option<Callable>,
    pub initial_command: Option<String>,
    pub tui_config: TuiConfig,
}

impl Mode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn register_command(&mut self, command: Command) {
        if !self.commands.contains_key(&command.name) {
            self.command_order.push(command.name.clone());
        }
        self.commands.insert(command.name.clone(), command);
    }
}

/// Everything protected by the manager's single `RwLock` (the
/// "shared-resource policy").
#[derive(Default)]
pub struct ManagerState {
    pub modes: std::collections::BTreeMap<String, Mode>,
    pub mode_order: Vec<String>,
    pub global_commands: std::collections::BTreeMap<String, Command>,
    pub global_command_order: Vec<String>,
    pub active_mode: Option<String>,
    pub exit_requested: bool,
}

impl ManagerState {
    pub fn register_mode(&mut self, mode: Mode) {
        if !self.modes.contains_key(&mode.name) {
            self.mode_order.push(mode.name.clone());
        }
        self.modes.insert(mode.name.clone(), mode);
    }

    pub fn register_global_command(&mut self, command: Command) {
        if !self.global_commands.contains_key(&command.name) {
            self.global_command_order.push(command.name.clone());
        }
        self.global_commands.insert(command.name.clone(), command);
    }

    pub fn active_mode(&self) -> Option<&Mode> {
        self.active_mode.as_ref().and_then(|name| self.modes.get(name))
    }

    pub fn resolve_command(&self, name: &str) -> Option<&Command> {
        self.active_mode()
            .and_then(|mode| mode.commands.get(name))
            .or_else(|| self.global_commands.get(name))
    }
}
