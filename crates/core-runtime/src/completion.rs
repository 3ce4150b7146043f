//! Bridges the manager's registries into `core_completion::CompletionContext`.
//! The snapshot is built while the read lock is held and released before
//! `core_completion::suggest` runs, matching "completion callback runs
//! without holding any lock on entry and takes the read lock briefly".

use crate::manager::{Command, ManagerState};
use core_completion::{CommandMeta, CompletionContext};

pub(crate) struct CompletionSnapshot {
    pub mode_names: Vec<String>,
    pub active_mode_commands: Vec<(String, CommandMeta)>,
    pub global_commands: Vec<(String, CommandMeta)>,
}

impl CompletionContext for CompletionSnapshot {
    fn mode_names(&self) -> Vec<String> {
        self.mode_names.clone()
    }

    fn active_mode_commands(&self) -> Vec<(String, CommandMeta)> {
        self.active_mode_commands.clone()
    }

    fn global_commands(&self) -> Vec<(String, CommandMeta)> {
        self.global_commands.clone()
    }
}

fn to_meta(command: &Command) -> CommandMeta {
    CommandMeta {
        description: command.description.clone(),
        arg_completers: command.arg_completers.clone(),
        flag_defs: command.flag_defs.clone(),
    }
}

pub(crate) fn snapshot(state: &ManagerState) -> CompletionSnapshot {
    CompletionSnapshot {
        mode_names: state.mode_order.clone(),
        active_mode_commands: state
            .active_mode()
            .map(|mode| {
                mode.command_order
                    .iter()
                    .map(|name| (name.clone(), to_meta(&mode.commands[name])))
                    .collect()
            })
            .unwrap_or_default(),
        global_commands: state
            .global_command_order
            .iter()
            .map(|name| (name.clone(), to_meta(&state.global_commands[name])))
            .collect(),
    }
}
