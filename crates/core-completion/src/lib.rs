//! Tab-completion engine. Ranks suggestions for the command
//! name, then for arguments of a resolved command, by delegating to A for
//! tokenization and to the filesystem/git collaborators for their
//! respective completers.

mod fs_suggest;

use core_collab::{FsProvider, GitProvider};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    pub text: String,
    pub description: String,
}

/// The closed set of argument completers a command may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgCompleter {
    File,
    Flag,
    GitRef,
}

#[derive(Debug, Clone)]
pub struct FlagDef {
    pub name: String,
    pub description: String,
}

/// The subset of `core-runtime::Command` the completer needs to know about.
#[derive(Debug, Clone, Default)]
pub struct CommandMeta {
    pub description: String,
    pub arg_completers: Vec<ArgCompleter>,
    pub flag_defs: Vec<FlagDef>,
}

/// Read-only registry lookups, implemented by `core-runtime`'s manager
/// read-guard so this crate never depends on the dispatcher.
pub trait CompletionContext {
    fn mode_names(&self) -> Vec<String>;
    fn active_mode_commands(&self) -> Vec<(String, CommandMeta)>;
    fn global_commands(&self) -> Vec<(String, CommandMeta)>;
}

/// `(name, description)` pairs for the seven built-in commands, in display
/// order.
pub const BUILTIN_COMMANDS: &[(&str, &str)] = &[
    ("help", "list available commands"),
    ("exit", "exit the shell"),
    ("quit", "exit the shell"),
    ("mode", "switch the active mode"),
    ("modes", "list registered modes"),
    ("state", "inspect state entries"),
    ("reset", "clear all state"),
];

const COMMON_GIT_REFS: &[&str] = &["HEAD", "HEAD~1", "HEAD~2", "HEAD~3"];

pub fn suggest(
    before: &str,
    full: &str,
    ctx: &dyn CompletionContext,
    fs: &dyn FsProvider,
    git: &dyn GitProvider,
) -> Vec<Suggestion> {
    let _ = full; // reserved for completers that need text after the cursor; none do yet.
    let parsed = core_tokenizer::before_cursor(before);
    let completed: Vec<String> = parsed.completed.into_iter().map(|t| t.text).collect();
    let current_text = parsed.current.text;
    let trailing_space = before.ends_with(' ');

    if completed.is_empty() {
        return suggest_command_name(&current_text, ctx);
    }

    if completed.len() == 1 && completed[0] == "mode" {
        return ctx
            .mode_names()
            .into_iter()
            .filter(|m| m.starts_with(current_text.as_str()))
            .map(|m| Suggestion {
                text: m,
                description: String::new(),
            })
            .collect();
    }

    let command_name = &completed[0];
    let meta = ctx
        .active_mode_commands()
        .into_iter()
        .find(|(name, _)| name == command_name)
        .or_else(|| {
            ctx.global_commands()
                .into_iter()
                .find(|(name, _)| name == command_name)
        });
    let Some((_, meta)) = meta else {
        return Vec::new();
    };

    let mut out = Vec::new();
    let mut file_processed = false;
    for completer in &meta.arg_completers {
        match completer {
            ArgCompleter::File => {
                if !file_processed {
                    file_processed = true;
                    out.extend(fs_suggest::fs_suggest(&current_text, fs));
                }
            }
            ArgCompleter::Flag => {
                let needle = current_text.to_lowercase();
                for flag in &meta.flag_defs {
                    let candidate = format!("--{}", flag.name);
                    if needle.is_empty() || candidate.to_lowercase().starts_with(&needle) {
                        out.push(Suggestion {
                            text: candidate,
                            description: flag.description.clone(),
                        });
                    }
                }
            }
            ArgCompleter::GitRef => {
                let needle = current_text.to_lowercase();
                let matches = |candidate: &str| candidate.to_lowercase().starts_with(&needle);
                for r in COMMON_GIT_REFS {
                    if matches(r) {
                        out.push(Suggestion {
                            text: r.to_string(),
                            description: String::new(),
                        });
                    }
                }
                for b in git.branches().into_iter().filter(|b| matches(b)) {
                    out.push(Suggestion {
                        text: b,
                        description: String::new(),
                    });
                }
                for t in git.tags().into_iter().filter(|t| matches(t)) {
                    out.push(Suggestion {
                        text: t,
                        description: String::new(),
                    });
                }
            }
        }
    }

    if file_processed && out.is_empty() {
        let simple_first_argument = completed.len() == 1
            && !current_text.is_empty()
            && !current_text.contains('/')
            && !trailing_space;
        if !simple_first_argument {
            out.extend(fs_suggest::fs_suggest("", fs));
        }
    }

    out
}

fn suggest_command_name(current_text: &str, ctx: &dyn CompletionContext) -> Vec<Suggestion> {
    let mut order: Vec<String> = Vec::new();
    let mut descriptions: HashMap<String, String> = HashMap::new();

    for (name, description) in BUILTIN_COMMANDS {
        order.push((*name).to_string());
        descriptions.insert((*name).to_string(), (*description).to_string());
    }
    for (name, meta) in ctx.global_commands() {
        if !descriptions.contains_key(&name) {
            order.push(name.clone());
        }
        descriptions.insert(name, meta.description);
    }
    for (name, meta) in ctx.active_mode_commands() {
        if !descriptions.contains_key(&name) {
            order.push(name.clone());
        }
        descriptions.insert(name, meta.description);
    }

    order
        .into_iter()
        .filter(|name| name.starts_with(current_text))
        .map(|name| Suggestion {
            description: descriptions.get(&name).cloned().unwrap_or_default(),
            text: name,
        })
        .collect()
}
