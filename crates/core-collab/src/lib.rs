//! Collaborator-boundary traits and default/noop implementations.
//!
//! Every interaction the core has with the outside world — a script engine,
//! a line editor, durable state, the filesystem, git, the clipboard — is
//! expressed as a small trait here: minimal surface, a reference
//! implementation the rest of the workspace can run against immediately, and
//! room for a real backend to be substituted later without touching callers.

mod fs_provider;
mod git_provider;
mod noop;
mod prompt;
mod script;
mod state_backend;
mod value;

pub use fs_provider::{FsProvider, StdFsProvider};
pub use git_provider::{GitProvider, SystemGitProvider};
pub use noop::{ClipboardProvider, EditorInvoker, HistoryStore, NoopClipboard, NoopEditor, NoopHistory};
pub use prompt::{Document, LineDocument, PromptCompleter, PromptDriver};
pub use script::{Callable, NoopScriptEngine, ScriptContext, ScriptEngine, ScriptHandle, ScriptVm};
pub use state_backend::{MemoryBackend, PersistentBackendUnavailable, StateBackend};
pub use value::Value;
