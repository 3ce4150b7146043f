//! The runtime crate: command/mode registry, the single
//! writer actor, and the dispatcher tying them to the script, state, and
//! filesystem/git collaborators.

mod completion;
mod dispatcher;
mod manager;
mod writer;

pub use dispatcher::Manager;
pub use manager::{
    ArgCompleter, Command, CommandHandler, FlagDef, ManagerState, Mode, NativeHandler, TuiConfig,
};
pub use writer::{WriterHandle, WRITER_CHANNEL_CAP};
