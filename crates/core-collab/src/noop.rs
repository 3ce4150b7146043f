//! Marker collaborators for surfaces no built-in command exercises directly
//! clipboard, external editor invocation, and history file
//! persistence. Mode scripts may reach these through the script-surface API;
//! the core never calls them itself.

pub trait ClipboardProvider: Send + Sync {
    fn copy(&self, text: &str);
    fn paste(&self) -> Option<String>;
}

pub trait EditorInvoker: Send + Sync {
    fn edit(&self, path: &std::path::Path) -> bool;
}

pub trait HistoryStore: Send + Sync {
    fn push(&self, line: &str);
    fn entries(&self) -> Vec<String>;
}

#[derive(Default)]
pub struct NoopClipboard;

impl ClipboardProvider for NoopClipboard {
    fn copy(&self, _text: &str) {}
    fn paste(&self) -> Option<String> {
        None
    }
}

#[derive(Default)]
pub struct NoopEditor;

impl EditorInvoker for NoopEditor {
    fn edit(&self, _path: &std::path::Path) -> bool {
        false
    }
}

#[derive(Default)]
pub struct NoopHistory;

impl HistoryStore for NoopHistory {
    fn push(&self, _line: &str) {}
    fn entries(&self) -> Vec<String> {
        Vec::new()
    }
}
