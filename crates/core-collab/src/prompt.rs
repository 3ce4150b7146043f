//! Line-editor collaborator. `core-terminal` ships the real
//! `CrosstermLineReader`; this crate only defines the seam plus a snapshot
//! type for the document view A's tokenizer consumes.

use core_errors::ShellError;

/// A read-only snapshot of the line under edit, split at the cursor. Used by
/// the completion engine to feed `core_tokenizer::before_cursor`.
pub trait Document {
    fn text_before_cursor(&self) -> &str;
    fn text_after_cursor(&self) -> &str;
    fn cursor_position(&self) -> usize;
}

/// A concrete, owned `Document`. The default prompt driver hands one of
/// these to the completer on every Tab press.
#[derive(Debug, Clone, Default)]
pub struct LineDocument {
    pub text: String,
    pub cursor: usize,
}

impl LineDocument {
    pub fn new(text: impl Into<String>, cursor: usize) -> Self {
        let text = text.into();
        let cursor = cursor.min(text.len());
        Self { text, cursor }
    }
}

impl Document for LineDocument {
    fn text_before_cursor(&self) -> &str {
        &self.text[..self.cursor]
    }

    fn text_after_cursor(&self) -> &str {
        &self.text[self.cursor..]
    }

    fn cursor_position(&self) -> usize {
        self.cursor
    }
}

/// A completer invoked by the prompt driver on Tab. Implemented by
/// `core-runtime`'s dispatcher so the prompt crate never depends on it.
pub trait PromptCompleter: Send + Sync {
    fn complete(&self, doc: &dyn Document) -> Vec<(String, String)>;
}

/// Drives one line of input at a time. `read_line` blocks the calling task
/// until Enter, EOF, or Ctrl-C.
pub trait PromptDriver: Send {
    fn set_prompt_prefix(&mut self, prefix: String);
    fn set_completer(&mut self, completer: std::sync::Arc<dyn PromptCompleter>);
    fn read_line(&mut self) -> Result<Option<String>, ShellError>;
}
