//! A minimal but real raw-mode line editor: printable characters, backspace,
//! Enter, Ctrl-C (clears the current line), Up/Down history, and Tab
//! invoking the completer once then cycling through its results on repeat.
//! Enough to drive the REPL end-to-end without a production-grade editor.

use core_collab::{Document, LineDocument, PromptCompleter, PromptDriver};
use core_errors::ShellError;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::{cursor, execute, style::Print, terminal};
use std::io::{Write, stdout};
use std::sync::Arc;

struct CompletionCycle {
    candidates: Vec<String>,
    index: usize,
    /// The buffer text before the completer was invoked, so cycling can
    /// replace its own previous insertion rather than compounding it.
    base: String,
    replace_start: usize,
    replace_end: usize,
}

pub struct CrosstermLineReader {
    prompt_prefix: String,
    completer: Option<Arc<dyn PromptCompleter>>,
    history: Vec<String>,
    history_cursor: Option<usize>,
    cycle: Option<CompletionCycle>,
}

impl Default for CrosstermLineReader {
    fn default() -> Self {
        Self::new()
    }
}

impl CrosstermLineReader {
    pub fn new() -> Self {
        Self {
            prompt_prefix: String::new(),
            completer: None,
            history: Vec::new(),
            history_cursor: None,
            cycle: None,
        }
    }

    fn redraw(&self, buffer: &str) {
        let mut out = stdout();
        let _ = execute!(
            out,
            cursor::MoveToColumn(0),
            terminal::Clear(terminal::ClearType::CurrentLine),
            Print(format!("{}{}", self.prompt_prefix, buffer))
        );
        let _ = out.flush();
    }

    fn apply_completion(&mut self, buffer: &mut String, cursor_pos: &mut usize) {
        let Some(completer) = self.completer.clone() else {
            return;
        };

        if let Some(cycle) = &mut self.cycle {
            if !cycle.candidates.is_empty() {
                cycle.index = (cycle.index + 1) % cycle.candidates.len();
                let replacement = &cycle.candidates[cycle.index];
                *buffer = format!(
                    "{}{}{}",
                    &cycle.base[..cycle.replace_start],
                    replacement,
                    &cycle.base[cycle.replace_end..]
                );
                *cursor_pos = cycle.replace_start + replacement.len();
                return;
            }
        }

        let doc = LineDocument::new(buffer.clone(), *cursor_pos);
        let suggestions = completer.complete(&doc);
        let current = core_tokenizer::before_cursor(doc.text_before_cursor()).current;
        if suggestions.is_empty() {
            self.cycle = None;
            return;
        }
        let candidates: Vec<String> = suggestions.into_iter().map(|(text, _)| text).collect();
        let replacement = candidates[0].clone();
        let replace_start = current.start;
        let replace_end = current.end;
        let base = buffer.clone();
        *buffer = format!(
            "{}{}{}",
            &base[..replace_start],
            replacement,
            &base[replace_end..]
        );
        *cursor_pos = replace_start + replacement.len();
        self.cycle = Some(CompletionCycle {
            candidates,
            index: 0,
            base,
            replace_start,
            replace_end,
        });
    }
}

impl PromptDriver for CrosstermLineReader {
    fn set_prompt_prefix(&mut self, prefix: String) {
        self.prompt_prefix = prefix;
    }

    fn set_completer(&mut self, completer: Arc<dyn PromptCompleter>) {
        self.completer = Some(completer);
    }

    fn read_line(&mut self) -> Result<Option<String>, ShellError> {
        let mut buffer = String::new();
        let mut cursor_pos = 0usize;
        self.history_cursor = None;
        self.cycle = None;
        self.redraw(&buffer);

        loop {
            let event = event::read()
                .map_err(|e| ShellError::io_failure("reading terminal input", e))?;
            let Event::Key(KeyEvent {
                code, modifiers, ..
            }) = event
            else {
                continue;
            };

            if code != KeyCode::Tab {
                self.cycle = None;
            }

            match code {
                KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                    buffer.clear();
                    cursor_pos = 0;
                    println!();
                    self.redraw(&buffer);
                }
                KeyCode::Char('d') if modifiers.contains(KeyModifiers::CONTROL) && buffer.is_empty() => {
                    println!();
                    return Ok(None);
                }
                KeyCode::Char(c) => {
                    buffer.insert(cursor_pos, c);
                    cursor_pos += c.len_utf8();
                    self.redraw(&buffer);
                }
                KeyCode::Backspace => {
                    if cursor_pos > 0 {
                        let prev = buffer[..cursor_pos]
                            .chars()
                            .next_back()
                            .map(|c| c.len_utf8())
                            .unwrap_or(0);
                        buffer.drain(cursor_pos - prev..cursor_pos);
                        cursor_pos -= prev;
                        self.redraw(&buffer);
                    }
                }
                KeyCode::Enter => {
                    println!();
                    if !buffer.trim().is_empty() {
                        self.history.push(buffer.clone());
                    }
                    return Ok(Some(buffer));
                }
                KeyCode::Up => {
                    if !self.history.is_empty() {
                        let next = match self.history_cursor {
                            Some(i) if i > 0 => i - 1,
                            Some(i) => i,
                            None => self.history.len() - 1,
                        };
                        self.history_cursor = Some(next);
                        buffer = self.history[next].clone();
                        cursor_pos = buffer.len();
                        self.redraw(&buffer);
                    }
                }
                KeyCode::Down => {
                    if let Some(i) = self.history_cursor {
                        if i + 1 < self.history.len() {
                            self.history_cursor = Some(i + 1);
                            buffer = self.history[i + 1].clone();
                        } else {
                            self.history_cursor = None;
                            buffer.clear();
                        }
                        cursor_pos = buffer.len();
                        self.redraw(&buffer);
                    }
                }
                KeyCode::Tab => {
                    self.apply_completion(&mut buffer, &mut cursor_pos);
                    self.redraw(&buffer);
                }
                _ => {}
            }
        }
    }
}
