//! Shell-style command-line tokenizer with cursor tracking.
//!
//! Single-pass, byte-oriented lexer respecting single quotes, double quotes,
//! and backslash escapes. Both the command executor and the completion
//! engine route through the same [`tokenize`] core so "the token under the
//! cursor" never diverges between the two call sites.

mod canon;

pub use canon::{canonicalize, quote_token};

/// A single token together with the byte range it occupies in the source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub start: usize,
    pub end: usize,
}

impl Token {
    fn empty_at(pos: usize) -> Self {
        Self {
            text: String::new(),
            start: pos,
            end: pos,
        }
    }
}

/// Result of tokenizing only the portion of a line to the left of the cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BeforeCursorResult {
    /// Tokens strictly before the cursor, each fully closed.
    pub completed: Vec<Token>,
    /// The token whose range contains the cursor, possibly empty.
    pub current: Token,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum QuoteState {
    None,
    Single,
    Double,
}

/// Tokenize `input`, returning every token with its byte range.
///
/// Unclosed quotes at end of input are permitted: the token extends to
/// end-of-input and is reported without its opening quote.
pub fn tokenize(input: &str) -> Vec<Token> {
    let bytes = input.as_bytes();
    let len = bytes.len();
    let mut tokens = Vec::new();
    let mut state = QuoteState::None;
    let mut buf: Vec<u8> = Vec::new();
    let mut tok_start: Option<usize> = None;
    let mut i = 0usize;

    while i < len {
        let b = bytes[i];
        match state {
            QuoteState::None => {
                if b.is_ascii_whitespace() {
                    if let Some(start) = tok_start.take() {
                        tokens.push(finish(&mut buf, start, i));
                    }
                    i += 1;
                } else if b == b'\'' {
                    tok_start.get_or_insert(i);
                    state = QuoteState::Single;
                    i += 1;
                } else if b == b'"' {
                    tok_start.get_or_insert(i);
                    state = QuoteState::Double;
                    i += 1;
                } else if b == b'\\' {
                    tok_start.get_or_insert(i);
                    if i + 1 < len {
                        buf.push(bytes[i + 1]);
                        i += 2;
                    } else {
                        i += 1;
                    }
                } else {
                    tok_start.get_or_insert(i);
                    buf.push(b);
                    i += 1;
                }
            }
            QuoteState::Single => {
                if b == b'\'' {
                    state = QuoteState::None;
                    i += 1;
                } else {
                    buf.push(b);
                    i += 1;
                }
            }
            QuoteState::Double => {
                if b == b'"' {
                    state = QuoteState::None;
                    i += 1;
                } else if b == b'\\' {
                    if i + 1 < len {
                        buf.push(bytes[i + 1]);
                        i += 2;
                    } else {
                        i += 1;
                    }
                } else {
                    buf.push(b);
                    i += 1;
                }
            }
        }
    }
    if let Some(start) = tok_start {
        tokens.push(finish(&mut buf, start, len));
    }
    tokens
}

fn finish(buf: &mut Vec<u8>, start: usize, end: usize) -> Token {
    // `buf` only ever receives bytes copied verbatim from the source `&str`;
    // quote/escape/whitespace handling only special-cases ASCII bytes, so a
    // multi-byte UTF-8 sequence is never split across the boundary.
    let text = String::from_utf8(std::mem::take(buf))
        .expect("tokenizer never splits a UTF-8 code point");
    Token { text, start, end }
}

/// Tokens only, quotes and escapes removed.
pub fn parse_slice(line: &str) -> Vec<String> {
    tokenize(line).into_iter().map(|t| t.text).collect()
}

/// Tokenize the prefix of a line to the left of the cursor. The cursor
/// position is `before.len()`.
pub fn before_cursor(before: &str) -> BeforeCursorResult {
    let cursor = before.len();
    let mut tokens = tokenize(before);
    match tokens.last() {
        Some(last) if last.end == cursor => {
            let current = tokens.pop().expect("checked Some above");
            BeforeCursorResult {
                completed: tokens,
                current,
            }
        }
        _ => BeforeCursorResult {
            completed: tokens,
            current: Token::empty_at(cursor),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_whitespace() {
        assert_eq!(parse_slice("foo bar  baz"), vec!["foo", "bar", "baz"]);
    }

    #[test]
    fn single_quotes_are_literal() {
        assert_eq!(parse_slice(r#"echo 'a b  c'"#), vec!["echo", "a b  c"]);
    }

    #[test]
    fn double_quotes_honour_escapes() {
        assert_eq!(parse_slice(r#"echo "a \"b\" c""#), vec!["echo", r#"a "b" c"#]);
    }

    #[test]
    fn backslash_escapes_outside_quotes() {
        assert_eq!(parse_slice(r"foo\ bar baz"), vec!["foo bar", "baz"]);
    }

    #[test]
    fn unclosed_single_quote_runs_to_end() {
        let tokens = tokenize("echo 'abc");
        assert_eq!(tokens[1].text, "abc");
        assert_eq!(tokens[1].start, 5);
        assert_eq!(tokens[1].end, 9);
    }

    #[test]
    fn unclosed_double_quote_runs_to_end() {
        assert_eq!(parse_slice(r#"echo "abc"#), vec!["echo", "abc"]);
    }

    #[test]
    fn quotes_do_not_split_a_token() {
        assert_eq!(parse_slice("'ab'cd\"ef\""), vec!["abcdef"]);
    }

    #[test]
    fn before_cursor_mid_token() {
        let r = before_cursor("add READ");
        assert_eq!(r.completed, vec![Token { text: "add".into(), start: 0, end: 3 }]);
        assert_eq!(r.current, Token { text: "READ".into(), start: 4, end: 8 });
    }

    #[test]
    fn before_cursor_after_trailing_space() {
        let r = before_cursor("add NOMATCH ");
        assert_eq!(r.completed.len(), 2);
        assert_eq!(r.current, Token::empty_at(12));
    }

    #[test]
    fn before_cursor_empty_line() {
        let r = before_cursor("");
        assert!(r.completed.is_empty());
        assert_eq!(r.current, Token::empty_at(0));
    }

    #[test]
    fn before_cursor_just_whitespace() {
        let r = before_cursor("   ");
        assert!(r.completed.is_empty());
        assert_eq!(r.current, Token::empty_at(3));
    }

    #[test]
    fn before_cursor_cursor_right_after_closing_quote() {
        // Cursor sits at the token boundary, not inside a fresh token.
        let r = before_cursor("add \"~\"");
        assert_eq!(r.completed, vec![Token { text: "add".into(), start: 0, end: 3 }]);
        assert_eq!(r.current.text, "~");
        assert_eq!(r.current.end, 7);
    }

    #[test]
    fn law_end_equals_line_length() {
        for line in ["", "a", "a b", "a 'b c", "a\\ b", "  "] {
            let r = before_cursor(line);
            assert_eq!(r.current.end, line.len());
            assert!(r.current.start <= r.current.end);
            assert!(r.current.end <= line.len());
        }
    }

    #[test]
    fn law_completed_plus_current_matches_parse_slice() {
        for line in ["add foo", "add foo ", "echo 'a b' c", "", "   ", "one"] {
            let r = before_cursor(line);
            let mut texts: Vec<String> = r.completed.iter().map(|t| t.text.clone()).collect();
            if !r.current.text.is_empty() {
                texts.push(r.current.text.clone());
            }
            assert_eq!(texts, parse_slice(line), "line = {line:?}");
        }
    }

    #[test]
    fn parse_slice_is_idempotent_via_canonicalizer() {
        for line in ["foo bar", "a 'b c' d", "x\\ y \"z w\"", "plain"] {
            let tokens = parse_slice(line);
            let canonical = canonicalize(&tokens);
            assert_eq!(parse_slice(&canonical), tokens, "line = {line:?}");
        }
    }
}
