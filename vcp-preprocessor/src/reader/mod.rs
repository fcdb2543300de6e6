//! Raw stream normalization.
//!
//! Turns an arbitrary character stream into the canonical form the rest of
//! the pipeline works on: `\n` line endings, comments elided, whitespace
//! collapsed, line splices folded while keeping the line count intact.

use anyhow::Result;
use std::io::Read;
use std::iter::Peekable;
use std::str::Chars;
use vcp_common::PreprocessError;

/// Cursor over the input with newline canonicalization: `\r\n` and a lone
/// `\r` both come out as `\n`.
struct Cursor<'a> {
    chars: Peekable<Chars<'a>>,
}

impl<'a> Cursor<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            chars: src.chars().peekable(),
        }
    }

    fn next_norm(&mut self) -> Option<char> {
        match self.chars.next()? {
            '\r' => {
                if self.chars.peek() == Some(&'\n') {
                    self.chars.next();
                }
                Some('\n')
            }
            c => Some(c),
        }
    }

    /// Next character with no newline canonicalization; used inside string
    /// and character literals, which are passed through verbatim.
    fn next_raw(&mut self) -> Option<char> {
        self.chars.next()
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }
}

/// Read and normalize a source stream. The only failure mode is the read
/// itself; normalization consumes anything until EOF.
pub fn read_stream(input: &mut dyn Read, filename: &str) -> Result<String> {
    let mut raw = Vec::new();
    input
        .read_to_end(&mut raw)
        .map_err(|source| PreprocessError::SourceRead {
            filename: filename.to_string(),
            source,
        })?;
    Ok(read(&String::from_utf8_lossy(&raw)))
}

/// Normalize already-loaded source text in a single pass.
pub fn read(src: &str) -> String {
    let mut cur = Cursor::new(src);
    let mut code = String::with_capacity(src.len());
    // Drop a space that follows another space, a '#' or a '/'.
    let mut ignore_space = true;
    // #if( => #if (
    let mut need_space = false;
    // Line splices are skipped here; the deferred newlines are re-emitted
    // after the next real newline so line numbers stay stable.
    let mut pending_newlines = 0usize;

    while let Some(mut ch) = cur.next_norm() {
        if ch != '\n' && (ch.is_whitespace() || ch.is_control()) {
            ch = ' ';
        }

        if ch == ' ' && ignore_space {
            continue;
        }
        ignore_space = matches!(ch, ' ' | '#' | '/');

        if need_space {
            if ch == '(' {
                code.push(' ');
            } else if !ch.is_alphabetic() {
                need_space = false;
            }
        }
        if ch == '#' {
            need_space = true;
        }

        match ch {
            '/' => match cur.peek() {
                Some('/') => {
                    cur.next_norm();
                    loop {
                        match cur.next_norm() {
                            Some('\n') | None => break,
                            Some(_) => {}
                        }
                    }
                    code.push('\n');
                }
                Some('*') => {
                    cur.next_norm();
                    let mut prev = '\0';
                    loop {
                        let Some(c) = cur.next_norm() else { break };
                        if c == '\n' {
                            code.push('\n');
                        }
                        if prev == '*' && c == '/' {
                            break;
                        }
                        prev = c;
                    }
                }
                // Not a comment: leave the next character for the main loop
                // so a following literal is still recognized as one.
                _ => code.push('/'),
            },
            quote @ ('"' | '\'') => {
                code.push(quote);
                loop {
                    let Some(c) = cur.next_raw() else { break };
                    if c == '\\' {
                        match cur.next_norm() {
                            // A splice inside a literal is elided too.
                            Some('\n') => pending_newlines += 1,
                            Some(seq) => {
                                code.push('\\');
                                code.push(seq);
                            }
                            None => {
                                code.push('\\');
                                break;
                            }
                        }
                    } else {
                        code.push(c);
                        if c == quote {
                            break;
                        }
                    }
                }
            }
            '\\' => {
                if matches!(cur.peek(), Some('\n') | Some('\r')) {
                    pending_newlines += 1;
                    cur.next_norm();
                } else {
                    code.push('\\');
                }
            }
            _ => {
                code.push(ch);
                if ch == '\n' && pending_newlines > 0 {
                    for _ in 0..pending_newlines {
                        code.push('\n');
                    }
                    pending_newlines = 0;
                }
            }
        }
    }

    code
}

/// Post-read cleanup applied to the translation unit and to every included
/// header: tabs become spaces, leading indentation is stripped, and spaces
/// touching a newline on either side are removed.
pub fn tidy(text: &str) -> String {
    let replaced = text.replace('\t', " ");
    let trimmed = replaced.trim_start_matches(' ');
    remove_space_near_nl(trimmed)
}

fn remove_space_near_nl(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut it = text.chars().peekable();
    while let Some(c) = it.next() {
        if c == ' ' && (out.ends_with('\n') || it.peek() == Some(&'\n')) {
            continue;
        }
        out.push(c);
    }
    out
}
