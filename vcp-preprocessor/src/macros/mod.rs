//! `#define` parsing and macro expansion.
//!
//! The expander works the way the projector hands text over: it scans for
//! the next `#define`, erases it (leaving the blank line), and rewrites the
//! remainder of the text for that one name before moving on. Definitions
//! shadow earlier ones, and a later `#define`/`#undef` of the same name
//! stops the rewrite at that point.

use log::trace;
use vcp_common::{Diagnostic, ErrorSink, SourceLocation};

use crate::lexer::{self, TokenKind};

/// One parsed `#define`.
#[derive(Debug, Clone)]
pub struct Macro {
    pub name: String,
    pub params: Vec<String>,
    pub variadic: bool,
    pub function_like: bool,
    pub body: String,
}

impl Macro {
    /// Parse the text following `#define ` on a directive line. Returns
    /// `None` when no macro name is present.
    pub fn parse(text: &str) -> Option<Macro> {
        let toks = lexer::tokenize(text);
        let first = toks.first()?;
        if !first.is_name() {
            return None;
        }
        let name = first.text.clone();
        // Function-like only when the '(' hugs the name.
        let function_like = toks
            .get(1)
            .is_some_and(|t| t.kind == TokenKind::LeftParen && t.gap.is_empty());

        let mut params = Vec::new();
        let mut variadic = false;
        if function_like {
            // `name(a, b)`, `name(a, ...)` (implicit __VA_ARGS__) or the
            // named form `name(a, rest...)`.
            let mut prev_ident = false;
            for t in &toks[2..] {
                match t.kind {
                    TokenKind::RightParen => break,
                    TokenKind::Identifier => {
                        params.push(t.text.clone());
                        prev_ident = true;
                    }
                    TokenKind::Ellipsis => {
                        variadic = true;
                        if !prev_ident {
                            params.push("__VA_ARGS__".to_string());
                        }
                        break;
                    }
                    _ => prev_ident = false,
                }
            }
        }

        let body = if function_like {
            match text.find(')') {
                Some(p) => text[p + 1..].trim().to_string(),
                None => String::new(),
            }
        } else {
            let name_end = first.gap.len() + name.len();
            text[name_end.min(text.len())..].trim().to_string()
        };

        Some(Macro {
            name,
            params,
            variadic,
            function_like,
            body,
        })
    }

    fn variadic_param(&self) -> Option<&str> {
        if self.variadic {
            self.params.last().map(String::as_str)
        } else {
            None
        }
    }

    fn param_index(&self, tok: &str) -> Option<usize> {
        self.params.iter().position(|p| p == tok)
    }

    /// The comma-joined tail of call arguments the variadic parameter
    /// absorbs.
    fn variadic_tail(&self, args: &[String]) -> String {
        let first = self.params.len().saturating_sub(1);
        args.get(first..).unwrap_or(&[]).join(",")
    }

    fn param_value(&self, idx: usize, args: &[String]) -> String {
        if self.variadic && idx + 1 == self.params.len() {
            self.variadic_tail(args)
        } else {
            args.get(idx).cloned().unwrap_or_default()
        }
    }

    fn substitute(&self, tok: &str, args: &[String]) -> String {
        if let Some(stripped) = tok.strip_prefix('#') {
            if let Some(idx) = self.param_index(stripped) {
                return format!("\"{}\"", self.param_value(idx, args));
            }
            return tok.to_string();
        }
        if let Some(idx) = self.param_index(tok) {
            return self.param_value(idx, args);
        }
        tok.to_string()
    }

    /// Produce the expansion for one invocation. The body's own spacing is
    /// preserved; `##` fuses its operands, and `, ## <variadic>` drops the
    /// comma when the variadic tail is empty.
    pub fn expand(&self, args: &[String]) -> String {
        if !self.function_like {
            return self.body.clone();
        }

        let toks = lexer::tokenize(&self.body);
        let mut out = String::new();
        let mut i = 0usize;
        while i < toks.len() {
            let t = &toks[i];

            if let Some(va) = self.variadic_param() {
                if t.text == ","
                    && toks.get(i + 1).map(|x| x.text.as_str()) == Some("##")
                    && toks.get(i + 2).map(|x| x.text.as_str()) == Some(va)
                {
                    let tail = self.variadic_tail(args);
                    if !tail.is_empty() {
                        out.push_str(&t.gap);
                        out.push(',');
                        out.push_str(&toks[i + 1].gap);
                        out.push_str(&tail);
                    }
                    i += 3;
                    continue;
                }
            }

            if t.text == "##" {
                while out.ends_with(' ') {
                    out.pop();
                }
                i += 1;
                if let Some(next) = toks.get(i) {
                    out.push_str(&self.substitute(&next.text, args));
                    i += 1;
                }
                continue;
            }

            out.push_str(&t.gap);
            out.push_str(&self.substitute(&t.text, args));
            i += 1;
        }
        out
    }
}

/// Expand every macro defined in `code`. On an unterminated string or
/// character literal the error is reported through `sink` and empty text
/// is returned; the trailing pass blanks any `#undef` lines left over.
pub fn expand(code: &str, filename: &str, sink: &mut dyn ErrorSink) -> String {
    let mut code = code.to_string();
    let mut defpos = 0usize;
    loop {
        let Some(dp) = find_from(&code, defpos, "#define ") else {
            break;
        };
        defpos = dp;
        // Accept only directives that start a line.
        if dp > 0 && code.as_bytes()[dp - 1] != b'\n' {
            defpos = dp + 6;
            continue;
        }
        let Some(nl) = code[dp + 8..].find('\n').map(|p| dp + 8 + p) else {
            code.truncate(dp);
            break;
        };
        let macro_text = code[dp + 8..nl].to_string();
        code.replace_range(dp..nl, "");
        let Some(mac) = Macro::parse(&macro_text) else {
            continue;
        };
        trace!("expanding macro {}", mac.name);
        if !expand_occurrences(&mut code, dp, &mac, filename, sink) {
            return String::new();
        }
    }
    strip_undefs(&mut code);
    code
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

fn find_from(code: &str, pos: usize, needle: &str) -> Option<usize> {
    if pos > code.len() {
        return None;
    }
    code[pos..].find(needle).map(|off| pos + off)
}

/// Rewrite every invocation of `mac` after `start`. Returns false when the
/// scan runs into an unterminated literal.
fn expand_occurrences(
    code: &mut String,
    start: usize,
    mac: &Macro,
    filename: &str,
    sink: &mut dyn ErrorSink,
) -> bool {
    let Some(first_char) = mac.name.chars().next() else {
        return true;
    };

    let mut pos1 = start;
    loop {
        let from = pos1 + 1;
        if from >= code.len() {
            break;
        }
        let Some(off) =
            code[from..].find(|c: char| c == '"' || c == '\'' || c == '#' || c == first_char)
        else {
            break;
        };
        pos1 = from + off;
        let ch = code.as_bytes()[pos1];

        if ch == b'#' {
            // Only a later #define/#undef of this very name matters: it
            // shadows the definition for the rest of the text.
            let after = if code[pos1..].starts_with("#undef ") {
                pos1 + 7
            } else if code[pos1..].starts_with("#define ") {
                pos1 + 8
            } else {
                continue;
            };
            pos1 = after;
            let name_end = pos1 + mac.name.len();
            if name_end < code.len()
                && code[pos1..].starts_with(&mac.name)
                && !is_ident_byte(code.as_bytes()[name_end])
            {
                break;
            }
            continue;
        }

        if ch == b'"' || ch == b'\'' {
            let mut p = pos1 + 1;
            loop {
                if p >= code.len() {
                    sink.report(Diagnostic::error(
                        "noQuoteCharPair",
                        SourceLocation::new(filename, 0),
                        format!(
                            "No pair for character ({}). Can't process file. \
                             File is either invalid or unicode, which is currently not supported.",
                            ch as char
                        ),
                    ));
                    return false;
                }
                let b = code.as_bytes()[p];
                if b == ch {
                    break;
                }
                if b == b'\\' {
                    p += 1;
                }
                p += 1;
            }
            pos1 = p;
            continue;
        }

        // Candidate invocation: the name delimited by non-identifier chars.
        if !code[pos1..].starts_with(&mac.name) {
            continue;
        }
        if pos1 > 0 && is_ident_byte(code.as_bytes()[pos1 - 1]) {
            continue;
        }
        let name_end = pos1 + mac.name.len();
        if name_end < code.len() && is_ident_byte(code.as_bytes()[name_end]) {
            continue;
        }

        let mut newlines = 0usize;
        let mut args: Vec<String> = Vec::new();
        let replace_end;
        if mac.function_like {
            let mut p = name_end;
            while p < code.len() && code.as_bytes()[p] == b' ' {
                p += 1;
            }
            if p >= code.len() || code.as_bytes()[p] != b'(' {
                continue;
            }
            let Some(close) = parse_arguments(code, p, &mut args, &mut newlines) else {
                continue;
            };
            replace_end = close + 1;
        } else {
            replace_end = name_end;
        }

        if !mac.variadic && args.len() != mac.params.len() {
            let empty_call =
                mac.params.is_empty() && args.len() == 1 && args[0].is_empty();
            if !empty_call {
                continue;
            }
        }

        // Newlines swallowed by the argument list come back as a blank-line
        // prefix so line numbers stay stable.
        let mut expansion = "\n".repeat(newlines);
        expansion.push_str(&mac.expand(&args));
        code.replace_range(pos1..replace_end, &expansion);
        pos1 = (pos1 + expansion.len()).saturating_sub(1);
    }
    true
}

/// Parse a parenthesized argument list starting at the `(` at `open`.
/// Returns the index of the closing `)`, or `None` when the list never
/// closes. Arguments keep their interior spacing but not a leading run;
/// newlines are counted, not kept.
fn parse_arguments(
    code: &str,
    open: usize,
    args: &mut Vec<String>,
    newlines: &mut usize,
) -> Option<usize> {
    let mut par = String::new();
    let mut parlevel = 0i32;
    let mut p = open;

    while p < code.len() {
        let c = code[p..].chars().next()?;
        let clen = c.len_utf8();
        match c {
            '(' => {
                parlevel += 1;
                if parlevel == 1 {
                    p += 1;
                    continue;
                }
            }
            ')' => {
                parlevel -= 1;
                if parlevel <= 0 {
                    args.push(par);
                    return Some(p);
                }
            }
            '"' | '\'' => {
                par.push(c);
                p += 1;
                loop {
                    if p >= code.len() {
                        return None;
                    }
                    let d = match code[p..].chars().next() {
                        Some(d) => d,
                        None => return None,
                    };
                    if d == c {
                        break;
                    }
                    par.push(d);
                    if d == '\\' {
                        p += 1;
                        if let Some(e) = code.get(p..).and_then(|s| s.chars().next()) {
                            par.push(e);
                            p += e.len_utf8();
                        }
                        continue;
                    }
                    p += d.len_utf8();
                }
                par.push(c);
                p += 1;
                continue;
            }
            '\n' => *newlines += 1,
            _ => {}
        }

        if parlevel == 1 && c == ',' {
            args.push(std::mem::take(&mut par));
        } else if c == ' ' {
            if !par.is_empty() {
                par.push(' ');
            }
        } else if parlevel >= 1 && c != '\n' {
            par.push(c);
        }
        p += clen;
    }
    None
}

/// Blank every `#undef` line; expansion is done with them.
fn strip_undefs(code: &mut String) {
    let mut pos = 0usize;
    while let Some(found) = find_from(code, pos, "\n#undef ") {
        let dp = found + 1;
        let end = code[dp..].find('\n').map(|e| dp + e).unwrap_or(code.len());
        code.replace_range(dp..end, "");
        pos = dp;
    }
}
