//! Directive-line helpers shared by the enumerator, projector and includer.

use regex::Regex;

/// Extract the guard identifier from a conditional directive line.
///
/// With `positive` the line must be `#ifdef`, `#if` or `#elif`; otherwise it
/// must be `#ifndef`. Interior spaces are stripped from the returned name,
/// so a compound condition comes back as one opaque token (`A&&B`).
pub fn guard_name(line: &str, positive: bool) -> Option<String> {
    if positive {
        if !line.starts_with("#ifdef ") && !line.starts_with("#if ") && !line.starts_with("#elif ")
        {
            return None;
        }
    } else if !line.starts_with("#ifndef ") {
        return None;
    }

    let rest = &line[line.find(' ')?..];
    let name: String = rest.chars().filter(|c| *c != ' ').collect();
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

/// File name between the quotes of an `#include "..."` directive line.
/// Angle-bracket includes have no quotes and yield `None`.
pub fn header_file_name(line: &str) -> Option<String> {
    let open = line.find('"')?;
    let rest = &line[open + 1..];
    let name: String = rest.chars().take_while(|c| *c != '"').collect();
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

/// Rewrite whole-line `#if defined(NAME)` directives to `#ifdef NAME` so the
/// enumerator and projector see a plain guard. Compound conditions are left
/// untouched and end up treated as opaque guard names.
pub fn replace_if_defined(text: &str) -> String {
    let Ok(re) = Regex::new(r"#if defined\( *([A-Za-z_][A-Za-z0-9_]*) *\)\n") else {
        return text.to_string();
    };
    re.replace_all(text, "#ifdef $1\n").into_owned()
}
