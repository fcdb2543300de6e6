//! Quoted-include splicing.
//!
//! Replaces each resolvable `#include "header"` with the header's
//! normalized text bracketed by `#file "<path>"` / `#endfile` markers, the
//! only provenance later stages have. Unresolved and repeated inclusions
//! are dropped silently.

use log::{debug, trace};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::directives::header_file_name;
use crate::reader;

/// Inline `#include "..."` directives into `code` in place.
///
/// Resolution tries each search root in order, then the directory of the
/// translation unit. Spliced text is rescanned from the insertion point, so
/// headers included by headers expand too. A case-folded set of header
/// names as written guards against inclusion loops; a name already spliced
/// once is skipped for the rest of this translation unit.
pub fn handle_includes(code: &mut String, filename: &str, include_dirs: &[PathBuf]) {
    let source_dir = Path::new(filename)
        .parent()
        .unwrap_or_else(|| Path::new(""))
        .to_path_buf();
    let mut handled: HashSet<String> = HashSet::new();
    let mut pos = 0usize;

    while let Some(found) = find_from(code, pos, "#include") {
        // Accept only includes that start a line.
        if found > 0 && code.as_bytes()[found - 1] != b'\n' {
            pos = found + "#include".len();
            continue;
        }
        let end = code[found..]
            .find('\n')
            .map(|e| found + e)
            .unwrap_or(code.len());
        let directive = code[found..end].to_string();
        code.replace_range(found..end, "");
        pos = found;

        let Some(header) = header_file_name(&directive) else {
            continue;
        };
        if !handled.insert(header.to_lowercase()) {
            trace!("skipping repeated include of \"{}\"", header);
            continue;
        }

        let Some((resolved, raw)) = resolve(&header, include_dirs, &source_dir) else {
            debug!("header \"{}\" not found, dropping the directive", header);
            continue;
        };
        let text = reader::tidy(&reader::read(&String::from_utf8_lossy(&raw)));
        if text.is_empty() {
            continue;
        }

        debug!("including {}", resolved.display());
        let block = format!("#file \"{}\"\n{}\n#endfile", resolved.display(), text);
        code.insert_str(found, &block);
        // pos stays at the insertion point: nested includes expand next.
    }
}

fn find_from(code: &str, pos: usize, needle: &str) -> Option<usize> {
    if pos > code.len() {
        return None;
    }
    code[pos..].find(needle).map(|off| pos + off)
}

fn resolve(
    header: &str,
    include_dirs: &[PathBuf],
    source_dir: &Path,
) -> Option<(PathBuf, Vec<u8>)> {
    for dir in include_dirs {
        let candidate = dir.join(header);
        if let Ok(raw) = fs::read(&candidate) {
            // An empty hit does not end the search; the source directory
            // still gets a try.
            if !raw.is_empty() {
                return Some((candidate, raw));
            }
        }
    }
    let candidate = source_dir.join(header);
    fs::read(&candidate).ok().map(|raw| (candidate, raw))
}
