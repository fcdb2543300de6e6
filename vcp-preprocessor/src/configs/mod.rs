//! Conditional-compilation configurations.
//!
//! A configuration is a semicolon-joined list of guard names that must all
//! be defined; `""` is the baseline, `"0"` is unreachable and `"1"` is
//! always-on. `enumerate` collects every distinct combination reachable in
//! the top-level file, `project` filters the text down to one of them.

use log::debug;

use crate::directives::guard_name;

/// Collect the configurations reachable in `filedata`. The baseline `""`
/// is always the first entry; duplicates are collapsed in order of first
/// appearance. Text between `#file`/`#endfile` markers is ignored, only
/// the translation unit's own guards shape the result.
pub fn enumerate(filedata: &str) -> Vec<String> {
    let mut ret: Vec<String> = vec![String::new()];
    let mut deflist: Vec<String> = Vec::new();
    let mut filelevel = 0usize;

    for line in filedata.lines() {
        if line.starts_with("#file ") {
            filelevel += 1;
            continue;
        }
        if line.starts_with("#endfile") {
            filelevel = filelevel.saturating_sub(1);
            continue;
        }
        if filelevel > 0 {
            continue;
        }

        let def = guard_name(line, true).or_else(|| guard_name(line, false));
        if let Some(def) = def {
            if !deflist.is_empty() && line.starts_with("#elif ") {
                deflist.pop();
            }
            deflist.push(def);

            let mut cfg = String::new();
            for d in &deflist {
                if d == "0" {
                    break;
                }
                if d == "1" {
                    continue;
                }
                if !cfg.is_empty() {
                    cfg.push(';');
                }
                cfg.push_str(d);
            }
            if !ret.contains(&cfg) {
                ret.push(cfg);
            }
        }

        if line.starts_with("#else") && !deflist.is_empty() {
            let flipped = if deflist.last().map(String::as_str) == Some("1") {
                "0"
            } else {
                "1"
            };
            deflist.pop();
            deflist.push(flipped.to_string());
        }
        if line.starts_with("#endif") {
            deflist.pop();
        }
    }

    debug!("enumerated {} configuration(s)", ret.len());
    ret
}

/// Does guard `def` hold under configuration `cfg`?
pub fn match_cfg_def(cfg: &str, def: &str) -> bool {
    match def {
        "0" => false,
        "1" => true,
        _ => !cfg.is_empty() && cfg.split(';').any(|part| part == def),
    }
}

/// Emit the projection of `filedata` under `cfg`, line for line: every
/// input line produces exactly one output newline. Directive lines other
/// than `#define`, `#file` and `#endfile` are blanked, as are lines in
/// branches the configuration does not select.
pub fn project(filedata: &str, cfg: &str) -> String {
    let mut ret = String::with_capacity(filedata.len());
    // Parallel stacks: is the current branch selected, and has any branch
    // of this #if-chain been selected so far.
    let mut matching: Vec<bool> = Vec::new();
    let mut matched: Vec<bool> = Vec::new();
    let mut active = true;

    for line in filedata.lines() {
        let def = guard_name(line, true);
        let ndef = guard_name(line, false);

        if line.starts_with("#elif ") {
            if matched.last().copied().unwrap_or(false) {
                if let Some(top) = matching.last_mut() {
                    *top = false;
                }
            } else if def.as_deref().is_some_and(|d| match_cfg_def(cfg, d)) {
                if let Some(top) = matching.last_mut() {
                    *top = true;
                }
                if let Some(top) = matched.last_mut() {
                    *top = true;
                }
            }
        } else if let Some(d) = def {
            let hit = match_cfg_def(cfg, &d);
            matching.push(hit);
            matched.push(hit);
        } else if let Some(nd) = ndef {
            let hit = !match_cfg_def(cfg, &nd);
            matching.push(hit);
            matched.push(hit);
        } else if line == "#else" {
            if let (Some(top), Some(was)) = (matching.last_mut(), matched.last()) {
                *top = !*was;
            }
        } else if line.starts_with("#endif") {
            matched.pop();
            matching.pop();
        }

        if line.starts_with('#') {
            active = matching.iter().all(|&b| b);
        }

        let keep_directive = line.starts_with("#file \"")
            || line.starts_with("#endfile")
            || line.starts_with("#define");
        if keep_directive {
            ret.push_str(line);
        } else if active && !line.starts_with('#') {
            ret.push_str(line);
        }
        ret.push('\n');
    }

    ret
}
