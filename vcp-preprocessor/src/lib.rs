//! Configuration-enumerating C/C++ preprocessor.
//!
//! Front end of a static-analysis pipeline: a translation unit comes in as
//! a character stream, and one flat preprocessed text comes out for every
//! distinct combination of conditional-compilation guards the file can be
//! built under. Quoted includes are inlined between `#file`/`#endfile`
//! markers, conditional blocks are elided per configuration, and macros are
//! expanded. Line counts are preserved end to end so diagnostics can point
//! back into the original source.
//!
//! The result is deliberately an over-approximation: `#if` expressions are
//! treated as opaque guard names, never evaluated.

pub mod configs;
pub mod directives;
pub mod includes;
pub mod lexer;
pub mod macros;
pub mod reader;

use anyhow::Result;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::PathBuf;
use vcp_common::ErrorSink;

/// A configuration name: guard identifiers joined with `;`, in order of
/// appearance. `""` is the baseline, `"0"` unreachable, `"1"` always-on.
pub type Cfg = String;

/// Stateless driver for the preprocessing pipeline. Holds nothing but the
/// include search roots; every call works on value state of its own.
pub struct Preprocessor {
    include_dirs: Vec<PathBuf>,
}

impl Preprocessor {
    pub fn new() -> Self {
        Self {
            include_dirs: vec![],
        }
    }

    /// Add an include search root; roots are tried in insertion order.
    pub fn add_include_dir(&mut self, dir: PathBuf) {
        self.include_dirs.push(dir);
    }

    /// Full pipeline: one preprocessed text per reachable configuration.
    /// The baseline `""` entry is always present.
    pub fn preprocess(
        &self,
        input: &mut dyn Read,
        filename: &str,
        sink: &mut dyn ErrorSink,
    ) -> Result<BTreeMap<Cfg, String>> {
        let (data, cfgs) = self.scan(input, filename)?;
        let mut result = BTreeMap::new();
        for cfg in cfgs {
            let text = self.getcode(&data, &cfg, filename, sink);
            result.insert(cfg, text);
        }
        Ok(result)
    }

    /// First half of the pipeline: the normalized text with includes
    /// inlined, plus the enumerated configurations. Pair with [`getcode`]
    /// when only some variants are wanted.
    ///
    /// [`getcode`]: Preprocessor::getcode
    pub fn scan(&self, input: &mut dyn Read, filename: &str) -> Result<(String, Vec<Cfg>)> {
        let mut data = reader::tidy(&reader::read_stream(input, filename)?);
        includes::handle_includes(&mut data, filename, &self.include_dirs);
        let data = directives::replace_if_defined(&data);
        let cfgs = configs::enumerate(&data);
        Ok((data, cfgs))
    }

    /// Project one configuration out of scanned text and expand its macros.
    pub fn getcode(
        &self,
        filedata: &str,
        cfg: &str,
        filename: &str,
        sink: &mut dyn ErrorSink,
    ) -> String {
        let projected = configs::project(filedata, cfg);
        macros::expand(&projected, filename, sink)
    }
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new()
    }
}
