//! Source location tracking for diagnostics
//!
//! Preprocessed text only keeps per-line provenance (through `#file`
//! markers), so a location is a filename plus a 1-based line number.
//! Line 0 denotes a file-scope condition with no usable line.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A location in a source file
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    pub filename: String,
    pub line: u32,
}

impl SourceLocation {
    /// Create a location with filename
    pub fn new(filename: &str, line: u32) -> Self {
        Self {
            filename: filename.to_string(),
            line,
        }
    }

    /// Create a dummy location for testing
    pub fn dummy() -> Self {
        Self::new("<unknown>", 0)
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.filename, self.line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_location() {
        let loc = SourceLocation::new("test.c", 42);
        assert_eq!(loc.filename, "test.c");
        assert_eq!(loc.line, 42);
        assert_eq!(format!("{}", loc), "test.c:42");
    }

    #[test]
    fn test_dummy_location() {
        let loc = SourceLocation::dummy();
        assert_eq!(format!("{}", loc), "<unknown>:0");
    }
}
