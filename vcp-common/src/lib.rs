//! VCP - Common Types and Utilities
//!
//! This crate contains the diagnostic types and source locations shared by
//! the components of the VCP static-analysis front end.

pub mod error;
pub mod source_loc;

pub use error::{Diagnostic, ErrorReporter, ErrorSink, PreprocessError, Severity};
pub use source_loc::SourceLocation;
