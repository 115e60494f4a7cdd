//! Loader for the subset of the Ignition v3 config schema that extraction needs.
//!
//! [`parse`] never panics on malformed input: it always hands back a
//! [`Report`] alongside the result, so callers can show every diagnostic
//! before deciding whether to continue.

pub mod document;
pub mod parser;
pub mod report;

pub use document::{
    normalize_path, ConfigVersion, Document, FileEntry, HttpHeader, IgnitionSection, PathProblem,
    Resource, Storage,
};
pub use parser::{parse, ParseError, SUPPORTED_MAJOR_VERSION};
pub use report::{EntryKind, Report, ReportEntry};
