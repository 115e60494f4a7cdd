pub mod file_extractor;
pub mod output_manager;

pub use file_extractor::{EntryError, ExtractionOutcome, ExtractionReport, FileExtractor, SkipReason};
pub use output_manager::{OutputManager, OutputRoot};
