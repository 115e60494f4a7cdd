use crate::extractor::OutputRoot;
use crate::fetcher::{
    parse_headers, parse_source, ContentFetcher, FetchError, FetchOptions, HeaderError,
};
use crate::ignition::FileEntry;
use crate::ui::OutputFormatter;
use serde::Serialize;
use std::fmt;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::fs;
use tokio::io::{AsyncWriteExt, BufWriter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    NonOverwrite,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NonOverwrite => f.write_str("non-overwrite file"),
        }
    }
}

/// Why a single file entry could not be written. Never aborts the run.
#[derive(Error, Debug)]
pub enum EntryError {
    #[error("invalid path: {path}: {reason}")]
    InvalidPath { path: String, reason: &'static str },

    #[error("cannot mkdir: {dir}: {source}")]
    CreateDir {
        dir: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot create file content: {path}, {source}")]
    CreateFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot read content: {0}")]
    Source(#[from] url::ParseError),

    #[error("cannot read content headers: {0}")]
    Headers(#[from] HeaderError),

    #[error("cannot write file: {0}")]
    Fetch(#[from] FetchError),
}

impl EntryError {
    /// Which step of the entry's processing failed.
    pub fn stage(&self) -> &'static str {
        match self {
            EntryError::InvalidPath { .. } => "path",
            EntryError::CreateDir { .. } => "mkdir",
            EntryError::CreateFile { .. } => "create",
            EntryError::Source(_) => "source",
            EntryError::Headers(_) => "headers",
            EntryError::Fetch(_) => "fetch",
        }
    }
}

#[derive(Debug)]
pub enum ExtractionOutcome {
    Skipped { path: String, reason: SkipReason },
    Written { path: String, bytes: u64 },
    Failed { path: String, error: EntryError },
}

impl ExtractionOutcome {
    pub fn path(&self) -> &str {
        match self {
            ExtractionOutcome::Skipped { path, .. }
            | ExtractionOutcome::Written { path, .. }
            | ExtractionOutcome::Failed { path, .. } => path,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ExtractionOutcome::Failed { .. })
    }
}

/// Outcomes of one run, in document order.
#[derive(Debug, Default)]
pub struct ExtractionReport {
    pub outcomes: Vec<ExtractionOutcome>,
    pub elapsed: Duration,
}

impl ExtractionReport {
    pub fn written(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, ExtractionOutcome::Written { .. }))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, ExtractionOutcome::Skipped { .. }))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_failed()).count()
    }

    pub fn bytes_written(&self) -> u64 {
        self.outcomes
            .iter()
            .map(|o| match o {
                ExtractionOutcome::Written { bytes, .. } => *bytes,
                _ => 0,
            })
            .sum()
    }

    pub fn has_failures(&self) -> bool {
        self.outcomes.iter().any(ExtractionOutcome::is_failed)
    }
}

/// Drives the per-file loop: one entry at a time, each isolated from the others.
pub struct FileExtractor<'a> {
    fetcher: &'a dyn ContentFetcher,
    formatter: &'a OutputFormatter,
    buffer_size: usize,
}

impl<'a> FileExtractor<'a> {
    pub fn new(fetcher: &'a dyn ContentFetcher, formatter: &'a OutputFormatter) -> Self {
        Self {
            fetcher,
            formatter,
            buffer_size: 64 * 1024, // 64KB buffer
        }
    }

    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size.max(4096); // Minimum 4KB buffer
        self
    }

    pub async fn extract(&self, entries: &[FileEntry], root: &OutputRoot) -> ExtractionReport {
        let start = Instant::now();
        let mut outcomes = Vec::with_capacity(entries.len());

        for entry in entries {
            let outcome = self.extract_entry(entry, root).await;
            self.formatter.print_outcome(&outcome);
            outcomes.push(outcome);
        }

        ExtractionReport {
            outcomes,
            elapsed: start.elapsed(),
        }
    }

    pub async fn extract_entry(&self, entry: &FileEntry, root: &OutputRoot) -> ExtractionOutcome {
        let path = entry.path.clone();

        if !entry.should_overwrite() {
            tracing::debug!("skipping {} (overwrite = {:?})", path, entry.overwrite);
            return ExtractionOutcome::Skipped {
                path,
                reason: SkipReason::NonOverwrite,
            };
        }

        match self.write_entry(entry, root).await {
            Ok(bytes) => ExtractionOutcome::Written { path, bytes },
            Err(error) => {
                tracing::debug!("{} failed at {}: {}", path, error.stage(), error);
                ExtractionOutcome::Failed { path, error }
            }
        }
    }

    // The destination handle lives in `sink` and is dropped, closing the file,
    // on every return out of this function.
    async fn write_entry(&self, entry: &FileEntry, root: &OutputRoot) -> Result<u64, EntryError> {
        let destination = root.resolve(&entry.path)?;

        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|source| EntryError::CreateDir {
                    dir: parent.display().to_string(),
                    source,
                })?;
        }

        let file = fs::File::create(&destination)
            .await
            .map_err(|source| EntryError::CreateFile {
                path: destination.display().to_string(),
                source,
            })?;
        let mut sink = BufWriter::with_capacity(self.buffer_size, file);

        let source = match entry.contents.source.as_deref() {
            Some(source) => parse_source(source)?,
            None => return Ok(0),
        };

        let headers = parse_headers(&entry.contents.http_headers)?;
        let options = FetchOptions::with_headers(headers);

        let written = match self.fetcher.fetch(&source, &mut sink, &options).await {
            Ok(written) => written,
            Err(e) => {
                // Settle in-flight writes so the handle is gone before the next entry.
                let _ = sink.flush().await;
                return Err(e.into());
            }
        };
        sink.flush().await.map_err(FetchError::Write)?;

        Ok(written)
    }
}
