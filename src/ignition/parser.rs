use super::document::{normalize_path, ConfigVersion, Document};
use super::report::{EntryKind, Report, ReportEntry};
use serde_json::Value;
use std::collections::HashSet;
use std::path::PathBuf;
use thiserror::Error;

pub const SUPPORTED_MAJOR_VERSION: u64 = 3;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("config is empty")]
    Empty,

    #[error("config is not valid")]
    Invalid,

    #[error("unknown config version")]
    UnknownVersion,

    #[error("unsupported config version: {version}")]
    UnsupportedVersion { version: String },
}

/// Parse raw config bytes.
///
/// The report is returned in every case, including failures; a fatal report
/// always comes with an `Err`.
pub fn parse(blob: &[u8]) -> (Result<Document, ParseError>, Report) {
    let mut report = Report::new();

    if blob.iter().all(u8::is_ascii_whitespace) {
        return (Err(ParseError::Empty), report);
    }

    let value: Value = match serde_json::from_slice(blob) {
        Ok(value) => value,
        Err(e) => {
            tracing::debug!("config is not valid JSON: {}", e);
            report.add(
                ReportEntry::new(EntryKind::Error, strip_position(&e))
                    .with_position(e.line(), e.column()),
            );
            return (Err(ParseError::Invalid), report);
        }
    };

    let version = match detect_version(&value) {
        Ok(version) => version,
        Err(e) => {
            report.add_error("$.ignition.version", e.to_string());
            return (Err(e), report);
        }
    };
    tracing::debug!("detected config version {}", version);

    let document: Document = match serde_json::from_value(value) {
        Ok(document) => document,
        Err(e) => {
            report.add_error("$", e.to_string());
            return (Err(ParseError::Invalid), report);
        }
    };

    validate(&document, &mut report);
    if report.is_fatal() {
        return (Err(ParseError::Invalid), report);
    }

    (Ok(document), report)
}

fn detect_version(value: &Value) -> Result<ConfigVersion, ParseError> {
    let raw = value
        .get("ignition")
        .and_then(|section| section.get("version"))
        .and_then(Value::as_str)
        .ok_or(ParseError::UnknownVersion)?;

    let version = ConfigVersion::parse(raw).ok_or(ParseError::UnknownVersion)?;
    if version.major != SUPPORTED_MAJOR_VERSION {
        return Err(ParseError::UnsupportedVersion {
            version: raw.to_string(),
        });
    }

    Ok(version)
}

fn validate(document: &Document, report: &mut Report) {
    let mut seen = HashSet::new();

    for (i, file) in document.files().iter().enumerate() {
        let context = format!("$.storage.files.{}", i);
        if file.path.trim().trim_start_matches('/').is_empty() {
            report.add_error(format!("{}.path", context), "path is empty");
            continue;
        }

        // Keyed the way extraction places files; escaping paths fail there instead.
        let key = normalize_path(&file.path).unwrap_or_else(|_| PathBuf::from(&file.path));
        if !seen.insert(key) {
            report.add_error(
                format!("{}.path", context),
                format!("duplicate entry defined: {}", file.path),
            );
        }

        if file.should_overwrite() && file.contents.source.is_none() {
            report.add_warning(
                format!("{}.contents.source", context),
                format!("no contents source for {}, file will be written empty", file.path),
            );
        }
    }
}

// serde_json appends " at line X column Y"; the report carries the position separately.
fn strip_position(error: &serde_json::Error) -> String {
    let full = error.to_string();
    match full.rfind(" at line ") {
        Some(idx) => full[..idx].to_string(),
        None => full,
    }
}
