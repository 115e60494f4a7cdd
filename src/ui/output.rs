use crate::error::{IgnExtractError, UserFriendlyError};
use crate::extractor::{ExtractionOutcome, ExtractionReport};
use crate::ignition::Report;
use console::{style, Term};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputMode {
    /// One plain line per event: info on stdout, errors on stderr.
    Human,
    /// One JSON object per line, same stream split.
    Json,
}

/// Console contract: every message is trimmed and printed as a single line.
pub struct OutputFormatter {
    mode: OutputMode,
    use_colors: bool,
    verbose_level: u8,
}

impl OutputFormatter {
    pub fn new(mode: OutputMode, verbose: u8) -> Self {
        let use_colors = match mode {
            OutputMode::Human => Term::stderr().features().colors_supported(),
            OutputMode::Json => false,
        };

        Self {
            mode,
            use_colors,
            verbose_level: verbose,
        }
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    // Core messaging methods
    pub fn info(&self, message: &str) {
        match self.mode {
            OutputMode::Human => println!("{}", message.trim()),
            OutputMode::Json => self.print_json_message("info", message),
        }
    }

    pub fn error(&self, message: &str) {
        match self.mode {
            OutputMode::Human => {
                if self.use_colors {
                    eprintln!("{}", style(message.trim()).red().for_stderr());
                } else {
                    eprintln!("{}", message.trim());
                }
            }
            OutputMode::Json => self.print_json_error(message),
        }
    }

    pub fn print_user_friendly_error(&self, error: &IgnExtractError) {
        self.error(&error.user_message());

        if self.verbose_level > 0 {
            if let Some(suggestion) = error.suggestion() {
                self.error(&format!("hint: {}", suggestion));
            }
        }
    }

    /// Every diagnostic is shown, fatal or not.
    pub fn print_diagnostics(&self, report: &Report) {
        for entry in &report.entries {
            match self.mode {
                OutputMode::Human => self.info(&entry.to_string()),
                OutputMode::Json => self.print_json_object(&serde_json::json!({
                    "type": "diagnostic",
                    "kind": entry.kind,
                    "context": entry.context,
                    "position": entry.position,
                    "message": entry.message,
                })),
            }
        }
    }

    pub fn print_outcome(&self, outcome: &ExtractionOutcome) {
        match self.mode {
            OutputMode::Human => match outcome {
                ExtractionOutcome::Skipped { path, .. } => {
                    self.info(&format!("skipping non-overwrite file: {}", path))
                }
                ExtractionOutcome::Written { path, .. } => self.info(path),
                ExtractionOutcome::Failed { error, .. } => self.error(&error.to_string()),
            },
            OutputMode::Json => self.print_json_outcome(outcome),
        }
    }

    pub fn print_extraction_summary(&self, report: &ExtractionReport) {
        match self.mode {
            OutputMode::Human => {
                if self.verbose_level == 0 {
                    return;
                }
                self.info(&format!(
                    "wrote {} file(s) ({}), skipped {}, failed {} in {}",
                    report.written(),
                    format_bytes(report.bytes_written()),
                    report.skipped(),
                    report.failed(),
                    format_duration(report.elapsed)
                ));
            }
            OutputMode::Json => self.print_json_object(&serde_json::json!({
                "type": "summary",
                "written": report.written(),
                "skipped": report.skipped(),
                "failed": report.failed(),
                "bytes_written": report.bytes_written(),
                "duration_ms": report.elapsed.as_millis() as u64,
                "timestamp": chrono::Utc::now().to_rfc3339()
            })),
        }
    }

    // Private helper methods
    fn print_json_outcome(&self, outcome: &ExtractionOutcome) {
        match outcome {
            ExtractionOutcome::Skipped { path, reason } => {
                self.print_json_object(&serde_json::json!({
                    "type": "file",
                    "status": "skipped",
                    "path": path,
                    "reason": reason,
                }))
            }
            ExtractionOutcome::Written { path, bytes } => {
                self.print_json_object(&serde_json::json!({
                    "type": "file",
                    "status": "written",
                    "path": path,
                    "bytes": bytes,
                }))
            }
            ExtractionOutcome::Failed { path, error } => eprintln!(
                "{}",
                serde_json::json!({
                    "type": "file",
                    "status": "failed",
                    "path": path,
                    "stage": error.stage(),
                    "error": error.to_string(),
                })
            ),
        }
    }

    fn print_json_message(&self, level: &str, message: &str) {
        self.print_json_object(&serde_json::json!({
            "type": "message",
            "level": level,
            "message": message.trim(),
            "timestamp": chrono::Utc::now().to_rfc3339()
        }));
    }

    fn print_json_error(&self, message: &str) {
        eprintln!(
            "{}",
            serde_json::json!({
                "type": "message",
                "level": "error",
                "message": message.trim(),
                "timestamp": chrono::Utc::now().to_rfc3339()
            })
        );
    }

    fn print_json_object(&self, obj: &serde_json::Value) {
        println!(
            "{}",
            serde_json::to_string(obj).unwrap_or_else(|_| "{}".to_string())
        );
    }
}

fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.1} {}", size, UNITS[unit_index])
    }
}

fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs >= 60 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else if secs > 0 {
        format!("{}s", secs)
    } else {
        format!("{}ms", duration.as_millis())
    }
}
