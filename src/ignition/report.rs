use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Error,
    Warning,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntryKind::Error => "error",
            EntryKind::Warning => "warning",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportEntry {
    pub kind: EntryKind,
    /// JSON path of the offending node, e.g. `$.storage.files.0.path`.
    pub context: Option<String>,
    /// Line and column in the raw document, when known.
    pub position: Option<(usize, usize)>,
    pub message: String,
}

impl ReportEntry {
    pub fn new<S: Into<String>>(kind: EntryKind, message: S) -> Self {
        Self {
            kind,
            context: None,
            position: None,
            message: message.into(),
        }
    }

    pub fn at<S: Into<String>>(mut self, context: S) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_position(mut self, line: usize, column: usize) -> Self {
        self.position = Some((line, column));
        self
    }
}

impl fmt::Display for ReportEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(ref context) = self.context {
            write!(f, " at {}", context)?;
        }
        if let Some((line, column)) = self.position {
            write!(f, ", line {} col {}", line, column)?;
        }
        write!(f, ": {}", self.message)
    }
}

/// Diagnostics produced while loading a config.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Report {
    pub entries: Vec<ReportEntry>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, entry: ReportEntry) {
        self.entries.push(entry);
    }

    pub fn add_error<C: Into<String>, M: Into<String>>(&mut self, context: C, message: M) {
        self.add(ReportEntry::new(EntryKind::Error, message).at(context));
    }

    pub fn add_warning<C: Into<String>, M: Into<String>>(&mut self, context: C, message: M) {
        self.add(ReportEntry::new(EntryKind::Warning, message).at(context));
    }

    pub fn is_fatal(&self) -> bool {
        self.entries.iter().any(|e| e.kind == EntryKind::Error)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.kind == EntryKind::Error)
            .count()
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", entry)?;
        }
        Ok(())
    }
}
