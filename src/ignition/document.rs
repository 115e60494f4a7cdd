use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Component, Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Document {
    pub ignition: IgnitionSection,
    #[serde(default)]
    pub storage: Storage,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct IgnitionSection {
    pub version: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Storage {
    #[serde(default)]
    pub files: Vec<FileEntry>,
}

/// One declared file. Read-only once the loader has produced it.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct FileEntry {
    pub path: String,
    /// `None` and `Some(false)` both mean "do not write", but stay distinct.
    #[serde(default)]
    pub overwrite: Option<bool>,
    #[serde(default)]
    pub contents: Resource,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub http_headers: Vec<HttpHeader>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct HttpHeader {
    pub name: String,
    #[serde(default)]
    pub value: Option<String>,
}

impl FileEntry {
    pub fn new<S: Into<String>>(path: S) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn with_overwrite(mut self, overwrite: Option<bool>) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn with_source<S: Into<String>>(mut self, source: S) -> Self {
        self.contents.source = Some(source.into());
        self
    }

    pub fn with_header<N: Into<String>>(mut self, name: N, value: Option<&str>) -> Self {
        self.contents.http_headers.push(HttpHeader {
            name: name.into(),
            value: value.map(str::to_string),
        });
        self
    }

    /// Only an explicit `overwrite: true` allows the file to be written.
    pub fn should_overwrite(&self) -> bool {
        self.overwrite == Some(true)
    }

    pub fn relative_path(&self) -> Result<PathBuf, PathProblem> {
        normalize_path(&self.path)
    }
}

/// Why a declared path has no place under an output root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathProblem {
    Escapes,
    NoFileName,
}

impl PathProblem {
    pub fn as_str(&self) -> &'static str {
        match self {
            PathProblem::Escapes => "escapes the output directory",
            PathProblem::NoFileName => "does not name a file",
        }
    }
}

impl fmt::Display for PathProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fold a declared path into plain relative components.
///
/// Leading `/`, `.` and empty components are dropped; `..` may only climb
/// back out of components the path itself descended into. Two paths that
/// fold to the same value name the same file.
pub fn normalize_path(path: &str) -> Result<PathBuf, PathProblem> {
    let mut normalized = PathBuf::new();
    let mut depth = 0usize;

    for component in Path::new(path).components() {
        match component {
            Component::Prefix(_) | Component::RootDir | Component::CurDir => {}
            Component::ParentDir => {
                if depth == 0 {
                    return Err(PathProblem::Escapes);
                }
                normalized.pop();
                depth -= 1;
            }
            Component::Normal(part) => {
                normalized.push(part);
                depth += 1;
            }
        }
    }

    if depth == 0 {
        return Err(PathProblem::NoFileName);
    }

    Ok(normalized)
}

impl Document {
    pub fn files(&self) -> &[FileEntry] {
        &self.storage.files
    }
}

/// `MAJOR.MINOR.PATCH[-PRE]` as found in `ignition.version`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub pre: Option<String>,
}

impl ConfigVersion {
    pub fn parse(raw: &str) -> Option<Self> {
        let (core, pre) = match raw.split_once('-') {
            Some((core, pre)) if !pre.is_empty() => (core, Some(pre.to_string())),
            Some(_) => return None,
            None => (raw, None),
        };

        let mut parts = core.split('.').map(|p| p.parse::<u64>().ok());
        let major = parts.next()??;
        let minor = parts.next()??;
        let patch = parts.next()??;
        if parts.next().is_some() {
            return None;
        }

        Some(Self {
            major,
            minor,
            patch,
            pre,
        })
    }
}

impl fmt::Display for ConfigVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(ref pre) = self.pre {
            write!(f, "-{}", pre)?;
        }
        Ok(())
    }
}
