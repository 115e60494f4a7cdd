use crate::error::{IgnExtractError, Result};
use crate::extractor::EntryError;
use crate::ignition::normalize_path;
use crate::ui::OutputFormatter;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// The absolute directory every write of a run lands under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputRoot {
    path: PathBuf,
}

impl OutputRoot {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Join a declared file path onto the root, rejecting paths that escape it.
    pub fn resolve(&self, entry_path: &str) -> std::result::Result<PathBuf, EntryError> {
        let relative = normalize_path(entry_path).map_err(|problem| EntryError::InvalidPath {
            path: entry_path.to_string(),
            reason: problem.as_str(),
        })?;

        Ok(self.path.join(relative))
    }
}

pub struct OutputManager {
    output_directory: PathBuf,
}

impl OutputManager {
    /// Resolve the `-output` argument to an absolute path. The path need not exist.
    pub fn new<P: AsRef<Path>>(output: P) -> Result<Self> {
        let output = output.as_ref();
        let output_directory =
            std::path::absolute(output).map_err(|source| IgnExtractError::InvalidOutput {
                path: output.display().to_string(),
                source,
            })?;

        Ok(Self { output_directory })
    }

    pub fn get_output_directory(&self) -> &Path {
        &self.output_directory
    }

    /// Make sure the output directory exists and is empty.
    ///
    /// Creates at most the directory itself, never its parents.
    pub fn prepare(&self, formatter: &OutputFormatter) -> Result<OutputRoot> {
        let dir = &self.output_directory;
        let path = dir.display().to_string();

        match fs::read_dir(dir) {
            Ok(mut entries) => {
                if entries.next().is_some() {
                    return Err(IgnExtractError::OutputDirNotEmpty { path });
                }
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                formatter.info(&format!("output dir not found, creating dir at: {}", path));
                fs::create_dir(dir)
                    .map_err(|source| IgnExtractError::CreateOutputDir { path, source })?;
                tracing::debug!("created output directory {}", dir.display());
            }
            Err(source) => return Err(IgnExtractError::OpenOutputDir { path, source }),
        }

        Ok(OutputRoot {
            path: self.output_directory.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::OutputMode;
    use tempfile::TempDir;

    fn quiet_formatter() -> OutputFormatter {
        OutputFormatter::new(OutputMode::Human, 0)
    }

    #[test]
    fn test_relative_output_is_made_absolute() {
        let manager = OutputManager::new("some/relative/dir").unwrap();
        assert!(manager.get_output_directory().is_absolute());
        assert!(manager.get_output_directory().ends_with("some/relative/dir"));
    }

    #[test]
    fn test_empty_output_argument_is_invalid() {
        let err = OutputManager::new("").err().unwrap();
        assert!(matches!(err, IgnExtractError::InvalidOutput { .. }));
    }

    #[test]
    fn test_missing_directory_is_created() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("out");

        let manager = OutputManager::new(&target).unwrap();
        let root = manager.prepare(&quiet_formatter()).unwrap();

        assert!(target.is_dir());
        assert_eq!(root.path(), target.as_path());
        assert_eq!(fs::read_dir(&target).unwrap().count(), 0);
    }

    #[test]
    fn test_existing_empty_directory_is_accepted() {
        let temp_dir = TempDir::new().unwrap();

        let manager = OutputManager::new(temp_dir.path()).unwrap();
        assert!(manager.prepare(&quiet_formatter()).is_ok());
    }

    #[test]
    fn test_non_empty_directory_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("stale.txt"), "stale").unwrap();

        let manager = OutputManager::new(temp_dir.path()).unwrap();
        let err = manager.prepare(&quiet_formatter()).unwrap_err();

        assert!(matches!(err, IgnExtractError::OutputDirNotEmpty { .. }));
        assert!(err.to_string().starts_with("output dir not empty: "));
    }

    #[test]
    fn test_parents_are_not_created() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("missing").join("out");

        let manager = OutputManager::new(&target).unwrap();
        let err = manager.prepare(&quiet_formatter()).unwrap_err();

        assert!(matches!(err, IgnExtractError::CreateOutputDir { .. }));
        assert!(!temp_dir.path().join("missing").exists());
    }

    #[test]
    fn test_file_as_output_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("file");
        fs::write(&file, "x").unwrap();

        let manager = OutputManager::new(&file).unwrap();
        let err = manager.prepare(&quiet_formatter()).unwrap_err();
        assert!(matches!(err, IgnExtractError::OpenOutputDir { .. }));
    }

    #[test]
    fn test_resolve_entry_paths() {
        let root = OutputRoot {
            path: PathBuf::from("/out"),
        };

        assert_eq!(root.resolve("etc/hosts").unwrap(), PathBuf::from("/out/etc/hosts"));
        assert_eq!(root.resolve("/etc/hosts").unwrap(), PathBuf::from("/out/etc/hosts"));
        assert_eq!(
            root.resolve("./etc//ssh/../hosts").unwrap(),
            PathBuf::from("/out/etc/hosts")
        );
    }

    #[test]
    fn test_resolve_rejects_escapes() {
        let root = OutputRoot {
            path: PathBuf::from("/out"),
        };

        for path in ["../etc/passwd", "/etc/../../passwd", "a/../../b"] {
            let err = root.resolve(path).unwrap_err();
            assert!(matches!(err, EntryError::InvalidPath { .. }), "{}", path);
        }

        for path in ["/", ".", "a/.."] {
            assert!(root.resolve(path).is_err(), "{}", path);
        }
    }
}
