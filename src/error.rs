use crate::ignition::ParseError;
use thiserror::Error;

/// Errors that abort the whole run before or instead of the extraction loop.
///
/// Per-entry failures never surface here; see [`crate::extractor::EntryError`].
#[derive(Error, Debug)]
pub enum IgnExtractError {
    #[error("output not valid: {path}: {source}")]
    InvalidOutput {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("can't create output dir: {path}: {source}")]
    CreateOutputDir {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("can't open output dir: {path}: {source}")]
    OpenOutputDir {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("output dir not empty: {path}")]
    OutputDirNotEmpty { path: String },

    #[error("couldn't read config: {input}: {source}")]
    ReadConfig {
        input: String,
        #[source]
        source: std::io::Error,
    },

    #[error("couldn't parse config: {0}")]
    Parse(#[from] ParseError),

    #[error("couldn't parse config: {errors} fatal error(s) reported")]
    FatalReport { errors: usize },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Usage error: {message}")]
    Usage { message: String },
}

pub trait UserFriendlyError {
    fn user_message(&self) -> String;
    fn suggestion(&self) -> Option<String>;
}

impl UserFriendlyError for IgnExtractError {
    fn user_message(&self) -> String {
        match self {
            IgnExtractError::Config { message } => {
                format!("Configuration error: {}", message)
            }
            IgnExtractError::Usage { message } => message.clone(),
            _ => self.to_string(),
        }
    }

    fn suggestion(&self) -> Option<String> {
        match self {
            IgnExtractError::OutputDirNotEmpty { .. } => Some(
                "Remove the existing contents or pass a fresh directory with -output.".to_string(),
            ),
            IgnExtractError::CreateOutputDir { .. } => Some(
                "Parent directories are not created; make sure the parent of -output exists."
                    .to_string(),
            ),
            IgnExtractError::ReadConfig { .. } => Some(
                "Pass a readable config file, or '-' to read the config from standard input."
                    .to_string(),
            ),
            IgnExtractError::Config { .. } => Some(
                "Check your settings file syntax and make sure every value is in range."
                    .to_string(),
            ),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, IgnExtractError>;
