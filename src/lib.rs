pub mod cli;
pub mod config;
pub mod error;
pub mod extractor;
pub mod fetcher;
pub mod ignition;
pub mod logging;
pub mod ui;

// Public API re-exports
pub use cli::{Cli, ConfigInput, OutputFormat, RunOptions};
pub use config::{CliOverrides, ExtractSettings, FetchSettings, Settings};
pub use error::{IgnExtractError, Result, UserFriendlyError};

// Core functionality re-exports
pub use extractor::{
    EntryError, ExtractionOutcome, ExtractionReport, FileExtractor, OutputManager, OutputRoot,
};
pub use fetcher::{ContentFetcher, FetchError, FetchOptions, Fetcher};
pub use ignition::{Document, FileEntry, Report};
pub use ui::{OutputFormatter, OutputMode};

use tokio::io::AsyncReadExt;

/// Main library interface: one extraction run per `RunOptions`.
pub struct IgnExtract {
    settings: Settings,
    output_formatter: OutputFormatter,
    fetcher: Box<dyn ContentFetcher>,
}

impl IgnExtract {
    pub fn new(settings: Settings, output_mode: OutputMode, verbose: u8) -> Result<Self> {
        let fetcher = Fetcher::new(&settings.fetch)?;

        Ok(Self {
            settings,
            output_formatter: OutputFormatter::new(output_mode, verbose),
            fetcher: Box::new(fetcher),
        })
    }

    pub fn from_cli(cli_args: &Cli) -> Result<Self> {
        let settings = cli_args.load_settings()?;
        Self::new(settings, cli_args.output_mode(), cli_args.verbose)
    }

    /// Replace the content fetcher, e.g. with an offline one.
    pub fn with_fetcher(mut self, fetcher: Box<dyn ContentFetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }

    /// Prepare the output directory, load the config and extract every entry.
    ///
    /// Only fatal conditions come back as `Err`; failed entries are part of
    /// the returned report.
    pub async fn run(&self, options: &RunOptions) -> Result<ExtractionReport> {
        // Step 1: Output directory must be usable before the config is read
        let output_manager = OutputManager::new(&options.output)?;
        let root = output_manager.prepare(&self.output_formatter)?;

        // Step 2: Load config
        let blob = read_config(&options.input).await?;
        tracing::debug!("read {} byte(s) of config from {}", blob.len(), options.input);

        // Step 3: Parse and show every diagnostic
        let (parsed, report) = ignition::parse(&blob);
        self.output_formatter.print_diagnostics(&report);

        if report.is_fatal() {
            return Err(IgnExtractError::FatalReport {
                errors: report.error_count(),
            });
        }
        let document = parsed?;
        tracing::debug!("config declares {} file(s)", document.files().len());

        // Step 4: Extract files
        let extractor = FileExtractor::new(self.fetcher.as_ref(), &self.output_formatter);
        let extraction = extractor.extract(document.files(), &root).await;

        self.output_formatter.print_extraction_summary(&extraction);

        Ok(extraction)
    }

    /// 0 on a completed run; 2 when strict and any entry failed.
    pub fn exit_code(&self, report: &ExtractionReport) -> i32 {
        if self.settings.extract.strict && report.has_failures() {
            2
        } else {
            0
        }
    }

    /// Handle error with user-friendly output
    pub fn handle_error(&self, error: &IgnExtractError) {
        self.output_formatter.print_user_friendly_error(error);
    }
}

async fn read_config(input: &ConfigInput) -> Result<Vec<u8>> {
    let read = match input {
        ConfigInput::Stdin => {
            let mut blob = Vec::new();
            tokio::io::stdin()
                .read_to_end(&mut blob)
                .await
                .map(|_| blob)
        }
        ConfigInput::File(path) => tokio::fs::read(path).await,
    };

    read.map_err(|source| IgnExtractError::ReadConfig {
        input: input.to_string(),
        source,
    })
}

/// `ign-extract <version>`, as printed by `-version`.
pub fn version_string() -> String {
    format!("ign-extract {}", env!("CARGO_PKG_VERSION"))
}
