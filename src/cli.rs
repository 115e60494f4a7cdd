use crate::config::{CliOverrides, Settings};
use crate::error::{IgnExtractError, Result};
use crate::ui::OutputMode;
use clap::{Parser, ValueEnum};
use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "ign-extract")]
#[command(about = "Extract the files declared in an Ignition config into a directory")]
#[command(
    long_about = "ign-extract fetches the contents of every file an Ignition config declares \
                  and writes them under an empty output directory, mirroring their paths, \
                  for offline inspection of what a provisioning run would write."
)]
#[command(override_usage = "ign-extract [flags] config.ign")]
#[command(after_help = "EXAMPLES:\n  \
    ign-extract -output ./rootfs config.ign\n  \
    cat config.ign | ign-extract -output ./rootfs -\n  \
    ign-extract -output ./rootfs -strict -format json config.ign")]
#[command(disable_version_flag = true)]
pub struct Cli {
    /// Config to extract, or '-' to read it from standard input
    #[arg(value_name = "CONFIG")]
    pub inputs: Vec<String>,

    /// Print the version of ign-extract and exit
    #[arg(long)]
    pub version: bool,

    /// Empty directory to extract into (created if missing)
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Path to TOML settings file
    #[arg(long, value_name = "PATH")]
    pub settings: Option<PathBuf>,

    /// Per-request fetch timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Retries for failed HTTP fetches
    #[arg(long)]
    pub retries: Option<u32>,

    /// Exit with status 2 when any file entry failed
    #[arg(long)]
    pub strict: bool,

    /// Console output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,

    /// Verbose output level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// One plain line per event
    Human,
    /// One JSON object per line
    Json,
}

impl From<&OutputFormat> for OutputMode {
    fn from(format: &OutputFormat) -> Self {
        match format {
            OutputFormat::Human => OutputMode::Human,
            OutputFormat::Json => OutputMode::Json,
        }
    }
}

/// Where the config bytes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigInput {
    Stdin,
    File(PathBuf),
}

impl ConfigInput {
    pub fn from_arg(arg: &str) -> Self {
        if arg == "-" {
            ConfigInput::Stdin
        } else {
            ConfigInput::File(PathBuf::from(arg))
        }
    }
}

impl fmt::Display for ConfigInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigInput::Stdin => f.write_str("<stdin>"),
            ConfigInput::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Everything a run needs, fixed once the command line has been parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    pub output: PathBuf,
    pub input: ConfigInput,
}

/// Long flags that may also be spelled with a single dash (`-output x`).
pub const LONG_FLAGS: &[&str] = &[
    "version", "output", "settings", "timeout", "retries", "strict", "format", "verbose", "help",
];

/// Switches that accept an explicit `=true` / `=false`.
pub const BOOL_FLAGS: &[&str] = &["version", "strict"];

/// Rewrite Go-style `-flag` / `-flag=value` arguments into `--flag` form.
///
/// A boolean switch given as `-flag=true` becomes `--flag` and `-flag=false`
/// is dropped; any other value is passed on for clap to reject. The program
/// name, short flags, bare `-` and everything after `--` are passed through
/// untouched.
pub fn normalize_args<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut normalized = Vec::new();
    let mut passthrough = false;

    for (i, arg) in args.into_iter().enumerate() {
        let arg: OsString = arg.into();

        if i == 0 || passthrough {
            normalized.push(arg);
            continue;
        }

        if arg == "--" {
            passthrough = true;
            normalized.push(arg);
            continue;
        }

        match arg.to_str().and_then(rewrite_flag) {
            Some(Some(rewritten)) => normalized.push(rewritten),
            Some(None) => {}
            None => normalized.push(arg),
        }
    }

    normalized
}

// None: not ours to touch. Some(None): drop the argument.
fn rewrite_flag(arg: &str) -> Option<Option<OsString>> {
    let rest = arg.strip_prefix('-')?.trim_start_matches('-');
    if rest.len() + 2 < arg.len() {
        // Three or more dashes are never a flag.
        return None;
    }

    let (name, value) = match rest.split_once('=') {
        Some((name, value)) => (name, Some(value)),
        None => (rest, None),
    };
    if !LONG_FLAGS.contains(&name) {
        return None;
    }

    if let (true, Some(value)) = (BOOL_FLAGS.contains(&name), value) {
        return match parse_bool(value) {
            Some(true) => Some(Some(OsString::from(format!("--{}", name)))),
            Some(false) => Some(None),
            None => Some(Some(OsString::from(format!("--{}={}", name, value)))),
        };
    }

    Some(Some(OsString::from(format!("--{}", rest))))
}

/// The spellings Go's `strconv.ParseBool` accepts.
fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

/// `-version` wins over every other argument, valid or not.
pub fn wants_version(args: &[OsString]) -> bool {
    args.iter()
        .skip(1)
        .take_while(|arg| *arg != "--")
        .any(|arg| arg == "--version")
}

impl Cli {
    pub fn run_options(&self) -> Result<RunOptions> {
        if self.inputs.len() != 1 {
            return Err(IgnExtractError::Usage {
                message: format!(
                    "expected exactly one config path, got {}",
                    self.inputs.len()
                ),
            });
        }

        let output = self.output.clone().ok_or_else(|| IgnExtractError::Usage {
            message: "-output is required".to_string(),
        })?;

        Ok(RunOptions {
            output,
            input: ConfigInput::from_arg(&self.inputs[0]),
        })
    }

    pub fn load_settings(&self) -> Result<Settings> {
        let mut settings = Settings::load_with_defaults(self.settings.as_ref())?;

        let overrides = self.create_cli_overrides();
        settings.merge_with_cli_args(&overrides);
        settings.validate()?;

        Ok(settings)
    }

    pub fn create_cli_overrides(&self) -> CliOverrides {
        CliOverrides::new()
            .with_timeout(self.timeout)
            .with_retries(self.retries)
            .with_strict(self.strict)
    }

    pub fn output_mode(&self) -> OutputMode {
        OutputMode::from(&self.format)
    }
}
