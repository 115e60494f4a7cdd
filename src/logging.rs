use tracing_subscriber::{fmt, EnvFilter};

/// Route `tracing` diagnostics to stderr, leaving stdout to the console contract.
///
/// `RUST_LOG` wins when set; otherwise the `-v` count picks the level.
pub fn setup_logging(verbosity: u8) {
    let default_directive = match verbosity {
        0 => "warn",
        1 => "warn,ign_extract=debug",
        _ => "warn,ign_extract=trace",
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    // A subscriber may already be installed (tests, embedding callers).
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();

    tracing::debug!("Logging setup complete.");
}
