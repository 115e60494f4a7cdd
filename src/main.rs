use clap::{CommandFactory, Parser};
use ign_extract::cli::{normalize_args, wants_version};
use ign_extract::logging::setup_logging;
use ign_extract::{version_string, Cli, IgnExtract, OutputFormatter, UserFriendlyError};
use std::process;

#[tokio::main]
async fn main() {
    let exit_code = run().await;
    process::exit(exit_code);
}

async fn run() -> i32 {
    let args = normalize_args(std::env::args_os());

    // -version short-circuits everything else, including bad flags
    if wants_version(&args) {
        println!("{}", version_string());
        return 0;
    }

    let cli = match Cli::try_parse_from(&args) {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() { 1 } else { 0 };
        }
    };

    setup_logging(cli.verbose);

    let options = match cli.run_options() {
        Ok(options) => options,
        Err(e) => {
            print_usage_error(&e);
            return 1;
        }
    };

    let app = match IgnExtract::from_cli(&cli) {
        Ok(app) => app,
        Err(e) => {
            OutputFormatter::new(cli.output_mode(), cli.verbose).print_user_friendly_error(&e);
            return 1;
        }
    };

    match app.run(&options).await {
        Ok(report) => app.exit_code(&report),
        Err(e) => {
            app.handle_error(&e);
            1
        }
    }
}

fn print_usage_error(error: &ign_extract::IgnExtractError) {
    eprintln!("{}", error.user_message());
    eprintln!("{}", Cli::command().render_help());
}
