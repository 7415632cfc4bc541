use bookrunner::cli::{Cli, Commands};
use bookrunner::cli_handler::CliHandler;
use bookrunner::{NAME, VERSION};
use clap::Parser;
use std::process;
use tokio::signal;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    if should_print_banner(&cli) {
        println!("{} v{}", NAME, VERSION);
    }

    let mut handler = match CliHandler::new(cli.config.clone()).await {
        Ok(handler) => handler,
        Err(e) => {
            eprintln!("Failed to initialize: {:#}", e);
            process::exit(1);
        }
    };

    let result = tokio::select! {
        result = handler.handle_command(cli) => result,
        _ = signal::ctrl_c() => {
            eprintln!("\nInterrupted");
            process::exit(130);
        }
    };

    if let Err(e) = result {
        eprintln!("Command failed: {:#}", e);
        if std::env::var("BOOKRUNNER_DEBUG").is_ok() {
            eprintln!("Debug info: {:?}", e);
        }
        process::exit(1);
    }
}

/// `--verbose` forces debug, otherwise `RUST_LOG` or info
fn init_logging(verbose: bool) {
    let log_level = if verbose {
        "debug".to_string()
    } else {
        std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string())
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&log_level)).init();
}

fn should_print_banner(cli: &Cli) -> bool {
    !matches!(cli.command, Commands::Config(_)) || cli.verbose
}
