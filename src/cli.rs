use clap::{Args, Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::reporting;

/// Booking API test runner
#[derive(Parser, Debug)]
#[command(name = "bookrunner")]
#[command(about = "End-to-end tests for the restful-booker API")]
#[command(version = crate::VERSION)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the end-to-end booking suite
    Run(RunArgs),

    /// Check that the API is up
    Ping(PingArgs),

    /// Acquire a token for a configured auth key
    Token(TokenArgs),

    /// Configuration management
    Config(ConfigArgs),
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Base URL of the booking API
    #[arg(long)]
    pub base_url: Option<String>,

    /// Output directory for reports
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Report formats to generate
    #[arg(short, long, value_enum)]
    pub format: Vec<ReportFormat>,

    /// Seconds the auth token stays cached (negative never expires)
    #[arg(long, allow_hyphen_values = true)]
    pub token_ttl: Option<i64>,
}

#[derive(Args, Debug)]
pub struct PingArgs {
    /// Base URL of the booking API
    #[arg(long)]
    pub base_url: Option<String>,
}

#[derive(Args, Debug)]
pub struct TokenArgs {
    /// Auth key as configured under `auth`
    pub key: String,

    /// Print the full token instead of a masked one
    #[arg(long)]
    pub show: bool,
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show current configuration
    Show(ShowConfigArgs),

    /// Get a configuration value by dotted path
    Get(GetConfigArgs),

    /// Validate configuration
    Validate,
}

#[derive(Args, Debug)]
pub struct ShowConfigArgs {
    /// Show secrets unmasked
    #[arg(long)]
    pub show_sensitive: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "yaml")]
    pub format: OutputFormat,
}

#[derive(Args, Debug)]
pub struct GetConfigArgs {
    /// Configuration key, e.g. `report.output_dir`
    pub key: String,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    Json,
    Yaml,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportFormat {
    Json,
    Html,
}

impl From<ReportFormat> for reporting::ReportFormat {
    fn from(format: ReportFormat) -> Self {
        match format {
            ReportFormat::Json => reporting::ReportFormat::Json,
            ReportFormat::Html => reporting::ReportFormat::Html,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_arguments() {
        let cli = Cli::try_parse_from([
            "bookrunner", "-v", "run", "--base-url", "http://localhost:3001", "-f", "json", "-f", "html",
            "--token-ttl", "-1",
        ])
        .unwrap();

        assert!(cli.verbose);
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.base_url.as_deref(), Some("http://localhost:3001"));
                assert_eq!(args.format, vec![ReportFormat::Json, ReportFormat::Html]);
                assert_eq!(args.token_ttl, Some(-1));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_global_config_after_subcommand() {
        let cli = Cli::try_parse_from(["bookrunner", "config", "show", "--config", "bookrunner.yaml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("bookrunner.yaml")));
        assert!(matches!(
            cli.command,
            Commands::Config(ConfigArgs {
                command: ConfigCommands::Show(ShowConfigArgs { format: OutputFormat::Yaml, .. })
            })
        ));
    }

    #[test]
    fn test_unknown_format_rejected() {
        assert!(Cli::try_parse_from(["bookrunner", "run", "--format", "xml"]).is_err());
    }
}
