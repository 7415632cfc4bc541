use anyhow::{bail, Context, Result};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;

use crate::auth_manager::AuthenticationManager;
use crate::booking_client::BookingClient;
use crate::cli::*;
use crate::configuration::{Configuration, ConfigurationManager};
use crate::interceptor::RequestResponseInterceptor;
use crate::reporting::{self, write_reports};
use crate::rest_client::RestClient;
use crate::suite::SmokeSuite;
use crate::token_cache::TokenCache;
use crate::transport::HttpTransport;

const MASK: &str = "********";

/// Dispatches parsed commands against a loaded configuration
pub struct CliHandler {
    config: ConfigurationManager,
    cache: Arc<TokenCache>,
}

impl CliHandler {
    pub async fn new(config_path: Option<PathBuf>) -> Result<Self> {
        let mut config = ConfigurationManager::new();
        if let Some(path) = config_path {
            config
                .load_file(&path)
                .await
                .with_context(|| format!("Failed to load configuration from {:?}", path))?;
        }
        config.apply_environment_overrides()?;

        Ok(Self {
            config,
            cache: Arc::new(TokenCache::new()),
        })
    }

    pub fn with_manager(config: ConfigurationManager) -> Self {
        Self {
            config,
            cache: Arc::new(TokenCache::new()),
        }
    }

    pub async fn handle_command(&mut self, cli: Cli) -> Result<()> {
        match cli.command {
            Commands::Run(args) => self.handle_run(args).await,
            Commands::Ping(args) => self.handle_ping(args).await,
            Commands::Token(args) => self.handle_token(args).await,
            Commands::Config(args) => self.handle_config(args),
        }
    }

    fn transport(config: &Configuration) -> Result<Arc<dyn HttpTransport>> {
        let client = RestClient::from_configuration(config).context("Failed to build HTTP client")?;
        let interceptor = RequestResponseInterceptor::from_configuration(Arc::new(client), config);
        Ok(Arc::new(interceptor))
    }

    fn override_base_url(&self, base_url: Option<String>) -> Result<Configuration> {
        if let Some(base_url) = base_url {
            self.config.set_value("base_url", Value::String(base_url))?;
        }
        self.config.validate()?;
        Ok(self.config.configuration())
    }

    async fn handle_run(&mut self, args: RunArgs) -> Result<()> {
        let config = self.override_base_url(args.base_url)?;
        let client = BookingClient::new(Self::transport(&config)?, config.base_url.clone());

        let mut suite = SmokeSuite::new(client, self.cache.clone());
        if let Some(ttl) = args.token_ttl {
            suite = suite.with_token_ttl(ttl);
        }

        println!("Running booking suite against {}", config.base_url);
        let results = suite.run().await;

        let formats: Vec<reporting::ReportFormat> = if args.format.is_empty() {
            config
                .report
                .formats
                .iter()
                .map(|f| f.parse::<reporting::ReportFormat>())
                .collect::<std::result::Result<_, _>>()?
        } else {
            args.format.into_iter().map(Into::into).collect()
        };
        let output_dir = args.output.unwrap_or_else(|| config.report.output_dir.clone());

        for result in &results.results {
            println!(
                "  {:<8} {:<24} {:>6} ms{}",
                result.status,
                result.name,
                result.duration.as_millis(),
                result
                    .error_message
                    .as_deref()
                    .map(|m| format!("  {}", m))
                    .unwrap_or_default()
            );
        }

        let written = write_reports(&results, &output_dir, &formats).await?;
        for path in &written {
            println!("Report written to {}", path.display());
        }

        let summary = &results.summary;
        println!(
            "{} passed, {} failed, {} errors, {} skipped ({:.1}%)",
            summary.passed_tests, summary.failed_tests, summary.error_tests, summary.skipped_tests, summary.success_rate
        );

        if !summary.all_passed() {
            bail!(
                "{} of {} tests did not pass",
                summary.failed_tests + summary.error_tests,
                summary.total_tests
            );
        }
        Ok(())
    }

    async fn handle_ping(&mut self, args: PingArgs) -> Result<()> {
        let config = self.override_base_url(args.base_url)?;
        let client = BookingClient::new(Self::transport(&config)?, config.base_url.clone());

        let response = client.health_check().await?;
        if response.status_code == crate::booking_client::HEALTHY_STATUS {
            println!("{} is up ({} ms)", config.base_url, response.duration_ms());
            Ok(())
        } else {
            bail!("{} answered ping with status {}", config.base_url, response.status_code)
        }
    }

    async fn handle_token(&mut self, args: TokenArgs) -> Result<()> {
        let config = self.config.configuration();
        if config.auth.is_empty() {
            bail!("No auth endpoints configured");
        }

        let manager = AuthenticationManager::from_configuration(self.cache.clone(), &config, Self::transport(&config)?);
        let token = manager.token(&args.key).await?;

        let shown = if args.show { token.clone() } else { mask_token(&token) };
        println!("{}: {} (expires: {})", args.key, shown, self.cache.remaining_lifetime(&args.key));
        Ok(())
    }

    fn handle_config(&self, args: ConfigArgs) -> Result<()> {
        match args.command {
            ConfigCommands::Show(show) => {
                let mut value = serde_json::to_value(self.config.configuration())?;
                if !show.show_sensitive {
                    mask_secrets(&mut value);
                }

                let rendered = match show.format {
                    OutputFormat::Json => serde_json::to_string_pretty(&value)?,
                    OutputFormat::Yaml => serde_yaml::to_string(&value)?,
                };
                if let Some(source) = self.config.source() {
                    println!("# source: {}", source.display());
                }
                println!("{}", rendered);
                Ok(())
            }
            ConfigCommands::Get(get) => match self.config.get_value(&get.key) {
                Some(Value::String(s)) => {
                    println!("{}", s);
                    Ok(())
                }
                Some(other) => {
                    println!("{}", other);
                    Ok(())
                }
                None => bail!("Configuration key not found: {}", get.key),
            },
            ConfigCommands::Validate => {
                self.config.validate()?;
                println!("Configuration is valid");
                Ok(())
            }
        }
    }
}

pub fn mask_token(token: &str) -> String {
    let prefix: String = token.chars().take(4).collect();
    if token.chars().count() <= 8 {
        MASK.to_string()
    } else {
        format!("{}{}", prefix, MASK)
    }
}

/// Replace passwords and client secrets under `auth` with a mask
pub fn mask_secrets(config: &mut Value) {
    if let Some(auth) = config.get_mut("auth").and_then(Value::as_object_mut) {
        for endpoint in auth.values_mut().filter_map(Value::as_object_mut) {
            for field in ["password", "client_secret"] {
                if let Some(secret) = endpoint.get_mut(field) {
                    if !secret.is_null() {
                        *secret = Value::String(MASK.to_string());
                    }
                }
            }
        }
    }
}
