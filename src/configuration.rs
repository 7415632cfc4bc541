//! Configuration Management
//!
//! Layered configuration: built-in defaults, then an optional YAML/JSON/TOML
//! file, then `BOOKRUNNER_*` environment variables. Values can also be read
//! by dotted path (`auth.booker.endpoint`) for ad-hoc lookups.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::endpoints::BASE_URL;
use crate::error::ConfigurationError;

pub const ENV_BASE_URL: &str = "BOOKRUNNER_BASE_URL";
pub const ENV_REQUEST_TIMEOUT: &str = "BOOKRUNNER_REQUEST_TIMEOUT";
pub const ENV_SLOW_REQUEST_MS: &str = "BOOKRUNNER_SLOW_REQUEST_MS";
pub const ENV_LOGGING_ENABLED: &str = "BOOKRUNNER_LOGGING_ENABLED";

/// Core configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Configuration {
    /// Base URL of the booking API
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Emit request/response debug logs from the interceptor
    #[serde(default = "default_true")]
    pub logging_enabled: bool,
    /// Responses slower than this are logged as warnings
    #[serde(default = "default_slow_request_threshold")]
    pub slow_request_threshold_ms: u64,
    /// Headers added to every request
    #[serde(default)]
    pub common_headers: CommonHeaders,
    /// Token endpoints by auth key
    #[serde(default)]
    pub auth: HashMap<String, AuthEndpointConfig>,
    /// Directory holding contract and schema files
    #[serde(default = "default_schema_dir")]
    pub schema_dir: PathBuf,
    /// Reporting configuration
    #[serde(default)]
    pub report: ReportConfig,
    /// Custom configuration values
    #[serde(flatten)]
    pub custom: HashMap<String, Value>,
}

/// Common headers, either as a map or in the inline `K=V;K2=V2` form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CommonHeaders {
    Map(BTreeMap<String, String>),
    Inline(String),
}

impl Default for CommonHeaders {
    fn default() -> Self {
        CommonHeaders::Map(BTreeMap::new())
    }
}

impl CommonHeaders {
    /// Header pairs in declaration order. Malformed inline entries are skipped.
    pub fn pairs(&self) -> Vec<(String, String)> {
        match self {
            CommonHeaders::Map(map) => map.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            CommonHeaders::Inline(raw) => raw
                .split(';')
                .filter_map(|pair| {
                    let (name, value) = pair.split_once('=')?;
                    let name = name.trim();
                    if name.is_empty() {
                        log::warn!("Ignoring common header entry without a name: {}", pair);
                        return None;
                    }
                    Some((name.to_string(), value.trim().to_string()))
                })
                .collect(),
        }
    }
}

/// How a token is obtained from an auth endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantType {
    /// JSON body `{username, password}`, token read from `token`
    #[default]
    Credentials,
    /// Form body with client id/secret, token read from `access_token`
    ClientCredentials,
}

/// Token endpoint configuration for one auth key
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthEndpointConfig {
    #[serde(default)]
    pub endpoint: String,
    #[serde(default)]
    pub grant: GrantType,
    pub username: Option<String>,
    pub password: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub scope: Option<String>,
    /// Lifetime of acquired tokens; negative or absent means never expires
    pub ttl_secs: Option<i64>,
}

/// Reporting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Output directory for reports
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Enabled report formats
    #[serde(default = "default_formats")]
    pub formats: Vec<String>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            formats: default_formats(),
        }
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout(),
            logging_enabled: true,
            slow_request_threshold_ms: default_slow_request_threshold(),
            common_headers: CommonHeaders::default(),
            auth: HashMap::new(),
            schema_dir: default_schema_dir(),
            report: ReportConfig::default(),
            custom: HashMap::new(),
        }
    }
}

fn default_base_url() -> String {
    BASE_URL.to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

fn default_slow_request_threshold() -> u64 {
    2000
}

fn default_schema_dir() -> PathBuf {
    PathBuf::from("schemas")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("reports")
}

fn default_formats() -> Vec<String> {
    vec!["json".to_string(), "html".to_string()]
}

/// Configuration manager with file loading and environment overrides
#[derive(Debug, Clone)]
pub struct ConfigurationManager {
    config: Arc<RwLock<Configuration>>,
    source: Option<PathBuf>,
}

impl Default for ConfigurationManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigurationManager {
    /// Create a manager holding the default configuration
    pub fn new() -> Self {
        Self::with_configuration(Configuration::default())
    }

    pub fn with_configuration(config: Configuration) -> Self {
        Self {
            config: Arc::new(RwLock::new(config)),
            source: None,
        }
    }

    /// Path of the last file loaded, if any
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Replace the current configuration with the contents of `path`.
    ///
    /// The format is picked from the extension: `.yaml`/`.yml`, `.json` or `.toml`.
    pub async fn load_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigurationError::FileNotFound {
                path: path.display().to_string(),
            }
            .into());
        }

        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let config = Self::parse(path, &content)?;
        log::info!("Loaded configuration from {:?}", path);

        *self.config.write() = config;
        self.source = Some(path.to_path_buf());
        Ok(())
    }

    fn parse(path: &Path, content: &str) -> Result<Configuration> {
        let config = match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => serde_yaml::from_str(content)
                .map_err(ConfigurationError::from)
                .with_context(|| "Failed to parse YAML configuration")?,
            Some("json") => serde_json::from_str(content)
                .map_err(ConfigurationError::from)
                .with_context(|| "Failed to parse JSON configuration")?,
            Some("toml") => toml::from_str(content)
                .map_err(ConfigurationError::from)
                .with_context(|| "Failed to parse TOML configuration")?,
            _ => {
                return Err(ConfigurationError::InvalidFormat {
                    message: format!("Unsupported config file format: {:?}", path),
                }
                .into());
            }
        };
        Ok(config)
    }

    /// Apply `BOOKRUNNER_*` overrides from the process environment
    pub fn apply_environment_overrides(&self) -> Result<()> {
        self.apply_overrides_with(|name| std::env::var(name).ok())
    }

    /// Apply overrides using `lookup` in place of the process environment
    pub fn apply_overrides_with<F>(&self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = self.config.write();

        if let Some(base_url) = lookup(ENV_BASE_URL) {
            log::debug!("Overriding base_url from {}", ENV_BASE_URL);
            config.base_url = base_url;
        }

        if let Some(timeout) = lookup(ENV_REQUEST_TIMEOUT) {
            config.request_timeout_secs = parse_env(ENV_REQUEST_TIMEOUT, &timeout)?;
        }

        if let Some(threshold) = lookup(ENV_SLOW_REQUEST_MS) {
            config.slow_request_threshold_ms = parse_env(ENV_SLOW_REQUEST_MS, &threshold)?;
        }

        if let Some(enabled) = lookup(ENV_LOGGING_ENABLED) {
            config.logging_enabled = parse_env(ENV_LOGGING_ENABLED, &enabled)?;
        }

        Ok(())
    }

    /// Validate configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        let config = self.config.read();
        let mut errors = Vec::new();

        if !(config.base_url.starts_with("http://") || config.base_url.starts_with("https://")) {
            errors.push(format!("base_url must be an http(s) URL: {}", config.base_url));
        }

        if config.request_timeout_secs == 0 {
            errors.push("request_timeout_secs must be greater than 0".to_string());
        }

        for (key, auth) in &config.auth {
            if auth.endpoint.trim().is_empty() {
                errors.push(format!("auth.{}.endpoint must not be empty", key));
            }
        }

        if !errors.is_empty() {
            return Err(ConfigurationError::ValidationFailed { errors }.into());
        }

        Ok(())
    }

    /// Get a snapshot of the current configuration
    pub fn configuration(&self) -> Configuration {
        self.config.read().clone()
    }

    /// Get a configuration value by path (dot-separated)
    pub fn get_value(&self, path: &str) -> Option<Value> {
        let config = self.config.read();
        let config_json = serde_json::to_value(&*config).ok()?;

        let mut current = &config_json;
        for part in path.split('.') {
            current = current.get(part)?;
        }

        Some(current.clone())
    }

    pub fn has_value(&self, path: &str) -> bool {
        matches!(self.get_value(path), Some(value) if !value.is_null())
    }

    pub fn get_string(&self, path: &str, default: &str) -> String {
        match self.get_value(path) {
            Some(Value::String(s)) => s,
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::Bool(b)) => b.to_string(),
            _ => default.to_string(),
        }
    }

    /// Integer value at `path`; anything that is not an integer yields `default`
    pub fn get_int(&self, path: &str, default: i64) -> i64 {
        match self.get_value(path) {
            Some(Value::Number(n)) => n.as_i64().unwrap_or_else(|| {
                log::warn!("Invalid integer value for key: {}", path);
                default
            }),
            Some(Value::String(s)) => s.trim().parse().unwrap_or_else(|_| {
                log::warn!("Invalid integer value for key: {}", path);
                default
            }),
            _ => default,
        }
    }

    pub fn get_bool(&self, path: &str, default: bool) -> bool {
        match self.get_value(path) {
            Some(Value::Bool(b)) => b,
            Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
                "true" => true,
                "false" => false,
                _ => default,
            },
            _ => default,
        }
    }

    /// Set a value by dotted path, creating intermediate objects as needed.
    ///
    /// Unknown top-level keys land in `custom`.
    pub fn set_value(&self, path: &str, value: Value) -> Result<()> {
        let mut config = self.config.write();
        let mut json = serde_json::to_value(&*config).context("Failed to serialize configuration")?;

        let parts: Vec<&str> = path.split('.').filter(|p| !p.is_empty()).collect();
        let (last, parents) = parts
            .split_last()
            .ok_or_else(|| ConfigurationError::InvalidFormat {
                message: "Empty configuration path".to_string(),
            })?;

        let mut current = &mut json;
        for part in parents {
            if !current.get(*part).map(Value::is_object).unwrap_or(false) {
                current[*part] = Value::Object(serde_json::Map::new());
            }
            current = &mut current[*part];
        }
        current[*last] = value;

        let updated: Configuration = serde_json::from_value(json)
            .map_err(ConfigurationError::from)
            .with_context(|| format!("Value at '{}' does not fit the configuration", path))?;
        *config = updated;
        Ok(())
    }

    pub fn common_headers(&self) -> Vec<(String, String)> {
        self.config.read().common_headers.pairs()
    }

    pub fn auth_config(&self, key: &str) -> Option<AuthEndpointConfig> {
        self.config.read().auth.get(key).cloned()
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        ConfigurationError::InvalidEnvironmentValue {
            name: name.to_string(),
            value: value.to_string(),
        }
        .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;
    use tokio::fs;

    #[test]
    fn test_default_configuration() {
        let manager = ConfigurationManager::new();
        let config = manager.configuration();

        assert_eq!(config.base_url, "https://restful-booker.herokuapp.com");
        assert_eq!(config.request_timeout_secs, 30);
        assert!(config.logging_enabled);
        assert_eq!(config.report.formats, vec!["json", "html"]);
        assert!(manager.validate().is_ok());
    }

    #[tokio::test]
    async fn test_load_yaml_configuration() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let yaml_content = r#"
base_url: "http://localhost:3001"
request_timeout_secs: 5
common_headers: "Accept=application/json;X-Client=bookrunner"
auth:
  booker:
    endpoint: "http://localhost:3001/auth"
    username: "admin"
    password: "password123"
    ttl_secs: 600
environment: staging
"#;
        fs::write(&config_path, yaml_content).await.unwrap();

        let mut manager = ConfigurationManager::new();
        manager.load_file(&config_path).await.unwrap();

        let config = manager.configuration();
        assert_eq!(config.base_url, "http://localhost:3001");
        assert_eq!(config.request_timeout_secs, 5);
        assert_eq!(config.auth["booker"].grant, GrantType::Credentials);
        assert_eq!(config.auth["booker"].ttl_secs, Some(600));
        assert_eq!(manager.get_string("environment", "dev"), "staging");
        assert_eq!(manager.source(), Some(config_path.as_path()));
        assert_eq!(
            manager.common_headers(),
            vec![
                ("Accept".to_string(), "application/json".to_string()),
                ("X-Client".to_string(), "bookrunner".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_unsupported_extension() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.ini");
        fs::write(&config_path, "base_url=x").await.unwrap();

        let mut manager = ConfigurationManager::new();
        let err = manager.load_file(&config_path).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigurationError>(),
            Some(ConfigurationError::InvalidFormat { .. })
        ));
    }

    #[tokio::test]
    async fn test_missing_file() {
        let mut manager = ConfigurationManager::new();
        let err = manager.load_file("/definitely/not/here.yaml").await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigurationError>(),
            Some(ConfigurationError::FileNotFound { .. })
        ));
    }

    #[test]
    fn test_environment_overrides() {
        let manager = ConfigurationManager::new();
        manager
            .apply_overrides_with(|name| match name {
                ENV_BASE_URL => Some("http://override:8080".to_string()),
                ENV_REQUEST_TIMEOUT => Some("12".to_string()),
                ENV_LOGGING_ENABLED => Some("false".to_string()),
                _ => None,
            })
            .unwrap();

        let config = manager.configuration();
        assert_eq!(config.base_url, "http://override:8080");
        assert_eq!(config.request_timeout_secs, 12);
        assert!(!config.logging_enabled);
        assert_eq!(config.slow_request_threshold_ms, 2000);
    }

    #[test]
    fn test_invalid_environment_value() {
        let manager = ConfigurationManager::new();
        let err = manager
            .apply_overrides_with(|name| (name == ENV_REQUEST_TIMEOUT).then(|| "soon".to_string()))
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<ConfigurationError>(),
            Some(ConfigurationError::InvalidEnvironmentValue { .. })
        ));
    }

    #[test]
    fn test_configuration_validation() {
        let manager = ConfigurationManager::new();
        manager.set_value("base_url", json!("ftp://nope")).unwrap();
        manager.set_value("request_timeout_secs", json!(0)).unwrap();

        let err = manager.validate().unwrap_err();
        match err.downcast_ref::<ConfigurationError>() {
            Some(ConfigurationError::ValidationFailed { errors }) => assert_eq!(errors.len(), 2),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_typed_getters() {
        let manager = ConfigurationManager::new();
        manager.set_value("retries", json!("3")).unwrap();
        manager.set_value("flaky", json!("yes")).unwrap();
        manager.set_value("nested.enabled", json!(true)).unwrap();

        assert_eq!(manager.get_int("retries", 0), 3);
        assert_eq!(manager.get_int("flaky", 7), 7);
        assert_eq!(manager.get_int("request_timeout_secs", 0), 30);
        assert!(manager.get_bool("nested.enabled", false));
        assert!(manager.get_bool("flaky", true));
        assert!(manager.has_value("nested.enabled"));
        assert!(!manager.has_value("nested.missing"));
        assert_eq!(manager.get_string("missing", "fallback"), "fallback");
    }
}
