use thiserror::Error;
use std::time::Duration;

/// Core error types for the booking API runner
#[derive(Error, Debug)]
pub enum BookRunnerError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Assertion error: {0}")]
    Assertion(#[from] AssertionError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Data source error: {0}")]
    DataSource(#[from] DataSourceError),

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Reporting error: {0}")]
    Reporting(#[from] ReportingError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// HTTP transport errors
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timeout after {timeout:?}")]
    Timeout { timeout: Duration },

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Network error: {0}")]
    NetworkError(String),
}

/// Token acquisition and header formatting errors
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("No auth configuration for key: {0}")]
    NotConfigured(String),

    #[error("Token endpoint not configured for key: {0}")]
    MissingEndpoint(String),

    #[error("Credentials missing for key: {0}")]
    MissingCredentials(String),

    #[error("Token request failed with status {status}: {body}")]
    RequestFailed { status: u16, body: String },

    #[error("Token response could not be parsed: {0}")]
    InvalidResponse(String),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Assertion failures raised by the `assert_*` helpers
#[derive(Error, Debug)]
pub enum AssertionError {
    #[error("Assertion failed: {message}")]
    Failed { message: String },

    #[error("Invalid assertion configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Type mismatch in assertion: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },
}

/// Contract and schema validation errors
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Contract validation failed. Errors: {}", .0.join(", "))]
    ContractViolations(Vec<String>),

    #[error("Schema validation failed. Errors: {}", .0.join(", "))]
    SchemaViolations(Vec<String>),

    #[error("Required fields missing: {}", .0.join(", "))]
    MissingFields(Vec<String>),

    #[error("Response body is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Data source-specific errors
#[derive(Error, Debug)]
pub enum DataSourceError {
    #[error("Data source not found: {0}")]
    NotFound(String),

    #[error("Sheet '{sheet}' not found in workbook: {path}")]
    SheetNotFound { sheet: String, path: String },

    #[error("Header row not found in sheet: {0}")]
    MissingHeader(String),

    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    #[error("File error: {0}")]
    FileError(String),
}

/// Configuration management errors
#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    #[error("Invalid configuration format: {message}")]
    InvalidFormat { message: String },

    #[error("Configuration validation failed: {errors:?}")]
    ValidationFailed { errors: Vec<String> },

    #[error("Invalid value for environment variable {name}: {value}")]
    InvalidEnvironmentValue { name: String, value: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Report generation errors
#[derive(Error, Debug)]
pub enum ReportingError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Template error: {0}")]
    Template(String),

    #[error("Unsupported report format: {0}")]
    UnsupportedFormat(String),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, BookRunnerError>;

impl From<serde_json::Error> for ReportingError {
    fn from(err: serde_json::Error) -> Self {
        ReportingError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for ConfigurationError {
    fn from(err: serde_yaml::Error) -> Self {
        ConfigurationError::InvalidFormat { message: err.to_string() }
    }
}

impl From<serde_json::Error> for ConfigurationError {
    fn from(err: serde_json::Error) -> Self {
        ConfigurationError::InvalidFormat { message: err.to_string() }
    }
}

impl From<toml::de::Error> for ConfigurationError {
    fn from(err: toml::de::Error) -> Self {
        ConfigurationError::InvalidFormat { message: err.to_string() }
    }
}

impl From<calamine::Error> for DataSourceError {
    fn from(err: calamine::Error) -> Self {
        DataSourceError::FileError(err.to_string())
    }
}
