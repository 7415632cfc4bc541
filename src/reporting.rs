use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::{Duration, Instant};

pub mod html;
pub mod json;

pub use crate::error::ReportingError;
use crate::response_validator::AssertionResult;

pub use self::html::HtmlReporter;
pub use self::json::JsonReporter;

#[async_trait]
pub trait Reporter: Send + Sync {
    fn name(&self) -> &str;
    fn format(&self) -> ReportFormat;
    async fn generate_report(&self, results: &TestExecutionResults) -> Result<ReportOutput, ReportingError>;
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    Json,
    Html,
}

impl ReportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Json => "json",
            ReportFormat::Html => "html",
        }
    }

    pub fn reporter(&self) -> Result<Box<dyn Reporter>, ReportingError> {
        Ok(match self {
            ReportFormat::Json => Box::new(JsonReporter::new()),
            ReportFormat::Html => Box::new(HtmlReporter::new()?),
        })
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ReportFormat {
    type Err = ReportingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(ReportFormat::Json),
            "html" => Ok(ReportFormat::Html),
            other => Err(ReportingError::UnsupportedFormat(other.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReportOutput {
    pub content: Vec<u8>,
    pub content_type: String,
    pub file_extension: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestExecutionResults {
    pub execution_id: String,
    pub suite_name: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub total_duration: Duration,
    pub environment: EnvironmentInfo,
    pub results: Vec<TestResult>,
    pub summary: ExecutionSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentInfo {
    pub hostname: String,
    pub os: String,
    pub arch: String,
    pub runner_version: String,
    pub base_url: String,
}

impl EnvironmentInfo {
    pub fn current(base_url: impl Into<String>) -> Self {
        Self {
            hostname: std::env::var("HOSTNAME").unwrap_or_else(|_| "unknown".to_string()),
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
            runner_version: env!("CARGO_PKG_VERSION").to_string(),
            base_url: base_url.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TestStatus {
    Passed,
    Failed,
    Skipped,
    Error,
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TestStatus::Passed => "PASSED",
            TestStatus::Failed => "FAILED",
            TestStatus::Skipped => "SKIPPED",
            TestStatus::Error => "ERROR",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResult {
    pub test_id: String,
    pub name: String,
    pub description: Option<String>,
    pub status: TestStatus,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration: Duration,
    pub response_status: Option<u16>,
    pub correlation_id: Option<String>,
    pub assertions: Vec<AssertionResult>,
    pub error_message: Option<String>,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ExecutionSummary {
    pub total_tests: usize,
    pub passed_tests: usize,
    pub failed_tests: usize,
    pub skipped_tests: usize,
    pub error_tests: usize,
    pub success_rate: f64,
    pub total_assertions: usize,
    pub passed_assertions: usize,
    pub failed_assertions: usize,
    pub average_duration_ms: u64,
    pub max_duration_ms: u64,
}

impl ExecutionSummary {
    pub fn from_results(results: &[TestResult]) -> Self {
        let count = |status: TestStatus| results.iter().filter(|r| r.status == status).count();

        let total_tests = results.len();
        let passed_tests = count(TestStatus::Passed);

        let total_assertions: usize = results.iter().map(|r| r.assertions.len()).sum();
        let passed_assertions = results
            .iter()
            .flat_map(|r| &r.assertions)
            .filter(|a| a.success)
            .count();

        let durations: Vec<u64> = results
            .iter()
            .map(|r| u64::try_from(r.duration.as_millis()).unwrap_or(u64::MAX))
            .collect();

        Self {
            total_tests,
            passed_tests,
            failed_tests: count(TestStatus::Failed),
            skipped_tests: count(TestStatus::Skipped),
            error_tests: count(TestStatus::Error),
            success_rate: if total_tests > 0 {
                (passed_tests as f64 / total_tests as f64) * 100.0
            } else {
                0.0
            },
            total_assertions,
            passed_assertions,
            failed_assertions: total_assertions - passed_assertions,
            average_duration_ms: if durations.is_empty() {
                0
            } else {
                durations.iter().sum::<u64>() / durations.len() as u64
            },
            max_duration_ms: durations.iter().copied().max().unwrap_or(0),
        }
    }

    pub fn all_passed(&self) -> bool {
        self.failed_tests == 0 && self.error_tests == 0
    }
}

/// A test that has started but not yet produced a [`TestResult`]
#[derive(Debug)]
pub struct TestRun {
    name: String,
    description: Option<String>,
    start_time: DateTime<Utc>,
    started: Instant,
    response_status: Option<u16>,
    correlation_id: Option<String>,
    assertions: Vec<AssertionResult>,
    tags: Vec<String>,
}

impl TestRun {
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn assertion(&mut self, assertion: AssertionResult) -> &mut Self {
        self.assertions.push(assertion);
        self
    }

    /// Remember the status and correlation id of the response under test
    pub fn response(&mut self, status: u16, correlation_id: Option<String>) -> &mut Self {
        self.response_status = Some(status);
        self.correlation_id = correlation_id;
        self
    }

    /// Passed when every assertion passed, Failed otherwise
    pub fn finish(self) -> TestResult {
        let failure = self
            .assertions
            .iter()
            .find(|a| !a.success)
            .map(|a| a.message.clone());

        match failure {
            None => self.complete(TestStatus::Passed, None),
            Some(message) => self.complete(TestStatus::Failed, Some(message)),
        }
    }

    pub fn error(self, message: impl Into<String>) -> TestResult {
        self.complete(TestStatus::Error, Some(message.into()))
    }

    pub fn skip(self, reason: impl Into<String>) -> TestResult {
        self.complete(TestStatus::Skipped, Some(reason.into()))
    }

    fn complete(self, status: TestStatus, error_message: Option<String>) -> TestResult {
        TestResult {
            test_id: uuid::Uuid::new_v4().to_string(),
            name: self.name,
            description: self.description,
            status,
            start_time: self.start_time,
            end_time: Utc::now(),
            duration: self.started.elapsed(),
            response_status: self.response_status,
            correlation_id: self.correlation_id,
            assertions: self.assertions,
            error_message,
            tags: self.tags,
        }
    }
}

/// Collects test results for one suite execution
#[derive(Debug)]
pub struct ReportBuilder {
    execution_id: String,
    suite_name: String,
    start_time: DateTime<Utc>,
    started: Instant,
    environment: EnvironmentInfo,
    results: Vec<TestResult>,
}

impl ReportBuilder {
    pub fn new(suite_name: impl Into<String>, environment: EnvironmentInfo) -> Self {
        Self {
            execution_id: uuid::Uuid::new_v4().to_string(),
            suite_name: suite_name.into(),
            start_time: Utc::now(),
            started: Instant::now(),
            environment,
            results: Vec::new(),
        }
    }

    pub fn execution_id(&self) -> &str {
        &self.execution_id
    }

    pub fn start_test(&self, name: impl Into<String>) -> TestRun {
        let name = name.into();
        log::info!("Starting test: {}", name);
        TestRun {
            name,
            description: None,
            start_time: Utc::now(),
            started: Instant::now(),
            response_status: None,
            correlation_id: None,
            assertions: Vec::new(),
            tags: Vec::new(),
        }
    }

    pub fn record(&mut self, result: TestResult) {
        match result.status {
            TestStatus::Passed => log::info!("Test {}: {} ({} ms)", result.status, result.name, result.duration.as_millis()),
            TestStatus::Skipped => log::warn!("Test {}: {}", result.status, result.name),
            TestStatus::Failed | TestStatus::Error => log::error!(
                "Test {}: {}: {}",
                result.status,
                result.name,
                result.error_message.as_deref().unwrap_or("")
            ),
        }
        self.results.push(result);
    }

    pub fn results(&self) -> &[TestResult] {
        &self.results
    }

    pub fn finish(self) -> TestExecutionResults {
        let summary = ExecutionSummary::from_results(&self.results);
        log::info!(
            "Suite '{}' finished: {}/{} passed",
            self.suite_name,
            summary.passed_tests,
            summary.total_tests
        );

        TestExecutionResults {
            execution_id: self.execution_id,
            suite_name: self.suite_name,
            start_time: self.start_time,
            end_time: Utc::now(),
            total_duration: self.started.elapsed(),
            environment: self.environment,
            results: self.results,
            summary,
        }
    }
}

pub fn report_file_name(results: &TestExecutionResults, format: ReportFormat) -> String {
    format!(
        "{}-{}.{}",
        results.suite_name.replace(' ', "-").to_lowercase(),
        results.execution_id,
        format.extension()
    )
}

/// Render each format and write it under `output_dir`
pub async fn write_reports(
    results: &TestExecutionResults,
    output_dir: impl AsRef<Path>,
    formats: &[ReportFormat],
) -> Result<Vec<PathBuf>, ReportingError> {
    let output_dir = output_dir.as_ref();
    tokio::fs::create_dir_all(output_dir).await?;

    let mut written = Vec::with_capacity(formats.len());
    for format in formats {
        let reporter = format.reporter()?;
        let output = reporter.generate_report(results).await?;

        let path = output_dir.join(report_file_name(results, *format));
        tokio::fs::write(&path, &output.content).await?;
        log::info!("{} report written to {}", reporter.name(), path.display());
        written.push(path);
    }

    Ok(written)
}
