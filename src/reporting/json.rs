use super::*;
use serde_json::{json, Value};

pub struct JsonReporter {
    pretty: bool,
}

impl JsonReporter {
    pub fn new() -> Self {
        Self { pretty: true }
    }

    pub fn compact() -> Self {
        Self { pretty: false }
    }

    fn build_report(&self, results: &TestExecutionResults) -> Value {
        json!({
            "report_metadata": {
                "format": "json",
                "version": "1.0",
                "generated_at": Utc::now().to_rfc3339(),
                "generator": env!("CARGO_PKG_NAME"),
                "generator_version": env!("CARGO_PKG_VERSION")
            },
            "execution": {
                "id": results.execution_id,
                "suite_name": results.suite_name,
                "start_time": results.start_time.to_rfc3339(),
                "end_time": results.end_time.to_rfc3339(),
                "duration_ms": results.total_duration.as_millis() as u64
            },
            "summary": results.summary,
            "environment": results.environment,
            "test_results": results.results.iter().map(Self::test_json).collect::<Vec<_>>(),
            "failure_analysis": Self::failure_analysis(&results.results)
        })
    }

    fn test_json(test: &TestResult) -> Value {
        json!({
            "test_id": test.test_id,
            "name": test.name,
            "description": test.description,
            "status": test.status,
            "start_time": test.start_time.to_rfc3339(),
            "end_time": test.end_time.to_rfc3339(),
            "duration_ms": test.duration.as_millis() as u64,
            "response_status": test.response_status,
            "correlation_id": test.correlation_id,
            "assertions": test.assertions,
            "error_message": test.error_message,
            "tags": test.tags
        })
    }

    fn failure_analysis(tests: &[TestResult]) -> Value {
        let failures: Vec<Value> = tests
            .iter()
            .filter(|t| matches!(t.status, TestStatus::Failed | TestStatus::Error))
            .map(|t| {
                json!({
                    "name": t.name,
                    "status": t.status,
                    "error_message": t.error_message,
                    "failed_assertions": t.assertions.iter()
                        .filter(|a| !a.success)
                        .map(|a| a.message.as_str())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        json!({
            "total_failures": failures.len(),
            "failures": failures
        })
    }
}

impl Default for JsonReporter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Reporter for JsonReporter {
    fn name(&self) -> &str {
        "json"
    }

    fn format(&self) -> ReportFormat {
        ReportFormat::Json
    }

    async fn generate_report(&self, results: &TestExecutionResults) -> Result<ReportOutput, ReportingError> {
        let report = self.build_report(results);
        let content = if self.pretty {
            serde_json::to_vec_pretty(&report)?
        } else {
            serde_json::to_vec(&report)?
        };

        Ok(ReportOutput {
            content,
            content_type: "application/json".to_string(),
            file_extension: "json".to_string(),
        })
    }
}
