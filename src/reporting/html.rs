use super::*;
use handlebars::Handlebars;
use serde_json::json;

const TEMPLATE_NAME: &str = "report";

pub struct HtmlReporter {
    handlebars: Handlebars<'static>,
}

impl HtmlReporter {
    pub fn new() -> Result<Self, ReportingError> {
        Self::with_template(DEFAULT_HTML_TEMPLATE)
    }

    pub fn with_template(template: &str) -> Result<Self, ReportingError> {
        let mut handlebars = Handlebars::new();
        handlebars
            .register_template_string(TEMPLATE_NAME, template)
            .map_err(|e| ReportingError::Template(e.to_string()))?;
        Ok(Self { handlebars })
    }

    /// Values are formatted here so the template needs no helpers
    fn template_data(results: &TestExecutionResults) -> serde_json::Value {
        let tests: Vec<_> = results
            .results
            .iter()
            .map(|test| {
                json!({
                    "name": test.name,
                    "description": test.description,
                    "status": test.status.to_string(),
                    "status_class": format!("{:?}", test.status).to_lowercase(),
                    "duration_ms": test.duration.as_millis() as u64,
                    "response_status": test.response_status,
                    "correlation_id": test.correlation_id,
                    "error_message": test.error_message,
                    "tags": test.tags.join(", "),
                    "assertions": test.assertions.iter().map(|a| json!({
                        "passed": a.success,
                        "message": a.message
                    })).collect::<Vec<_>>()
                })
            })
            .collect();

        json!({
            "execution": {
                "id": results.execution_id,
                "suite_name": results.suite_name,
                "start_time": results.start_time.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
                "end_time": results.end_time.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
                "duration_ms": results.total_duration.as_millis() as u64
            },
            "summary": results.summary,
            "success_rate": format!("{:.1}%", results.summary.success_rate),
            "environment": results.environment,
            "tests": tests
        })
    }
}

#[async_trait]
impl Reporter for HtmlReporter {
    fn name(&self) -> &str {
        "html"
    }

    fn format(&self) -> ReportFormat {
        ReportFormat::Html
    }

    async fn generate_report(&self, results: &TestExecutionResults) -> Result<ReportOutput, ReportingError> {
        let html = self
            .handlebars
            .render(TEMPLATE_NAME, &Self::template_data(results))
            .map_err(|e| ReportingError::Template(e.to_string()))?;

        Ok(ReportOutput {
            content: html.into_bytes(),
            content_type: "text/html".to_string(),
            file_extension: "html".to_string(),
        })
    }
}

const DEFAULT_HTML_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<title>API Test Report - {{execution.suite_name}}</title>
<style>
body { font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, sans-serif; margin: 2em; color: #333; }
table { border-collapse: collapse; width: 100%; }
th, td { border: 1px solid #ddd; padding: 6px 10px; text-align: left; vertical-align: top; }
th { background: #f4f4f4; }
.passed { color: #2e7d32; }
.failed { color: #c62828; }
.error { color: #ad1457; }
.skipped { color: #757575; }
.summary span { display: inline-block; margin-right: 2em; }
ul { margin: 0; padding-left: 1.2em; }
</style>
</head>
<body>
<h1>API Test Report</h1>
<p>Suite <strong>{{execution.suite_name}}</strong> against <code>{{environment.base_url}}</code></p>
<p>Execution {{execution.id}}: {{execution.start_time}} to {{execution.end_time}} ({{execution.duration_ms}} ms)</p>

<div class="summary">
<span>Total: {{summary.total_tests}}</span>
<span class="passed">Passed: {{summary.passed_tests}}</span>
<span class="failed">Failed: {{summary.failed_tests}}</span>
<span class="error">Errors: {{summary.error_tests}}</span>
<span class="skipped">Skipped: {{summary.skipped_tests}}</span>
<span>Success rate: {{success_rate}}</span>
<span>Average: {{summary.average_duration_ms}} ms</span>
</div>

<h2>Tests</h2>
<table>
<thead>
<tr><th>Test</th><th>Status</th><th>HTTP</th><th>Duration</th><th>Assertions</th><th>Details</th></tr>
</thead>
<tbody>
{{#each tests}}
<tr>
<td>{{name}}{{#if description}}<br><small>{{description}}</small>{{/if}}</td>
<td class="{{status_class}}">{{status}}</td>
<td>{{#if response_status}}{{response_status}}{{/if}}</td>
<td>{{duration_ms}} ms</td>
<td><ul>{{#each assertions}}<li class="{{#if passed}}passed{{else}}failed{{/if}}">{{message}}</li>{{/each}}</ul></td>
<td>{{#if error_message}}{{error_message}}{{/if}}{{#if correlation_id}}<br><small>{{correlation_id}}</small>{{/if}}</td>
</tr>
{{/each}}
</tbody>
</table>

<p><small>{{environment.os}}/{{environment.arch}} on {{environment.hostname}}, runner {{environment.runner_version}}</small></p>
</body>
</html>
"#;
