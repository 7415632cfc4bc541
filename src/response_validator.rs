//! Status, header, and body assertions on an [`ApiResponse`]

use jsonpath_rust::{JsonPathFinder, JsonPathInst};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::str::FromStr;

use crate::error::AssertionError;
use crate::transport::ApiResponse;

/// Outcome of a single check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssertionResult {
    pub success: bool,
    pub message: String,
    pub actual_value: Option<JsonValue>,
    pub expected_value: Option<JsonValue>,
}

impl AssertionResult {
    pub fn passed(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            actual_value: None,
            expected_value: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            ..Self::passed(message)
        }
    }

    fn into_result(self) -> Result<(), AssertionError> {
        if self.success {
            Ok(())
        } else {
            log::error!("{}", self.message);
            Err(AssertionError::Failed { message: self.message })
        }
    }
}

/// Everything [`ResponseValidator::validate_response`] checks in one go
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResponseExpectation {
    pub status_code: u16,
    pub content_type: Option<String>,
    #[serde(default)]
    pub required_fields: Vec<String>,
    #[serde(default)]
    pub field_values: Vec<(String, JsonValue)>,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ResponseValidator;

impl ResponseValidator {
    pub fn status_code(response: &ApiResponse, expected: u16) -> AssertionResult {
        let actual = response.status_code;
        let success = actual == expected;

        if success {
            log::info!("Status code validation passed: {}", actual);
        } else {
            log::warn!("Status code validation failed: Expected {}, but got {}", expected, actual);
        }

        AssertionResult {
            success,
            message: if success {
                format!("Status code matches expected value: {}", expected)
            } else {
                format!("Expected status code {} but got {}", expected, actual)
            },
            actual_value: Some(JsonValue::from(actual)),
            expected_value: Some(JsonValue::from(expected)),
        }
    }

    pub fn header(response: &ApiResponse, name: &str, expected: &str) -> AssertionResult {
        let actual = response.header(name);
        let success = actual == Some(expected);

        if !success {
            log::warn!(
                "Header validation failed for {}: Expected {}, but got {}",
                name,
                expected,
                actual.unwrap_or("<missing>")
            );
        }

        AssertionResult {
            success,
            message: if success {
                format!("Header '{}' matches expected value", name)
            } else {
                format!(
                    "Header '{}' mismatch: expected '{}', got '{}'",
                    name,
                    expected,
                    actual.unwrap_or("<missing>")
                )
            },
            actual_value: actual.map(JsonValue::from),
            expected_value: Some(JsonValue::from(expected)),
        }
    }

    /// Passes when the `Content-Type` header contains `expected`
    pub fn content_type(response: &ApiResponse, expected: &str) -> AssertionResult {
        let actual = response.header("content-type");
        let success = actual.map(|v| v.contains(expected)).unwrap_or(false);

        AssertionResult {
            success,
            message: if success {
                format!("Content type validation passed: {}", actual.unwrap_or_default())
            } else {
                format!(
                    "Content type validation failed: Expected {}, but got {}",
                    expected,
                    actual.unwrap_or("<missing>")
                )
            },
            actual_value: actual.map(JsonValue::from),
            expected_value: Some(JsonValue::from(expected)),
        }
    }

    /// Compare the value at `path` with `expected`.
    ///
    /// `path` is a JSONPath (`$.booking.firstname`) or a bare dotted path (`booking.firstname`).
    pub fn field(response: &ApiResponse, path: &str, expected: &JsonValue) -> AssertionResult {
        let actual = match Self::extract(response, path) {
            Ok(actual) => actual,
            Err(message) => {
                log::error!("Error validating field {}: {}", path, message);
                return AssertionResult {
                    success: false,
                    message,
                    actual_value: None,
                    expected_value: Some(expected.clone()),
                };
            }
        };

        let success = actual.as_ref() == Some(expected);
        AssertionResult {
            success,
            message: if success {
                format!("Field '{}' matches expected value: {}", path, expected)
            } else {
                format!(
                    "Field '{}' mismatch: expected {}, got {}",
                    path,
                    expected,
                    actual.as_ref().map(ToString::to_string).unwrap_or_else(|| "<missing>".to_string())
                )
            },
            actual_value: actual,
            expected_value: Some(expected.clone()),
        }
    }

    /// Passes when the string at `path` matches the regex `pattern`
    pub fn field_matches(response: &ApiResponse, path: &str, pattern: &str) -> AssertionResult {
        let failed = |message: String| AssertionResult {
            success: false,
            message,
            actual_value: None,
            expected_value: Some(JsonValue::from(pattern)),
        };

        let regex = match regex::Regex::new(pattern) {
            Ok(regex) => regex,
            Err(e) => return failed(format!("Invalid regex pattern '{}': {}", pattern, e)),
        };

        let actual = match Self::extract(response, path) {
            Ok(Some(actual)) => actual,
            Ok(None) => return failed(format!("Field '{}' not found", path)),
            Err(message) => return failed(message),
        };

        let (success, message) = match actual.as_str() {
            Some(text) if regex.is_match(text) => (true, format!("Field '{}' matches pattern '{}'", path, pattern)),
            Some(text) => (
                false,
                format!("Field '{}' value '{}' does not match pattern '{}'", path, text, pattern),
            ),
            None => (false, format!("Field '{}' is not a string: {}", path, actual)),
        };

        AssertionResult {
            success,
            message,
            actual_value: Some(actual),
            expected_value: Some(JsonValue::from(pattern)),
        }
    }

    /// One result per path; a field passes when it exists and is not null
    pub fn required_fields<S: AsRef<str>>(response: &ApiResponse, paths: &[S]) -> Vec<AssertionResult> {
        paths
            .iter()
            .map(|path| {
                let path = path.as_ref();
                let value = Self::extract(response, path).ok().flatten();
                let success = matches!(&value, Some(v) if !v.is_null());

                if !success {
                    log::warn!("Required field validation failed for {}: Value is null", path);
                }

                AssertionResult {
                    success,
                    message: if success {
                        format!("Required field present: {}", path)
                    } else {
                        format!("Required field missing: {}", path)
                    },
                    actual_value: value,
                    expected_value: None,
                }
            })
            .collect()
    }

    pub fn validate_response(response: &ApiResponse, expectation: &ResponseExpectation) -> Vec<AssertionResult> {
        let mut results = vec![Self::status_code(response, expectation.status_code)];

        if let Some(content_type) = &expectation.content_type {
            results.push(Self::content_type(response, content_type));
        }

        results.extend(Self::required_fields(response, &expectation.required_fields));

        for (path, expected) in &expectation.field_values {
            results.push(Self::field(response, path, expected));
        }

        if results.iter().all(|r| r.success) {
            log::info!("All response validations passed");
        } else {
            log::warn!("Some response validations failed");
        }

        results
    }

    pub fn assert_status_code(response: &ApiResponse, expected: u16) -> Result<(), AssertionError> {
        Self::status_code(response, expected).into_result()
    }

    pub fn assert_header(response: &ApiResponse, name: &str, expected: &str) -> Result<(), AssertionError> {
        Self::header(response, name, expected).into_result()
    }

    pub fn assert_content_type(response: &ApiResponse, expected: &str) -> Result<(), AssertionError> {
        Self::content_type(response, expected).into_result()
    }

    pub fn assert_field(response: &ApiResponse, path: &str, expected: &JsonValue) -> Result<(), AssertionError> {
        Self::field(response, path, expected).into_result()
    }

    pub fn assert_response(response: &ApiResponse, expectation: &ResponseExpectation) -> Result<(), AssertionError> {
        let failures: Vec<String> = Self::validate_response(response, expectation)
            .into_iter()
            .filter(|r| !r.success)
            .map(|r| r.message)
            .collect();

        if failures.is_empty() {
            Ok(())
        } else {
            Err(AssertionError::Failed {
                message: failures.join("; "),
            })
        }
    }

    /// Value at `path`, `None` when nothing matches
    pub fn extract(response: &ApiResponse, path: &str) -> Result<Option<JsonValue>, String> {
        let json = response
            .json()
            .map_err(|e| format!("Failed to parse JSON: {}", e))?;
        query(&json, path)
    }
}

/// Run a JSONPath query, unwrapping single matches.
///
/// Unmatched paths yield `None`; a field that is present but `null` yields `Some(Null)`.
pub(crate) fn query(json: &JsonValue, path: &str) -> Result<Option<JsonValue>, String> {
    let path = if path.starts_with('$') {
        path.to_string()
    } else {
        format!("$.{}", path)
    };

    let instance = JsonPathInst::from_str(&path).map_err(|e| format!("JSONPath query failed: {}", e))?;
    let finder = JsonPathFinder::new(Box::new(json.clone()), Box::new(instance));

    let mut matches: Vec<JsonValue> = finder
        .find_slice()
        .into_iter()
        .filter(|v| v.has_value())
        .map(|v| v.to_data())
        .collect();

    Ok(match matches.len() {
        0 => None,
        1 => matches.pop(),
        _ => Some(JsonValue::Array(matches)),
    })
}
