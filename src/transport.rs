//! Request/response model and the transport seam every HTTP caller goes through

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::TransportError;

pub const CORRELATION_ID_HEADER: &str = "X-Correlation-ID";

/// HTTP methods supported by the runner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HttpMethod {
    GET,
    POST,
    PUT,
    PATCH,
    DELETE,
    HEAD,
    OPTIONS,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpMethod::GET => write!(f, "GET"),
            HttpMethod::POST => write!(f, "POST"),
            HttpMethod::PUT => write!(f, "PUT"),
            HttpMethod::PATCH => write!(f, "PATCH"),
            HttpMethod::DELETE => write!(f, "DELETE"),
            HttpMethod::HEAD => write!(f, "HEAD"),
            HttpMethod::OPTIONS => write!(f, "OPTIONS"),
        }
    }
}

impl FromStr for HttpMethod {
    type Err = TransportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::GET),
            "POST" => Ok(HttpMethod::POST),
            "PUT" => Ok(HttpMethod::PUT),
            "PATCH" => Ok(HttpMethod::PATCH),
            "DELETE" => Ok(HttpMethod::DELETE),
            "HEAD" => Ok(HttpMethod::HEAD),
            "OPTIONS" => Ok(HttpMethod::OPTIONS),
            other => Err(TransportError::InvalidRequest(format!("Unsupported HTTP method: {}", other))),
        }
    }
}

/// Outgoing request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: HashMap<String, String>,
    pub body: Option<Vec<u8>>,
    /// Per-request timeout; the client default applies when absent
    pub timeout: Option<Duration>,
}

impl ApiRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HashMap::new(),
            body: None,
            timeout: None,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (name, value) in headers {
            self.headers.insert(name.into(), value.into());
        }
        self
    }

    /// Set a JSON body, adding `Content-Type: application/json` unless one is set
    pub fn json_body(mut self, body: &Value) -> Self {
        self.body = Some(body.to_string().into_bytes());
        if self.header_value("content-type").is_none() {
            self.headers.insert("Content-Type".to_string(), "application/json".to_string());
        }
        self
    }

    pub fn text_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into().into_bytes());
        self
    }

    /// Set a url-encoded form body
    pub fn form_body<T: Serialize + ?Sized>(mut self, form: &T) -> Result<Self, TransportError> {
        let encoded = serde_urlencoded::to_string(form)
            .map_err(|e| TransportError::InvalidRequest(format!("Failed to encode form body: {}", e)))?;
        self.body = Some(encoded.into_bytes());
        if self.header_value("content-type").is_none() {
            self.headers.insert(
                "Content-Type".to_string(),
                "application/x-www-form-urlencoded".to_string(),
            );
        }
        Ok(self)
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Case-insensitive header lookup
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn body_text(&self) -> Option<String> {
        self.body.as_ref().map(|b| String::from_utf8_lossy(b).into_owned())
    }
}

/// Response received from a transport
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status_code: u16,
    /// Header names are stored lower-cased
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
    pub duration: Duration,
    pub correlation_id: Option<String>,
}

impl ApiResponse {
    pub fn new(status_code: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status_code,
            headers: HashMap::new(),
            body: body.into(),
            duration: Duration::ZERO,
            correlation_id: None,
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json(&self) -> Result<Value, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    pub fn duration_ms(&self) -> u64 {
        u64::try_from(self.duration.as_millis()).unwrap_or(u64::MAX)
    }
}

/// Anything that can carry an [`ApiRequest`] to a server
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_method_round_trips_through_strings() {
        for method in [
            HttpMethod::GET,
            HttpMethod::POST,
            HttpMethod::PUT,
            HttpMethod::PATCH,
            HttpMethod::DELETE,
        ] {
            assert_eq!(method.to_string().parse::<HttpMethod>().unwrap(), method);
        }
        assert_eq!("delete".parse::<HttpMethod>().unwrap(), HttpMethod::DELETE);
        assert!("TRACE".parse::<HttpMethod>().is_err());
    }

    #[test]
    fn test_json_body_sets_content_type_once() {
        let request = ApiRequest::new(HttpMethod::POST, "http://localhost/booking")
            .header("content-type", "application/vnd.custom+json")
            .json_body(&json!({"a": 1}));

        assert_eq!(request.headers.len(), 1);
        assert_eq!(request.header_value("Content-Type"), Some("application/vnd.custom+json"));
        assert_eq!(request.body_text().as_deref(), Some(r#"{"a":1}"#));
    }

    #[test]
    fn test_form_body_is_url_encoded() {
        let request = ApiRequest::new(HttpMethod::POST, "http://localhost/token")
            .form_body(&[("grant_type", "client_credentials"), ("scope", "read write")])
            .unwrap();

        assert_eq!(
            request.body_text().as_deref(),
            Some("grant_type=client_credentials&scope=read+write")
        );
        assert_eq!(
            request.header_value("content-type"),
            Some("application/x-www-form-urlencoded")
        );
    }

    #[test]
    fn test_response_header_lookup_ignores_case() {
        let response = ApiResponse::new(200, "{}").with_header("Content-Type", "application/json");

        assert_eq!(response.header("CONTENT-TYPE"), Some("application/json"));
        assert!(response.is_success());
        assert!(!ApiResponse::new(404, "").is_success());
    }
}
