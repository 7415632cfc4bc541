//! Fluent stubbing of HTTP endpoints on a [`wiremock::MockServer`]

use serde_json::{json, Value as JsonValue};
use std::time::Duration;
use wiremock::matchers::{any, body_json, body_string, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::endpoints::{CONTENT_TYPE_JSON, HEADER_CONTENT_TYPE};

#[derive(Debug, Clone)]
enum StubBody {
    Json(JsonValue),
    Text(String),
}

/// Describes one request matcher and the canned response it returns
#[derive(Debug, Clone)]
pub struct RequestStubber {
    method: Option<String>,
    path: Option<String>,
    query: Vec<(String, String)>,
    request_headers: Vec<(String, String)>,
    request_body: Option<StubBody>,
    status: u16,
    response_headers: Vec<(String, String)>,
    response_body: Option<StubBody>,
    delay: Option<Duration>,
    times: Option<u64>,
    priority: Option<u8>,
}

impl Default for RequestStubber {
    fn default() -> Self {
        Self {
            method: None,
            path: None,
            query: Vec::new(),
            request_headers: Vec::new(),
            request_body: None,
            status: 200,
            response_headers: Vec::new(),
            response_body: None,
            delay: None,
            times: None,
            priority: None,
        }
    }
}

impl RequestStubber {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into().to_uppercase());
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn query_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    pub fn request_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.request_headers.push((name.into(), value.into()));
        self
    }

    /// Match requests whose body is this JSON document
    pub fn json_body(mut self, body: JsonValue) -> Self {
        self.request_body = Some(StubBody::Json(body));
        self
    }

    pub fn text_body(mut self, body: impl Into<String>) -> Self {
        self.request_body = Some(StubBody::Text(body.into()));
        self
    }

    pub fn status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    pub fn response_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.response_headers.push((name.into(), value.into()));
        self
    }

    pub fn json_response(mut self, body: JsonValue) -> Self {
        self.response_body = Some(StubBody::Json(body));
        self
    }

    pub fn text_response(mut self, body: impl Into<String>) -> Self {
        self.response_body = Some(StubBody::Text(body.into()));
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Answer at most `times` matching requests
    pub fn times(mut self, times: u64) -> Self {
        self.times = Some(times);
        self
    }

    /// Lower values win when several stubs match the same request
    pub fn priority(mut self, priority: u8) -> Self {
        self.priority = Some(priority);
        self
    }

    fn describe(&self) -> String {
        format!(
            "{} {}",
            self.method.as_deref().unwrap_or("ANY"),
            self.path.as_deref().unwrap_or("*")
        )
    }

    fn build(self) -> Mock {
        let name = self.describe();

        let mut builder = match &self.method {
            Some(m) => Mock::given(method(m.as_str())),
            None => Mock::given(any()),
        };

        if let Some(p) = &self.path {
            builder = builder.and(path(p.as_str()));
        }
        for (name, value) in &self.query {
            builder = builder.and(query_param(name.as_str(), value.as_str()));
        }
        for (name, value) in &self.request_headers {
            builder = builder.and(header(name.as_str(), value.as_str()));
        }
        match &self.request_body {
            Some(StubBody::Json(body)) => builder = builder.and(body_json(body)),
            Some(StubBody::Text(body)) => builder = builder.and(body_string(body.clone())),
            None => {}
        }

        let mut template = ResponseTemplate::new(self.status);
        for (name, value) in &self.response_headers {
            template = template.append_header(name.as_str(), value.as_str());
        }
        match self.response_body {
            Some(StubBody::Json(body)) => {
                template = template.set_body_json(body);
                if !self
                    .response_headers
                    .iter()
                    .any(|(n, _)| n.eq_ignore_ascii_case(HEADER_CONTENT_TYPE))
                {
                    template = template.insert_header(HEADER_CONTENT_TYPE, CONTENT_TYPE_JSON);
                }
            }
            Some(StubBody::Text(body)) => template = template.set_body_string(body),
            None => {}
        }
        if let Some(delay) = self.delay {
            template = template.set_delay(delay);
        }

        let mut mock = builder.respond_with(template).named(name);
        if let Some(times) = self.times {
            mock = mock.up_to_n_times(times);
        }
        if let Some(priority) = self.priority {
            mock = mock.with_priority(priority);
        }
        mock
    }

    /// Register the stub on `server`
    pub async fn stub(self, server: &MockServer) {
        log::info!("Created stub for {} on {}", self.describe(), server.uri());
        self.build().mount(server).await;
    }
}

pub async fn stub_json_response(server: &MockServer, method: &str, path: &str, status: u16, body: JsonValue) {
    RequestStubber::new()
        .method(method)
        .path(path)
        .status(status)
        .json_response(body)
        .stub(server)
        .await;
}

/// Respond with `{"error": message}` and the given status
pub async fn stub_error_response(server: &MockServer, method: &str, path: &str, status: u16, message: &str) {
    stub_json_response(server, method, path, status, json!({ "error": message })).await;
}

pub async fn stub_slow_response(server: &MockServer, method: &str, path: &str, delay: Duration, body: JsonValue) {
    RequestStubber::new()
        .method(method)
        .path(path)
        .json_response(body)
        .delay(delay)
        .stub(server)
        .await;
}

/// Requests carrying `name: value` get `status`; anything else on the route gets 401
pub async fn stub_with_required_header(server: &MockServer, method: &str, path: &str, name: &str, value: &str, status: u16) {
    RequestStubber::new()
        .method(method)
        .path(path)
        .request_header(name, value)
        .status(status)
        .priority(1)
        .stub(server)
        .await;

    RequestStubber::new()
        .method(method)
        .path(path)
        .status(401)
        .json_response(json!({ "error": "Unauthorized" }))
        .priority(10)
        .stub(server)
        .await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_and_description() {
        let stubber = RequestStubber::new();
        assert_eq!(stubber.status, 200);
        assert_eq!(stubber.describe(), "ANY *");

        let stubber = stubber.method("get").path("/booking/1");
        assert_eq!(stubber.describe(), "GET /booking/1");
    }

    #[test]
    fn test_later_body_replaces_earlier() {
        let stubber = RequestStubber::new()
            .json_response(json!({"a": 1}))
            .text_response("plain");
        assert!(matches!(stubber.response_body, Some(StubBody::Text(ref s)) if s == "plain"));
    }
}
