use async_trait::async_trait;
use reqwest::{Client, ClientBuilder, Method, Response};
use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::configuration::Configuration;
use crate::error::TransportError;
use crate::transport::{ApiRequest, ApiResponse, HttpMethod, HttpTransport};

/// reqwest-backed [`HttpTransport`] with connection pooling
#[derive(Debug, Clone)]
pub struct RestClient {
    client: Client,
    default_timeout: Duration,
}

impl RestClient {
    /// Build a client with the given default timeout
    pub fn new(default_timeout: Duration) -> Result<Self, TransportError> {
        let client = ClientBuilder::new()
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(30))
            .timeout(default_timeout)
            .tcp_keepalive(Duration::from_secs(60))
            .user_agent(format!("bookrunner/{}", env!("CARGO_PKG_VERSION")))
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| TransportError::ConnectionFailed(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, default_timeout })
    }

    pub fn from_configuration(config: &Configuration) -> Result<Self, TransportError> {
        Self::new(Duration::from_secs(config.request_timeout_secs))
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    fn convert_method(method: HttpMethod) -> Method {
        match method {
            HttpMethod::GET => Method::GET,
            HttpMethod::POST => Method::POST,
            HttpMethod::PUT => Method::PUT,
            HttpMethod::PATCH => Method::PATCH,
            HttpMethod::DELETE => Method::DELETE,
            HttpMethod::HEAD => Method::HEAD,
            HttpMethod::OPTIONS => Method::OPTIONS,
        }
    }

    /// Response headers keyed by lower-cased name, repeated values joined with ", "
    fn extract_headers(response: &Response) -> HashMap<String, String> {
        let mut headers: HashMap<String, String> = HashMap::new();
        for (name, value) in response.headers() {
            if let Ok(value_str) = value.to_str() {
                headers
                    .entry(name.as_str().to_ascii_lowercase())
                    .and_modify(|existing| {
                        existing.push_str(", ");
                        existing.push_str(value_str);
                    })
                    .or_insert_with(|| value_str.to_string());
            }
        }
        headers
    }
}

#[async_trait]
impl HttpTransport for RestClient {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let url = reqwest::Url::parse(&request.url)
            .map_err(|e| TransportError::InvalidUrl(format!("{}: {}", request.url, e)))?;

        let timeout = request.timeout.unwrap_or(self.default_timeout);
        let mut req_builder = self
            .client
            .request(Self::convert_method(request.method), url)
            .timeout(timeout);

        for (key, value) in &request.headers {
            req_builder = req_builder.header(key, value);
        }

        if let Some(body) = request.body {
            req_builder = req_builder.body(body);
        }

        let start_time = Instant::now();
        let response = req_builder.send().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout { timeout }
            } else if e.is_connect() {
                TransportError::ConnectionFailed(e.to_string())
            } else {
                TransportError::NetworkError(e.to_string())
            }
        })?;

        let status_code = response.status().as_u16();
        if response.status().is_client_error() || response.status().is_server_error() {
            log::debug!("HTTP error status: {}", status_code);
        }

        let headers = Self::extract_headers(&response);
        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::NetworkError(format!("Failed to read response body: {}", e)))?
            .to_vec();

        Ok(ApiResponse {
            status_code,
            headers,
            body,
            duration: start_time.elapsed(),
            correlation_id: None,
        })
    }
}
