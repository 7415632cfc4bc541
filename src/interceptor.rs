//! Correlation ids, timing, and logging around every request

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::configuration::Configuration;
use crate::error::TransportError;
use crate::transport::{ApiRequest, ApiResponse, HttpMethod, HttpTransport, CORRELATION_ID_HEADER};

const MAX_LOGGED_BODY_CHARS: usize = 1000;

/// A request that has been sent but has not returned yet
#[derive(Debug, Clone)]
pub struct RequestInfo {
    pub request_id: String,
    pub correlation_id: String,
    pub method: HttpMethod,
    pub url: String,
    pub started_at: DateTime<Utc>,
}

/// Transport decorator adding correlation ids and request/response logging
pub struct RequestResponseInterceptor {
    inner: Arc<dyn HttpTransport>,
    in_flight: Mutex<HashMap<String, RequestInfo>>,
    logging_enabled: bool,
    slow_threshold: Duration,
}

impl RequestResponseInterceptor {
    pub fn new(inner: Arc<dyn HttpTransport>) -> Self {
        Self {
            inner,
            in_flight: Mutex::new(HashMap::new()),
            logging_enabled: true,
            slow_threshold: Duration::from_millis(2000),
        }
    }

    pub fn from_configuration(inner: Arc<dyn HttpTransport>, config: &Configuration) -> Self {
        Self::new(inner)
            .with_logging(config.logging_enabled)
            .with_slow_threshold(Duration::from_millis(config.slow_request_threshold_ms))
    }

    /// When disabled only warnings are emitted
    pub fn with_logging(mut self, enabled: bool) -> Self {
        self.logging_enabled = enabled;
        self
    }

    pub fn with_slow_threshold(mut self, threshold: Duration) -> Self {
        self.slow_threshold = threshold;
        self
    }

    /// Snapshot of requests currently awaiting a response
    pub fn in_flight(&self) -> Vec<RequestInfo> {
        self.in_flight.lock().values().cloned().collect()
    }

    pub fn clear_state(&self) {
        self.in_flight.lock().clear();
    }

}

/// Removes the in-flight entry when dropped, including when the send future is cancelled
struct InFlightGuard<'a> {
    in_flight: &'a Mutex<HashMap<String, RequestInfo>>,
    request_id: String,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.in_flight.lock().remove(&self.request_id);
    }
}

#[async_trait]
impl HttpTransport for RequestResponseInterceptor {
    async fn send(&self, mut request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let request_id = Uuid::new_v4().to_string();

        let correlation_id = match request.header_value(CORRELATION_ID_HEADER) {
            Some(existing) => existing.to_string(),
            None => {
                request
                    .headers
                    .insert(CORRELATION_ID_HEADER.to_string(), request_id.clone());
                request_id.clone()
            }
        };

        let info = RequestInfo {
            request_id: request_id.clone(),
            correlation_id: correlation_id.clone(),
            method: request.method,
            url: request.url.clone(),
            started_at: Utc::now(),
        };
        self.in_flight.lock().insert(request_id.clone(), info.clone());
        let guard = InFlightGuard {
            in_flight: &self.in_flight,
            request_id,
        };

        if self.logging_enabled {
            log::debug!("Starting API request [{}]: {} {}", correlation_id, info.method, info.url);
        }

        let start = Instant::now();
        let result = self.inner.send(request).await;
        let elapsed = start.elapsed();
        drop(guard);

        let mut response = match result {
            Ok(response) => response,
            Err(e) => {
                log::warn!(
                    "API request [{}] failed after {}ms: {} {}: {}",
                    correlation_id,
                    elapsed.as_millis(),
                    info.method,
                    info.url,
                    e
                );
                return Err(e);
            }
        };

        response.duration = elapsed;
        response.correlation_id = Some(correlation_id.clone());

        if self.logging_enabled {
            log::debug!(
                "API response [{}]: Status {} ({}ms): {} {}",
                correlation_id,
                response.status_code,
                elapsed.as_millis(),
                info.method,
                info.url
            );
        }

        if !response.is_success() {
            let body = if response.body.is_empty() {
                "No body".to_string()
            } else {
                truncate_body(&response.text())
            };
            log::warn!(
                "Non-successful API response [{}]: {} - {}",
                correlation_id,
                response.status_code,
                body
            );
        }

        if elapsed > self.slow_threshold {
            log::warn!(
                "Slow API response [{}]: {}ms exceeds {}ms: {} {}",
                correlation_id,
                elapsed.as_millis(),
                self.slow_threshold.as_millis(),
                info.method,
                info.url
            );
        }

        Ok(response)
    }
}

/// Cut bodies longer than 1000 characters down to 997 plus `...`
pub fn truncate_body(body: &str) -> String {
    if body.chars().count() <= MAX_LOGGED_BODY_CHARS {
        return body.to_string();
    }
    let mut truncated: String = body.chars().take(MAX_LOGGED_BODY_CHARS - 3).collect();
    truncated.push_str("...");
    truncated
}
