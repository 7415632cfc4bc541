//! Typed operations against the booking API
//!
//! Every call returns the raw [`ApiResponse`]; status handling is left to the
//! caller so tests can assert on failures as easily as on successes.

use serde_json::Value;
use std::sync::Arc;
use url::Url;

use crate::endpoints::{self, AUTH_PATH, BOOKING_PATH, CONTENT_TYPE_JSON, HEADER_ACCEPT, PING_PATH};
use crate::error::{BookRunnerError, TransportError};
use crate::header_manager::HeaderManager;
use crate::payload::{AuthCredentials, Booking, BookingFilter};
use crate::transport::{ApiRequest, ApiResponse, HttpMethod, HttpTransport};

/// `GET /ping` answers 201 when the service is up
pub const HEALTHY_STATUS: u16 = 201;

pub struct BookingClient {
    transport: Arc<dyn HttpTransport>,
    base_url: String,
}

impl BookingClient {
    pub fn new(transport: Arc<dyn HttpTransport>, base_url: impl Into<String>) -> Self {
        Self {
            transport,
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        endpoints::join(&self.base_url, path)
    }

    fn json_headers() -> HeaderManager {
        let mut headers = HeaderManager::new();
        headers.add_content_type_json().add_accept_json();
        headers
    }

    fn with_token(token: &str) -> HeaderManager {
        let mut headers = Self::json_headers();
        headers.add_cookie("token", token);
        headers
    }

    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        log::debug!("{} {}", request.method, request.url);
        self.transport.send(request).await
    }

    pub async fn health_check(&self) -> Result<ApiResponse, TransportError> {
        self.send(ApiRequest::new(HttpMethod::GET, self.url(PING_PATH))).await
    }

    /// True when the ping endpoint answers with its healthy status
    pub async fn is_healthy(&self) -> bool {
        match self.health_check().await {
            Ok(response) => response.status_code == HEALTHY_STATUS,
            Err(e) => {
                log::warn!("Health check failed: {}", e);
                false
            }
        }
    }

    pub async fn create_token(&self, credentials: &AuthCredentials) -> Result<ApiResponse, BookRunnerError> {
        let body = serde_json::to_value(credentials)?;
        let request = ApiRequest::new(HttpMethod::POST, self.url(AUTH_PATH))
            .headers(Self::json_headers().headers())
            .json_body(&body);
        Ok(self.send(request).await?)
    }

    pub async fn create_booking(&self, booking: &Booking) -> Result<ApiResponse, BookRunnerError> {
        let body = serde_json::to_value(booking)?;
        let request = ApiRequest::new(HttpMethod::POST, self.url(BOOKING_PATH))
            .headers(Self::json_headers().headers())
            .json_body(&body);
        Ok(self.send(request).await?)
    }

    pub async fn get_booking(&self, id: u64) -> Result<ApiResponse, TransportError> {
        let request = ApiRequest::new(HttpMethod::GET, endpoints::booking_url(&self.base_url, id))
            .header(HEADER_ACCEPT, CONTENT_TYPE_JSON);
        self.send(request).await
    }

    pub async fn get_booking_ids(&self, filter: &BookingFilter) -> Result<ApiResponse, TransportError> {
        let mut url = Url::parse(&self.url(BOOKING_PATH))
            .map_err(|e| TransportError::InvalidUrl(format!("{}: {}", self.base_url, e)))?;

        let pairs = filter.query_pairs();
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }

        let request = ApiRequest::new(HttpMethod::GET, url.to_string()).header(HEADER_ACCEPT, CONTENT_TYPE_JSON);
        self.send(request).await
    }

    pub async fn update_booking(&self, id: u64, booking: &Booking, token: &str) -> Result<ApiResponse, BookRunnerError> {
        let body = serde_json::to_value(booking)?;
        let request = ApiRequest::new(HttpMethod::PUT, endpoints::booking_url(&self.base_url, id))
            .headers(Self::with_token(token).headers())
            .json_body(&body);
        Ok(self.send(request).await?)
    }

    pub async fn partial_update_booking(&self, id: u64, patch: &Value, token: &str) -> Result<ApiResponse, TransportError> {
        let request = ApiRequest::new(HttpMethod::PATCH, endpoints::booking_url(&self.base_url, id))
            .headers(Self::with_token(token).headers())
            .json_body(patch);
        self.send(request).await
    }

    pub async fn delete_booking(&self, id: u64, token: &str) -> Result<ApiResponse, TransportError> {
        let mut headers = HeaderManager::new();
        headers.add_cookie("token", token);

        let request = ApiRequest::new(HttpMethod::DELETE, endpoints::booking_url(&self.base_url, id))
            .headers(headers.headers());
        self.send(request).await
    }
}
