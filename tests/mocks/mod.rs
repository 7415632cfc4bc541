use async_trait::async_trait;
use bookrunner::{ApiRequest, ApiResponse, HttpTransport, TransportError};
use mockall::mock;

// Mock transport for exercising decorators and clients without a network
mock! {
    pub Transport {}

    #[async_trait]
    impl HttpTransport for Transport {
        async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError>;
    }
}

/// JSON response with the content type the booking API sends
pub fn json_response(status: u16, body: serde_json::Value) -> ApiResponse {
    ApiResponse::new(status, body.to_string()).with_header("Content-Type", "application/json; charset=utf-8")
}
