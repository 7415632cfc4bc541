mod mocks;

use bookrunner::{
    ApiRequest, ApiResponse, HttpMethod, HttpTransport, RequestResponseInterceptor, TransportError,
    CORRELATION_ID_HEADER,
};
use mocks::{json_response, MockTransport};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_correlation_id_added_when_absent() {
    let mut transport = MockTransport::new();
    transport
        .expect_send()
        .withf(|request: &ApiRequest| {
            request
                .header_value(CORRELATION_ID_HEADER)
                .map(|id| uuid::Uuid::parse_str(id).is_ok())
                .unwrap_or(false)
        })
        .times(1)
        .returning(|_| Ok(json_response(200, json!({"ok": true}))));

    let interceptor = RequestResponseInterceptor::new(Arc::new(transport));
    let response = interceptor
        .send(ApiRequest::new(HttpMethod::GET, "http://localhost/booking"))
        .await
        .unwrap();

    let correlation_id = response.correlation_id.expect("correlation id recorded");
    assert!(uuid::Uuid::parse_str(&correlation_id).is_ok());
    assert!(interceptor.in_flight().is_empty());
}

#[tokio::test]
async fn test_existing_correlation_id_is_kept() {
    let mut transport = MockTransport::new();
    transport
        .expect_send()
        .withf(|request: &ApiRequest| request.header_value("x-correlation-id") == Some("trace-42"))
        .times(1)
        .returning(|_| Ok(json_response(201, json!({}))));

    let interceptor = RequestResponseInterceptor::new(Arc::new(transport));
    let request = ApiRequest::new(HttpMethod::POST, "http://localhost/booking").header("X-Correlation-ID", "trace-42");
    let response = interceptor.send(request).await.unwrap();

    assert_eq!(response.correlation_id.as_deref(), Some("trace-42"));
}

#[tokio::test]
async fn test_errors_pass_through_and_clear_state() {
    let mut transport = MockTransport::new();
    transport
        .expect_send()
        .times(1)
        .returning(|request| Err(TransportError::ConnectionFailed(request.url)));

    let interceptor = RequestResponseInterceptor::new(Arc::new(transport)).with_logging(false);
    let result = interceptor
        .send(ApiRequest::new(HttpMethod::DELETE, "http://localhost/booking/1"))
        .await;

    assert!(matches!(result, Err(TransportError::ConnectionFailed(url)) if url == "http://localhost/booking/1"));
    assert!(interceptor.in_flight().is_empty());
}

#[tokio::test]
async fn test_non_success_responses_are_returned() {
    let mut transport = MockTransport::new();
    transport
        .expect_send()
        .returning(|_| Ok(json_response(404, json!({"reason": "Not Found"}))));

    let interceptor =
        RequestResponseInterceptor::new(Arc::new(transport)).with_slow_threshold(Duration::from_millis(0));
    let response = interceptor
        .send(ApiRequest::new(HttpMethod::GET, "http://localhost/booking/99"))
        .await
        .unwrap();

    assert_eq!(response.status_code, 404);
    assert!(!response.is_success());
}

#[tokio::test]
async fn test_concurrent_requests_get_distinct_ids() {
    let mut transport = MockTransport::new();
    transport
        .expect_send()
        .times(8)
        .returning(|_| Ok(json_response(200, json!({}))));

    let interceptor = Arc::new(RequestResponseInterceptor::new(Arc::new(transport)));
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let interceptor = interceptor.clone();
            tokio::spawn(async move {
                interceptor
                    .send(ApiRequest::new(HttpMethod::GET, format!("http://localhost/booking/{}", i)))
                    .await
                    .unwrap()
                    .correlation_id
                    .unwrap()
            })
        })
        .collect();

    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap());
    }
    ids.sort();
    ids.dedup();

    assert_eq!(ids.len(), 8);
    assert!(interceptor.in_flight().is_empty());
}

/// Never answers within any reasonable test timeout
struct StalledTransport;

#[async_trait::async_trait]
impl HttpTransport for StalledTransport {
    async fn send(&self, _request: ApiRequest) -> Result<ApiResponse, TransportError> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(ApiResponse::new(200, ""))
    }
}

#[tokio::test]
async fn test_cancelled_request_leaves_no_in_flight_entry() {
    let interceptor = Arc::new(RequestResponseInterceptor::new(Arc::new(StalledTransport)));

    let pending = {
        let interceptor = interceptor.clone();
        tokio::spawn(async move {
            interceptor
                .send(ApiRequest::new(HttpMethod::GET, "http://localhost/booking/1"))
                .await
        })
    };

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(interceptor.in_flight().len(), 1);

    pending.abort();
    assert!(pending.await.unwrap_err().is_cancelled());
    assert!(interceptor.in_flight().is_empty());

    let timed_out = tokio::time::timeout(
        Duration::from_millis(20),
        interceptor.send(ApiRequest::new(HttpMethod::GET, "http://localhost/booking/2")),
    )
    .await;
    assert!(timed_out.is_err());
    assert!(interceptor.in_flight().is_empty());
}
