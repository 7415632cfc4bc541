use bookrunner::mock_server::{stub_slow_response, stub_with_required_header, RequestStubber};
use bookrunner::{ApiRequest, HttpMethod, HttpTransport, ResponseTimeValidator, RestClient};
use serde_json::json;
use std::time::Duration;
use wiremock::MockServer;

fn rest() -> RestClient {
    RestClient::new(Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_request_matching_on_query_and_body() {
    let server = MockServer::start().await;
    RequestStubber::new()
        .method("post")
        .path("/booking")
        .query_param("source", "smoke")
        .json_body(json!({"firstname": "Sally"}))
        .status(200)
        .response_header("X-Stub", "matched")
        .json_response(json!({"bookingid": 3}))
        .stub(&server)
        .await;

    let client = rest();
    let matched = client
        .send(
            ApiRequest::new(HttpMethod::POST, format!("{}/booking?source=smoke", server.uri()))
                .json_body(&json!({"firstname": "Sally"})),
        )
        .await
        .unwrap();
    assert_eq!(matched.status_code, 200);
    assert_eq!(matched.header("x-stub"), Some("matched"));
    assert!(matched.header("content-type").unwrap_or_default().contains("application/json"));
    assert_eq!(matched.json().unwrap()["bookingid"], 3);

    let unmatched = client
        .send(
            ApiRequest::new(HttpMethod::POST, format!("{}/booking", server.uri()))
                .json_body(&json!({"firstname": "Sally"})),
        )
        .await
        .unwrap();
    assert_eq!(unmatched.status_code, 404);
}

#[tokio::test]
async fn test_text_body_and_limited_times() {
    let server = MockServer::start().await;
    RequestStubber::new()
        .method("PUT")
        .path("/notes")
        .text_body("hello")
        .text_response("stored")
        .times(1)
        .stub(&server)
        .await;

    let client = rest();
    let send = || client.send(ApiRequest::new(HttpMethod::PUT, format!("{}/notes", server.uri())).text_body("hello"));

    let first = send().await.unwrap();
    assert_eq!(first.status_code, 200);
    assert_eq!(first.text(), "stored");

    let second = send().await.unwrap();
    assert_eq!(second.status_code, 404);
}

#[tokio::test]
async fn test_required_header_falls_back_to_unauthorized() {
    let server = MockServer::start().await;
    stub_with_required_header(&server, "DELETE", "/booking/1", "Cookie", "token=abc123", 201).await;

    let client = rest();
    let url = format!("{}/booking/1", server.uri());

    let authorized = client
        .send(ApiRequest::new(HttpMethod::DELETE, url.clone()).header("Cookie", "token=abc123"))
        .await
        .unwrap();
    assert_eq!(authorized.status_code, 201);

    let anonymous = client.send(ApiRequest::new(HttpMethod::DELETE, url)).await.unwrap();
    assert_eq!(anonymous.status_code, 401);
    assert_eq!(anonymous.json().unwrap(), json!({"error": "Unauthorized"}));
}

#[tokio::test]
async fn test_slow_response_is_delayed() {
    let server = MockServer::start().await;
    stub_slow_response(&server, "GET", "/booking", Duration::from_millis(300), json!([])).await;

    let response = rest()
        .send(ApiRequest::new(HttpMethod::GET, format!("{}/booking", server.uri())))
        .await
        .unwrap();

    assert_eq!(response.status_code, 200);
    assert!(response.duration >= Duration::from_millis(300));
    assert!(ResponseTimeValidator::assert_within(&response, 100).is_err());
}

#[tokio::test]
async fn test_request_timeout_against_slow_stub() {
    let server = MockServer::start().await;
    stub_slow_response(&server, "GET", "/slow", Duration::from_secs(2), json!({})).await;

    let result = rest()
        .send(
            ApiRequest::new(HttpMethod::GET, format!("{}/slow", server.uri())).timeout(Duration::from_millis(200)),
        )
        .await;

    assert!(matches!(result, Err(bookrunner::TransportError::Timeout { .. })));
}

#[tokio::test]
async fn test_repeated_response_headers_are_joined() {
    let server = MockServer::start().await;
    RequestStubber::new()
        .method("POST")
        .path("/auth")
        .response_header("Set-Cookie", "token=abc123")
        .response_header("Set-Cookie", "session=42")
        .json_response(json!({"token": "abc123"}))
        .stub(&server)
        .await;

    let response = rest()
        .send(ApiRequest::new(HttpMethod::POST, format!("{}/auth", server.uri())))
        .await
        .unwrap();

    assert_eq!(response.status_code, 200);
    assert_eq!(response.header("set-cookie"), Some("token=abc123, session=42"));
}
