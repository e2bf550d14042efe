//! Tests for the gateway against a local HTTP server.

use futures::StreamExt;
use pretty_assertions::assert_eq;
use request_gateway::{CallState, Gateway, GatewayConfig, GatewayError, TransportError};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Debug, Deserialize, PartialEq)]
struct User {
    id: u32,
    name: String,
}

fn gateway_for(server: &MockServer) -> Gateway {
    Gateway::new(GatewayConfig::new(server.uri()).unwrap()).unwrap()
}

#[tokio::test]
async fn test_get_sends_query_and_yields_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users"))
        .and(query_param("active", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1}])))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = gateway_for(&server);
    let mut stream = gateway.get::<Value>("/users", Some(json!({"active": true})));

    let first = stream.next().await.unwrap().unwrap();
    assert_eq!(first, json!([{"id": 1}]));
    assert!(stream.next().await.is_none());
    assert_eq!(stream.state(), CallState::Succeeded);
}

async fn received_query(query: Value) -> Vec<(String, String)> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/u"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = gateway_for(&server);
    gateway.get::<Value>("/u", Some(query)).single().await.unwrap().unwrap();

    let received = server.received_requests().await.unwrap();
    received[0]
        .url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

fn pairs(expected: &[(&str, &str)]) -> Vec<(String, String)> {
    expected
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[tokio::test]
async fn test_query_skips_null_values() {
    let query = received_query(json!({"a": null, "b": 1})).await;
    assert_eq!(query, pairs(&[("b", "1")]));
}

#[tokio::test]
async fn test_query_repeats_array_items() {
    let query = received_query(json!({"ids": [1, 2]})).await;
    assert_eq!(query, pairs(&[("ids[]", "1"), ("ids[]", "2")]));
}

#[tokio::test]
async fn test_query_brackets_nested_objects() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("f[x]", "1"))
        .and(query_param("f[tag]", "new"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = gateway_for(&server);
    let result = gateway
        .get::<Value>("/u", Some(json!({"f": {"x": 1, "tag": "new"}})))
        .single()
        .await
        .unwrap();

    assert_eq!(result.unwrap(), json!([]));
}

#[tokio::test]
async fn test_text_body_read_as_string() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/greeting"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/plain")
                .set_body_string("hello"),
        )
        .expect(2)
        .mount(&server)
        .await;

    let gateway = gateway_for(&server);
    let text = gateway.get::<String>("/greeting", None).single().await.unwrap();
    let value = gateway.get::<Value>("/greeting", None).single().await.unwrap();

    assert_eq!(text.unwrap(), "hello");
    assert_eq!(value.unwrap(), json!("hello"));
}

#[tokio::test]
async fn test_post_sends_body_without_query() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/users"))
        .and(body_json(json!({"name": "Ana"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 2, "name": "Ana"})))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = gateway_for(&server);
    let user = gateway
        .post::<User>("/users", json!({"name": "Ana"}), None)
        .single()
        .await
        .unwrap()
        .unwrap();

    assert_eq!(
        user,
        User {
            id: 2,
            name: "Ana".to_string()
        }
    );

    let received = server.received_requests().await.unwrap();
    assert_eq!(received[0].url.query(), None);
}

#[tokio::test]
async fn test_put_sends_body_and_query() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/users/7"))
        .and(query_param("notify", "false"))
        .and(body_json(json!({"name": "Bea"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 7, "name": "Bea"})))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = gateway_for(&server);
    let user = gateway
        .put::<User>("users/7", json!({"name": "Bea"}), Some(json!({"notify": false})))
        .single()
        .await
        .unwrap()
        .unwrap();

    assert_eq!(user.id, 7);
}

#[tokio::test]
async fn test_delete_with_empty_response() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/users/5"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = gateway_for(&server);
    let result = gateway.delete::<()>("/users/5", None).single().await.unwrap();

    assert!(result.is_ok());
}

#[tokio::test]
async fn test_non_success_status_is_single_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such thing"))
        .mount(&server)
        .await;

    let gateway = gateway_for(&server);
    let mut stream = gateway.get::<Value>("/missing", None);

    match stream.next().await {
        Some(Err(GatewayError::Status { status, body })) => {
            assert_eq!(status, 404);
            assert_eq!(body, "no such thing");
        }
        other => panic!("Expected status error, got {:?}", other),
    }
    assert!(stream.next().await.is_none());
    assert_eq!(stream.state(), CallState::Failed);
}

#[tokio::test]
async fn test_network_failure_is_forwarded() {
    let gateway = Gateway::new(GatewayConfig::new("http://127.0.0.1:1").unwrap()).unwrap();

    let mut stream = gateway.patch::<Value>("/users/5", json!({"name": "X"}), None);

    let first = stream.next().await.unwrap();
    assert!(matches!(
        first,
        Err(GatewayError::Transport(TransportError::Connection { .. }))
    ));
    assert!(stream.next().await.is_none());
}

#[tokio::test]
async fn test_nothing_sent_before_first_poll() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let gateway = gateway_for(&server);
    let mut stream = gateway.get::<Value>("/lazy", None);
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert!(server.received_requests().await.unwrap().is_empty());

    stream.next().await.unwrap().unwrap();
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_each_clone_sends_its_own_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ping"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!("pong")))
        .expect(2)
        .mount(&server)
        .await;

    let gateway = gateway_for(&server);
    let stream = gateway.get::<String>("/ping", None);
    let again = stream.clone();

    assert_eq!(stream.single().await.unwrap().unwrap(), "pong");
    assert_eq!(again.single().await.unwrap().unwrap(), "pong");
}

#[tokio::test]
async fn test_unsubscribe_while_in_flight() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let gateway = gateway_for(&server);
    let mut stream = gateway.delete::<Value>("/users/5", None);

    assert!(futures::poll!(stream.next()).is_pending());
    assert_eq!(stream.state(), CallState::InFlight);

    stream.cancel();

    assert_eq!(stream.state(), CallState::Cancelled);
    assert!(stream.next().await.is_none());
}

#[tokio::test]
async fn test_default_headers_are_sent() {
    let server = MockServer::start().await;
    Mock::given(header("x-client", "gateway"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(2)
        .mount(&server)
        .await;

    let config = GatewayConfig::builder()
        .base_url(server.uri())
        .header("x-client", "gateway")
        .build()
        .unwrap();
    let gateway = Gateway::new(config).unwrap();

    gateway.get::<Value>("/a", None).single().await.unwrap().unwrap();
    gateway
        .post::<Value>("/b", json!({}), None)
        .single()
        .await
        .unwrap()
        .unwrap();
}

async fn cookie_header_after_login(send_credentials: bool) -> Option<String> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "session=abc; Path=/")
                .set_body_json(json!({})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let config = GatewayConfig::builder()
        .base_url(server.uri())
        .send_credentials(send_credentials)
        .build()
        .unwrap();
    let gateway = Gateway::new(config).unwrap();

    gateway
        .post::<Value>("/login", json!({"user": "ana"}), None)
        .single()
        .await
        .unwrap()
        .unwrap();
    gateway.get::<Value>("/me", None).single().await.unwrap().unwrap();

    let received = server.received_requests().await.unwrap();
    received[1]
        .headers
        .get("cookie")
        .map(|v| v.to_str().unwrap_or_default().to_string())
}

#[tokio::test]
async fn test_credentials_mode_replays_cookies() {
    let cookie = cookie_header_after_login(true).await;
    assert_eq!(cookie.as_deref(), Some("session=abc"));
}

#[tokio::test]
async fn test_cookies_ignored_without_credentials_mode() {
    assert_eq!(cookie_header_after_login(false).await, None);
}

#[tokio::test]
async fn test_absolute_path_bypasses_base() {
    let other = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!("up")))
        .expect(1)
        .mount(&other)
        .await;

    let gateway = Gateway::new(GatewayConfig::new("http://127.0.0.1:1/api").unwrap()).unwrap();
    let status = gateway
        .get::<String>(format!("{}/health", other.uri()), None)
        .single()
        .await
        .unwrap()
        .unwrap();

    assert_eq!(status, "up");
}
