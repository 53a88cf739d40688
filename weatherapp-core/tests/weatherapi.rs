use std::sync::Arc;

use serde_json::json;
use std::time::Duration;

use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpListener,
};
use weatherapp_core::{
    ControllerOptions, IncompletePolicy, LOAD_FAILED, ProviderError, ProviderReply,
    ResponseOrdering, ResultState, WeatherController, WeatherProvider,
    provider::weatherapi::WeatherApiProvider,
};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path, query_param},
};

fn london_body() -> serde_json::Value {
    json!({
        "location": {
            "name": "London",
            "region": "City of London, Greater London",
            "country": "UK",
            "localtime_epoch": 1704103200,
            "localtime": "2024-01-01 10:00"
        },
        "current": {
            "temp_c": 5.0,
            "humidity": 80,
            "wind_kph": 10.1,
            "uv": 1.0,
            "precip_mm": 0.0,
            "condition": {
                "text": "Cloudy",
                "icon": "//cdn.weatherapi.com/weather/64*64/day/119.png",
                "code": 1006
            }
        }
    })
}

fn provider_for(server: &MockServer) -> WeatherApiProvider {
    WeatherApiProvider::with_base_url("TEST_KEY".to_string(), &server.uri())
}

#[tokio::test]
async fn sends_key_and_query_and_decodes_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/current.json"))
        .and(query_param("key", "TEST_KEY"))
        .and(query_param("q", "London"))
        .respond_with(ResponseTemplate::new(200).set_body_json(london_body()))
        .expect(1)
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let reply = provider.current("London").await.expect("request should succeed");

    let payload = match reply {
        ProviderReply::Body(payload) => payload,
        other => panic!("expected a decoded body, got {other:?}"),
    };
    assert_eq!(payload.location.name, "London");
    assert_eq!(payload.location.country, "UK");
    assert_eq!(payload.current.temp_c, "5.0");
    assert_eq!(payload.current.humidity, "80");
    assert_eq!(
        payload.current.condition.icon_url(),
        "https://cdn.weatherapi.com/weather/256*256/day/119.png"
    );
}

#[tokio::test]
async fn non_success_status_is_reported_not_raised() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/current.json"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {"code": 1006, "message": "No matching location found."}
        })))
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let reply = provider.current("Atlantis").await.expect("status is not a transport error");

    assert_eq!(reply, ProviderReply::Status(400));
}

#[tokio::test]
async fn blank_success_body_is_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/current.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("  \n"))
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let reply = provider.current("London").await.expect("request should succeed");

    assert_eq!(reply, ProviderReply::Empty);
}

#[tokio::test]
async fn null_success_body_is_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/current.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("null"))
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let reply = provider.current("London").await.expect("null is not a malformed payload");

    assert_eq!(reply, ProviderReply::Empty);
}

#[tokio::test]
async fn status_is_reported_when_error_body_breaks_off() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind local port");
    let addr = listener.local_addr().expect("local address");

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.expect("accept connection");
        let mut request = [0u8; 1024];
        let _ = socket.read(&mut request).await;
        // Promise more body than is sent, then hang up.
        let response = b"HTTP/1.1 503 Service Unavailable\r\ncontent-length: 100\r\n\r\npartial";
        let _ = socket.write_all(response).await;
    });

    let base_url = format!("http://{addr}");
    let provider = WeatherApiProvider::with_base_url("TEST_KEY".to_string(), &base_url);
    let reply = provider.current("London").await.expect("status must win over body read");

    assert_eq!(reply, ProviderReply::Status(503));
}

#[tokio::test]
async fn malformed_body_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/current.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"location\": 42}"))
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let err = provider.current("London").await.unwrap_err();

    assert!(matches!(err, ProviderError::Decode(_)), "unexpected error: {err}");
}

#[tokio::test]
async fn unreachable_host_is_a_transport_error() {
    // Nothing listens on the discard port.
    let provider = WeatherApiProvider::with_base_url("TEST_KEY".to_string(), "http://127.0.0.1:9");
    let err = provider.current("London").await.unwrap_err();

    assert!(matches!(err, ProviderError::Transport(_)), "unexpected error: {err}");
}

#[tokio::test]
async fn controller_publishes_success_from_http() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/current.json"))
        .and(query_param("q", "London"))
        .respond_with(ResponseTemplate::new(200).set_body_json(london_body()))
        .mount(&server)
        .await;

    let ctrl = WeatherController::new(
        Arc::new(provider_for(&server)),
        ControllerOptions::default(),
    );
    let mut watcher = ctrl.subscribe();

    ctrl.fetch("London");
    assert_eq!(ctrl.current(), Some(ResultState::Loading));

    let state = watcher.wait_for_terminal().await.expect("controller is alive");
    let payload = state.success().expect("fetch should succeed");
    assert_eq!(payload.location.localtime, "2024-01-01 10:00");
}

#[tokio::test]
async fn controller_hides_decode_detail() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/current.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let ctrl = WeatherController::new(
        Arc::new(provider_for(&server)),
        ControllerOptions::default(),
    );
    let mut watcher = ctrl.subscribe();

    ctrl.fetch("London");
    assert_eq!(
        watcher.wait_for_terminal().await,
        Some(ResultState::Error(LOAD_FAILED.to_string()))
    );
}

#[tokio::test]
async fn null_body_stays_loading_in_compat_mode() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/current.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("null"))
        .expect(1)
        .mount(&server)
        .await;

    let ctrl = WeatherController::new(
        Arc::new(provider_for(&server)),
        ControllerOptions {
            on_incomplete: IncompletePolicy::StayLoading,
            ordering: ResponseOrdering::LastResolver,
        },
    );
    let mut watcher = ctrl.subscribe();

    ctrl.fetch("London");
    let waited =
        tokio::time::timeout(Duration::from_millis(500), watcher.wait_for_terminal()).await;

    assert!(waited.is_err(), "no terminal state expected, got {waited:?}");
    assert_eq!(ctrl.current(), Some(ResultState::Loading));
}

#[tokio::test]
async fn null_body_fails_as_empty_by_default() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/current.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("null"))
        .mount(&server)
        .await;

    let ctrl = WeatherController::new(
        Arc::new(provider_for(&server)),
        ControllerOptions::default(),
    );
    let mut watcher = ctrl.subscribe();

    ctrl.fetch("London");
    assert_eq!(
        watcher.wait_for_terminal().await,
        Some(ResultState::Error("Weather service returned an empty response".to_string()))
    );
}
