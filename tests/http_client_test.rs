//! HTTP client and end-to-end run tests against a local mock server

use std::sync::Arc;

use serde_json::json;
use wiremock::{
    matchers::{header, method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

use paramsweep::app::{Config, HttpConfig};
use paramsweep::fuzzer::generators::ListGenerator;
use paramsweep::fuzzer::{
    CancelToken, Enumerator, FuzzResultSet, Fuzzer, FuzzerConfig, ParameterSet, ParamCategory,
    Registry,
};
use paramsweep::http::{HttpClient, RequestExecutor, RequestTemplate};
use paramsweep::{FuzzError, HttpError};

fn config_for(server: &MockServer, document: serde_json::Value) -> Config {
    let address = server.address();
    let mut document = document;
    document["host"] = json!(address.ip().to_string());
    document["port"] = json!(address.port());

    let mut config: Config = serde_json::from_value(document).unwrap();
    config.validate().unwrap();
    config
}

fn template_for(server: &MockServer, path: &str) -> RequestTemplate {
    let address = server.address();
    let host = address.ip().to_string();
    RequestTemplate::new("http", &host, &address.to_string(), path)
}

#[tokio::test]
async fn test_request_carries_every_parameter_category() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/42"))
        .and(query_param("page", "3"))
        .and(header("x-api-version", "2"))
        .and(header("cookie", "session=abc"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("x-request-id", "r-1")
                .set_body_string("Success"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut params = ParameterSet::new();
    params.set(ParamCategory::Path, "id", "42".to_string());
    params.set(ParamCategory::Url, "page", "3".to_string());
    params.set(ParamCategory::Header, "X-Api-Version", "2".to_string());
    params.set(ParamCategory::Cookie, "session", "abc".to_string());

    let request = template_for(&mock_server, "/users/{id}")
        .build(&params, 0)
        .unwrap();

    let client = HttpClient::new(&HttpConfig::default()).unwrap();
    let response = client.execute(&request).await.unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.body_text(), "Success");
    assert_eq!(response.size, 7);
    assert_eq!(response.header("x-request-id"), Some("r-1"));
}

#[tokio::test]
async fn test_error_status_is_a_response_not_a_failure() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&mock_server)
        .await;

    let request = template_for(&mock_server, "/")
        .build(&ParameterSet::new(), 0)
        .unwrap();

    let client = HttpClient::new(&HttpConfig::default()).unwrap();
    let response = client.execute(&request).await.unwrap();

    assert_eq!(response.status, 500);
    assert!(response.is_server_error());
}

#[tokio::test]
async fn test_response_body_capture_is_bounded() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("x".repeat(64)))
        .mount(&mock_server)
        .await;

    let request = template_for(&mock_server, "/")
        .build(&ParameterSet::new(), 0)
        .unwrap();

    let client = HttpClient::new(&HttpConfig {
        max_response_size: 16,
        ..Default::default()
    })
    .unwrap();
    let response = client.execute(&request).await.unwrap();

    assert_eq!(response.size, 64);
    assert_eq!(response.body.len(), 16);
}

#[tokio::test]
async fn test_large_body_is_counted_but_not_kept() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![b'x'; 256 * 1024]))
        .mount(&mock_server)
        .await;

    let request = template_for(&mock_server, "/")
        .build(&ParameterSet::new(), 0)
        .unwrap();

    let client = HttpClient::new(&HttpConfig {
        max_response_size: 1000,
        ..Default::default()
    })
    .unwrap();
    let response = client.execute(&request).await.unwrap();

    assert_eq!(response.size, 256 * 1024);
    assert_eq!(response.body.len(), 1000);
    assert!(response.body.iter().all(|b| *b == b'x'));
}

#[tokio::test]
async fn test_sanitized_cookie_reaches_server() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(header("cookie", "session=\"abc admin=1\""))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut params = ParameterSet::new();
    params.set(ParamCategory::Cookie, "session", "abc;\n admin=1".to_string());
    let request = template_for(&mock_server, "/").build(&params, 0).unwrap();

    let client = HttpClient::new(&HttpConfig::default()).unwrap();
    let response = client.execute(&request).await.unwrap();
    assert_eq!(response.status, 200);
}

#[tokio::test]
async fn test_closed_port_is_a_connection_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let address = listener.local_addr().unwrap();
    drop(listener);

    let request = RequestTemplate::new("http", "127.0.0.1", &address.to_string(), "/")
        .build(&ParameterSet::new(), 0)
        .unwrap();

    let client = HttpClient::new(&HttpConfig::default()).unwrap();
    let result = client.execute(&request).await;

    assert!(
        matches!(result, Err(HttpError::ConnectionError(_))),
        "expected connection error, got {:?}",
        result
    );
}

#[tokio::test]
async fn test_full_run_against_server() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/items"))
        .and(query_param("id", "2"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/items"))
        .respond_with(ResponseTemplate::new(200).set_body_string("item"))
        .mount(&mock_server)
        .await;

    let config = config_for(
        &mock_server,
        json!({
            "path": "items",
            "url-params": {
                "id": [{ "increment": { "start": 1, "stop": 3, "step": 1 } }]
            },
            "header-params": {
                "X-Mode": [{ "list": ["a", "b"] }]
            }
        }),
    );
    assert_eq!(config.path, "/items");

    let registry = Registry::from_config(&config).unwrap();
    let enumerator = Enumerator::new(registry, RequestTemplate::from_config(&config));
    assert_eq!(enumerator.planned_requests(), 4);

    let client = HttpClient::new(&config.http).unwrap();
    let fuzzer = Fuzzer::new(FuzzerConfig { max_concurrent: 2 }, Arc::new(client));

    let mut results = FuzzResultSet::new();
    let summary = fuzzer
        .run(enumerator, CancelToken::new(), |outcome| {
            results.add_outcome(outcome)
        })
        .await
        .unwrap();
    results.finalize();

    assert_eq!(summary.completed, 4);
    assert_eq!(mock_server.received_requests().await.unwrap().len(), 4);

    let statuses: Vec<(u64, u16)> = results
        .results
        .iter()
        .map(|r| (r.seq, r.status_code))
        .collect();
    assert_eq!(statuses, vec![(0, 200), (1, 404), (2, 200), (3, 200)]);

    let interesting: Vec<u64> = results.interesting_results().iter().map(|r| r.seq).collect();
    assert_eq!(interesting, vec![1]);
}

#[tokio::test]
async fn test_unreachable_target_ends_run() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let address = listener.local_addr().unwrap();
    drop(listener);

    let mut registry = Registry::new();
    registry.bind(
        ParamCategory::Url,
        "q",
        Box::new(ListGenerator::from_values(vec!["1".into(), "2".into()])),
    );

    let enumerator = Enumerator::new(
        registry,
        RequestTemplate::new("http", "127.0.0.1", &address.to_string(), "/"),
    );
    let client = HttpClient::new(&HttpConfig::default()).unwrap();
    let fuzzer = Fuzzer::new(FuzzerConfig { max_concurrent: 1 }, Arc::new(client));

    let mut failures = 0;
    let result = fuzzer
        .run(enumerator, CancelToken::new(), |outcome| {
            if outcome.is_error() {
                failures += 1;
            }
        })
        .await;

    assert!(matches!(result, Err(FuzzError::Transport { seq: 0, .. })));
    assert_eq!(failures, 1);
}
