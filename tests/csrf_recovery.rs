mod support;

use offerdesk_client::TokenStore;
use serde_json::{json, Value};
use support::{signed_in_backends, token_response, FRESH_ACCESS, ROTATED_REFRESH, STALE_ACCESS};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CSRF_PATH: &str = "/auth/csrf";

#[tokio::test]
async fn first_403_primes_and_retries_once() {
    let server = MockServer::start().await;

    // First hit is rejected; the retry (after priming) goes through.
    Mock::given(method("POST"))
        .and(path("/offers"))
        .respond_with(ResponseTemplate::new(403))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/offers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 12 })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(CSRF_PATH))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let (backends, _store) = signed_in_backends(&server);
    let created: Value = backends
        .panel
        .post_json("/offers", &json!({ "client_id": 3 }))
        .await
        .expect("403 then prime then retry should succeed");

    assert_eq!(created, json!({ "id": 12 }));
    server.verify().await;
}

#[tokio::test]
async fn second_403_propagates_unmodified() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/offers"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(CSRF_PATH))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let (backends, _store) = signed_in_backends(&server);
    let response = backends
        .panel
        .send(reqwest::Method::GET, "/offers")
        .await
        .expect("a persistent 403 is handed back, not retried again");

    assert_eq!(response.status().as_u16(), 403);
    server.verify().await;
}

#[tokio::test]
async fn priming_failure_propagates_to_the_caller() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/offers"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(CSRF_PATH))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let (backends, _store) = signed_in_backends(&server);
    let err = backends
        .panel
        .get_json::<Value>("/offers")
        .await
        .expect_err("a failed priming call cannot recover the request");

    assert_eq!(err.code(), offerdesk_client::codes::HTTP_STATUS);
    assert!(err.message().contains("csrf"), "got {err}");
}

// A single request may spend both one-shot budgets across its lifetime:
// 403 -> prime -> retry -> 401 -> refresh -> retry -> 200.
#[tokio::test]
async fn csrf_and_auth_budgets_are_independent() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/report"))
        .respond_with(ResponseTemplate::new(403))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/report"))
        .and(header("authorization", format!("Bearer {STALE_ACCESS}").as_str()))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/report"))
        .and(header("authorization", format!("Bearer {FRESH_ACCESS}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "rows": [1, 2] })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(CSRF_PATH))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/token/refresh"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(token_response(FRESH_ACCESS, ROTATED_REFRESH)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (backends, store) = signed_in_backends(&server);
    let report: Value = backends
        .panel
        .get_json("/report")
        .await
        .expect("each recovery path gets one shot");

    assert_eq!(report, json!({ "rows": [1, 2] }));
    assert_eq!(store.access_token().as_deref(), Some(FRESH_ACCESS));
    server.verify().await;
}
