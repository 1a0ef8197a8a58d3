//! End-to-end behavior of declared endpoints, driven through the router.

use std::time::Duration;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    response::Response,
    Router,
};
use tower::ServiceExt;
use uuid::Uuid;

use mock_server::{HandlerRegistry, MockServer};

mod common;

const CONFIG: &str = r#"
[[endpoints]]
path = "/users"
response = "user.json"

[[endpoints]]
path = "/page"
response = "page.html"

[[endpoints]]
path = "/notes"
response = "notes.txt"
headers = { "Content-Type" = "text/markdown" }

[[endpoints]]
path = "/health"
method = "put"
status = 204
headers = { "X-Mock" = "yes" }
cookies = { session = "abc123" }

[[endpoints]]
path = "/limited"
rate = 5

[[endpoints]]
path = "/slow"
delay = 200

[[endpoints]]
path = "/echo/:id"
method = "POST"
handler = "echo"
status = 201

[[endpoints]]
path = "/items"
cors = true

[[endpoints]]
path = "/items"
status = 500
"#;

fn server() -> MockServer {
    MockServer::new(common::config(CONFIG), HandlerRegistry::with_builtins()).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.unwrap()
}

async fn get(app: &Router, uri: &str) -> Response {
    send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

async fn body_json(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn json_template_renders_fresh_uuids() {
    let server = server();
    let app = server.router();

    let first = get(&app, "/users").await;
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(first.headers()[header::CONTENT_TYPE], "application/json");
    let first = body_json(first).await;
    let second = body_json(get(&app, "/users").await).await;

    let ids: Vec<Uuid> = [&first["id"], &first["requestId"], &second["id"]]
        .iter()
        .map(|v| Uuid::parse_str(v.as_str().unwrap()).unwrap())
        .collect();
    assert_ne!(ids[0], ids[1]);
    assert_ne!(ids[0], ids[2]);
    assert_eq!(first["name"], "Ada Lovelace");
    assert!(first["createdAt"].as_str().unwrap().ends_with('Z'));
}

#[tokio::test]
async fn text_responses_infer_content_type() {
    let app = server().router();

    let page = get(&app, "/page").await;
    assert_eq!(page.headers()[header::CONTENT_TYPE], "text/html; charset=utf-8");

    let notes = get(&app, "/notes").await;
    assert_eq!(notes.headers()[header::CONTENT_TYPE], "text/markdown");
    let bytes = axum::body::to_bytes(notes.into_body(), 1024).await.unwrap();
    assert_eq!(&bytes[..], b"plain text response\n");
}

#[tokio::test]
async fn no_content_carries_status_headers_and_cookies() {
    let app = server().router();
    let response = send(&app, Request::put("/health").body(Body::empty()).unwrap()).await;

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(response.headers()["x-mock"], "yes");
    assert_eq!(response.headers()[header::SET_COOKIE], "session=abc123; Path=/");
}

#[tokio::test]
async fn simulated_failure_keeps_metadata() {
    let server = server();
    server.simulation().set_fail_probability(1.0);
    let app = server.router();

    let response = send(&app, Request::put("/health").body(Body::empty()).unwrap()).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.headers()["x-mock"], "yes");
    assert!(response.headers().contains_key(header::SET_COOKIE));
    let bytes = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
    assert!(bytes.is_empty());

    server.simulation().set_fail_probability(0.0);
    let response = send(&app, Request::put("/health").body(Body::empty()).unwrap()).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test(start_paused = true)]
async fn rate_limit_rejects_sixth_request_in_window() {
    let app = server().router();

    for _ in 0..5 {
        assert_eq!(get(&app, "/limited").await.status(), StatusCode::OK);
    }
    let rejected = get(&app, "/limited").await;
    assert_eq!(rejected.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(rejected.headers().contains_key(header::RETRY_AFTER));

    tokio::time::advance(Duration::from_millis(1001)).await;
    assert_eq!(get(&app, "/limited").await.status(), StatusCode::OK);
}

#[tokio::test(start_paused = true)]
async fn delay_is_scaled_by_the_global_factor() {
    let server = server();
    let app = server.router();

    let start = tokio::time::Instant::now();
    get(&app, "/slow").await;
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_millis(200), "elapsed {:?}", elapsed);
    assert!(elapsed < Duration::from_millis(300), "elapsed {:?}", elapsed);

    server.simulation().set_delay_factor(2.0);
    let start = tokio::time::Instant::now();
    get(&app, "/slow").await;
    assert!(start.elapsed() >= Duration::from_millis(400));

    server.simulation().set_delay_factor(0.0);
    let start = tokio::time::Instant::now();
    get(&app, "/slow").await;
    assert!(start.elapsed() < Duration::from_millis(10));
}

#[tokio::test]
async fn echo_handler_sees_params_query_and_body() {
    let app = server().router();
    let request = Request::post("/ECHO/42?verbose=1")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"name":"ada"}"#))
        .unwrap();

    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let echoed = body_json(response).await;
    assert_eq!(echoed["params"]["id"], "42");
    assert_eq!(echoed["query"]["verbose"], "1");
    assert_eq!(echoed["body"]["name"], "ada");
}

#[tokio::test]
async fn path_params_reach_handlers_decoded() {
    let app = server().router();
    let response = send(&app, Request::post("/echo/a%20b").body(Body::empty()).unwrap()).await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let echoed = body_json(response).await;
    assert_eq!(echoed["params"]["id"], "a b");
}

#[tokio::test]
async fn malformed_json_body_is_rejected() {
    let app = server().router();
    let request = Request::post("/echo/1")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{oops"))
        .unwrap();

    assert_eq!(send(&app, request).await.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let mut config = common::config(CONFIG);
    config.security.max_body_size = 16;
    let app = MockServer::new(config, HandlerRegistry::with_builtins()).unwrap().router();

    let request = Request::post("/echo/1")
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from("x".repeat(64)))
        .unwrap();
    assert_eq!(send(&app, request).await.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn cors_preflight_and_simple_requests() {
    let app = server().router();

    let preflight = Request::builder()
        .method(Method::OPTIONS)
        .uri("/items")
        .header(header::ORIGIN, "http://localhost:5173")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "x-token")
        .body(Body::empty())
        .unwrap();
    let response = send(&app, preflight).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_HEADERS], "x-token");

    let simple = get(&app, "/items").await;
    assert_eq!(simple.status(), StatusCode::OK);
    assert_eq!(simple.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
}

#[tokio::test]
async fn duplicate_declarations_keep_the_first() {
    let app = server().router();
    assert_eq!(get(&app, "/items").await.status(), StatusCode::OK);
}

#[tokio::test]
async fn head_is_served_by_get_routes() {
    let app = server().router();
    let response = send(&app, Request::head("/page").body(Body::empty()).unwrap()).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn unknown_routes_and_methods_are_404() {
    let app = server().router();
    assert_eq!(get(&app, "/nope").await.status(), StatusCode::NOT_FOUND);

    let wrong_method = send(&app, Request::delete("/users").body(Body::empty()).unwrap()).await;
    assert_eq!(wrong_method.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn stage_order_is_fixed() {
    let server = server();
    let entries = server.routes().entries();

    let limited = entries.iter().find(|e| e.pattern().as_str() == "/limited").unwrap();
    assert_eq!(
        limited.pipeline().stage_names(),
        vec!["observe", "rate_limit", "parse_body", "metadata", "fail_simulation", "respond"]
    );

    let items = entries
        .iter()
        .find(|e| e.pattern().as_str() == "/items" && e.method() == Method::GET)
        .unwrap();
    assert_eq!(
        items.pipeline().stage_names(),
        vec!["observe", "cors", "parse_body", "metadata", "fail_simulation", "respond"]
    );
}

#[tokio::test]
async fn requests_feed_the_rate_tracker() {
    let server = server();
    let app = server.router();
    for _ in 0..3 {
        get(&app, "/page").await;
    }

    let rates = server.tracker().snapshot();
    let page = rates.iter().find(|r| r.path == "/page").unwrap();
    assert_eq!(page.count, 3);
    assert_eq!(page.method, "GET");
}
