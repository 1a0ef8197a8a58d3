//! Proxy passthrough against real sockets.

use std::time::Duration;

use axum::http::StatusCode;
use tokio::net::TcpListener;

use mock_server::{HandlerRegistry, MockServer, Shutdown};

mod common;
use common::BackendReply;

/// Serve the mock on an ephemeral port and return its base URL.
async fn serve(toml: &str) -> (String, Shutdown) {
    let server = MockServer::new(common::config(toml), HandlerRegistry::new()).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();

    let handle = shutdown.clone();
    tokio::spawn(async move {
        let _ = server.run(listener, handle).await;
    });

    (format!("http://{}", addr), shutdown)
}

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

#[tokio::test]
async fn forwards_request_and_merges_metadata() {
    let backend = common::start_programmable_backend(|method, target| async move {
        BackendReply {
            status: 201,
            headers: vec![
                ("X-Upstream", "yes".to_string()),
                ("X-Mock", "from-upstream".to_string()),
                ("Set-Cookie", "upstream=1".to_string()),
            ],
            body: format!("{} {}", method, target),
        }
    })
    .await;

    let (base, shutdown) = serve(&format!(
        r#"
        [[endpoints]]
        path = "/api/{{*rest}}"
        method = "POST"
        proxy = "http://{backend}/v1"
        status = 202
        headers = {{ "X-Mock" = "drafted", "X-Only-Mock" = "kept" }}
        cookies = {{ session = "abc" }}
        "#
    ))
    .await;

    let res = client()
        .post(format!("{}/api/orders/9?expand=items", base))
        .body("payload")
        .send()
        .await
        .expect("mock server unreachable");

    assert_eq!(res.status(), StatusCode::CREATED);
    assert_eq!(res.headers()["x-upstream"], "yes");
    assert_eq!(res.headers()["x-mock"], "from-upstream");
    assert_eq!(res.headers()["x-only-mock"], "kept");
    let cookies: Vec<_> = res
        .headers()
        .get_all("set-cookie")
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect();
    assert!(cookies.contains(&"session=abc; Path=/".to_string()));
    assert!(cookies.contains(&"upstream=1".to_string()));

    assert_eq!(res.text().await.unwrap(), "POST /v1/api/orders/9?expand=items");
    shutdown.trigger();
}

#[tokio::test]
async fn unreachable_upstream_is_bad_gateway_with_metadata() {
    let dead = common::unused_addr().await;
    let (base, shutdown) = serve(&format!(
        r#"
        [[endpoints]]
        path = "/down"
        proxy = "http://{dead}"
        delay = 50
        status = 200
        headers = {{ "X-Mock" = "yes" }}
        cookies = {{ session = "abc" }}
        "#
    ))
    .await;

    let res = client().get(format!("{}/down", base)).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(res.headers()["x-mock"], "yes");
    assert_eq!(res.headers()["set-cookie"], "session=abc; Path=/");
    shutdown.trigger();
}

#[tokio::test]
async fn slow_upstream_is_gateway_timeout() {
    let backend = common::start_programmable_backend(|_, _| async {
        tokio::time::sleep(Duration::from_secs(5)).await;
        BackendReply {
            status: 200,
            headers: Vec::new(),
            body: "late".to_string(),
        }
    })
    .await;

    let (base, shutdown) = serve(&format!(
        r#"
        [timeouts]
        upstream_secs = 1

        [[endpoints]]
        path = "/slow"
        proxy = "http://{backend}"
        headers = {{ "X-Mock" = "yes" }}
        "#
    ))
    .await;

    let res = client().get(format!("{}/slow", base)).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(res.headers()["x-mock"], "yes");
    shutdown.trigger();
}
