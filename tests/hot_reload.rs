//! Route table reload tests: file watching, rejected reloads, startup failures
//! and traffic served across table generations.

use std::time::Duration;

use route_gateway::config::ConfigError;
use route_gateway::lifecycle::StartupError;
use serde_json::{json, Value};

mod common;

fn routes_to(echo: std::net::SocketAddr, extra_prefix: Option<&str>) -> String {
    let mut routes = vec![];
    if let Some(prefix) = extra_prefix {
        routes.push(json!({
            "name": "extra",
            "match": { "type": "prefix", "path": prefix },
            "target": { "baseUrl": format!("http://{}/extra", echo) },
            "rewrite": { "stripPrefix": prefix }
        }));
    }
    json!({
        "defaultTarget": { "baseUrl": format!("http://{}/default", echo) },
        "routes": routes
    })
    .to_string()
}

async fn wait_for_generation(gw: &common::TestGateway, generation: u64) -> bool {
    for _ in 0..100 {
        if gw.gateway.routes().current().generation() >= generation {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    false
}

#[tokio::test]
async fn test_file_change_is_picked_up() {
    let echo = common::start_echo_backend().await;
    let gw = common::start_gateway(&routes_to(echo, None)).await;
    let client = common::client();

    let seen: Value = client.get(gw.url("/new/x")).send().await.unwrap().json().await.unwrap();
    assert_eq!(seen["path"], "/default/new/x");

    gw.write_routes(&routes_to(echo, Some("/new")));
    assert!(wait_for_generation(&gw, 2).await, "watcher should publish generation 2");

    let seen: Value = client.get(gw.url("/new/x")).send().await.unwrap().json().await.unwrap();
    assert_eq!(seen["path"], "/extra/x");
}

#[tokio::test]
async fn test_reload_signal_without_watcher() {
    let echo = common::start_echo_backend().await;
    let gw = common::start_gateway_with(&routes_to(echo, None), |s| s.reload.watch = false).await;

    gw.write_routes(&routes_to(echo, Some("/svc")));
    gw.gateway.request_reload();
    assert!(wait_for_generation(&gw, 2).await);

    let seen: Value = common::client()
        .get(gw.url("/svc/items"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(seen["path"], "/extra/items");
}

#[tokio::test]
async fn test_malformed_reload_keeps_previous_table() {
    let echo = common::start_echo_backend().await;
    let gw = common::start_gateway_with(&routes_to(echo, Some("/auth")), |s| s.reload.watch = false).await;

    for broken in [
        "{ \"defaultTarget\": ",
        "[]",
        r#"{ "routes": [] }"#,
        r#"{ "defaultTarget": { "baseUrl": "http://127.0.0.1:1" },
             "routes": [ { "name": "x", "match": { "type": "regex", "path": "/x" },
                           "target": { "baseUrl": "http://127.0.0.1:1" } } ] }"#,
    ] {
        gw.write_routes(broken);
        gw.gateway.request_reload();
        tokio::time::sleep(Duration::from_millis(200)).await;

        let table = gw.gateway.routes().current();
        assert_eq!(table.generation(), 1, "rejected file must not be published");
        assert_eq!(table.routes()[0].name(), "extra");

        let seen: Value = common::client()
            .get(gw.url("/auth/login"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(seen["path"], "/extra/login");
    }
}

#[tokio::test]
async fn test_malformed_startup_config_is_fatal() {
    let result = common::try_start_gateway_with("{ not json", |_| {}).await;
    assert!(matches!(
        result,
        Err(StartupError::Config(ConfigError::Parse(_)))
    ));

    let result = common::try_start_gateway_with(&json!({ "routes": [] }).to_string(), |_| {}).await;
    assert!(matches!(
        result,
        Err(StartupError::Config(ConfigError::MissingField(_)))
    ));
}

#[tokio::test]
async fn test_missing_route_file_is_fatal() {
    let result = common::try_start_gateway_with(&common::default_only("http://127.0.0.1:1"), |s| {
        s.routes_path = "/nonexistent/routes.json".to_string();
    })
    .await;
    assert!(matches!(result, Err(StartupError::Config(ConfigError::Io { .. }))));
}

#[tokio::test]
async fn test_requests_during_reloads_see_whole_tables() {
    let echo = common::start_echo_backend().await;
    let gw = common::start_gateway_with(&routes_to(echo, None), |s| s.reload.watch = false).await;
    let with_route = routes_to(echo, Some("/flip"));
    let without_route = routes_to(echo, None);

    let url = gw.url("/flip/a");
    let requests: Vec<_> = (0..40)
        .map(|_| {
            let url = url.clone();
            tokio::spawn(async move {
                let client = common::client();
                let mut paths = Vec::new();
                for _ in 0..5 {
                    let res = client.get(&url).send().await.unwrap();
                    assert_eq!(res.status(), 200);
                    let seen: Value = res.json().await.unwrap();
                    paths.push(seen["path"].as_str().unwrap().to_string());
                }
                paths
            })
        })
        .collect();

    for i in 0..10 {
        gw.write_routes(if i % 2 == 0 { &with_route } else { &without_route });
        gw.gateway.request_reload();
        tokio::time::sleep(Duration::from_millis(70)).await;
    }

    for request in requests {
        for path in request.await.unwrap() {
            // Each exchange is served entirely by one generation.
            assert!(
                path == "/extra/a" || path == "/default/flip/a",
                "unexpected upstream path {}",
                path
            );
        }
    }
}
