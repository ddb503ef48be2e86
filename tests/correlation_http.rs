//! End-to-end tests over a real listener.

use std::sync::Arc;
use std::time::Duration;

use correlation_api::http::X_CORRELATION_ID;
use correlation_api::{HttpServer, ServiceConfig, TracingLogService};
use uuid::Uuid;

mod common;

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

fn server() -> HttpServer {
    HttpServer::new(ServiceConfig::default(), Arc::new(TracingLogService::new()))
}

#[tokio::test]
async fn test_supplied_correlation_id_is_echoed() {
    let (addr, shutdown, handle) = common::spawn_server(server()).await;

    let res = client()
        .get(format!("http://{}/api/v1/test", addr))
        .header(X_CORRELATION_ID, "abc-123")
        .send()
        .await
        .expect("server unreachable");

    assert_eq!(res.status(), 200);
    assert_eq!(res.headers()[X_CORRELATION_ID], "abc-123");
    assert_eq!(res.headers()["api-supported-versions"], "1.0, 2.0");
    assert_eq!(res.text().await.unwrap(), "Test API V1 is working!");

    shutdown.trigger();
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_generated_ids_are_unique_uuids() {
    let (addr, shutdown, handle) = common::spawn_server(server()).await;
    let client = client();

    let mut ids = Vec::new();
    for _ in 0..5 {
        let res = client
            .get(format!("http://{}/api/v2/test", addr))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 200);
        let id = res.headers()[X_CORRELATION_ID].to_str().unwrap().to_string();
        assert!(Uuid::parse_str(&id).is_ok(), "not a UUID: {}", id);
        ids.push(id);
    }
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 5);

    shutdown.trigger();
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_concurrent_clients_keep_their_ids() {
    let (addr, shutdown, handle) = common::spawn_server(server()).await;
    let client = client();

    let requests = (0..16).map(|i| {
        let client = client.clone();
        async move {
            let id = format!("client-{}", i);
            let res = client
                .get(format!("http://{}/api/v1/test", addr))
                .header(X_CORRELATION_ID, &id)
                .send()
                .await
                .unwrap();
            (id, res.headers()[X_CORRELATION_ID].to_str().unwrap().to_string())
        }
    });

    for (sent, received) in futures_util::future::join_all(requests).await {
        assert_eq!(sent, received);
    }

    shutdown.trigger();
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_shutdown_stops_server() {
    let (addr, shutdown, handle) = common::spawn_server(server()).await;
    assert_eq!(shutdown.trigger(), 1);

    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("server did not stop")
        .unwrap()
        .unwrap();

    let res = client()
        .get(format!("http://{}/api/v1/test", addr))
        .send()
        .await;
    assert!(res.is_err());
}
