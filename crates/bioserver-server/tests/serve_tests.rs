//! Shutdown behaviour of `api::serve`

use std::sync::Arc;
use std::time::Duration;

use axum::{routing::get, Router};
use bioserver_server::api;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Notify;

#[tokio::test]
async fn test_serve_returns_once_signalled_without_connections() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let app = Router::new().route("/", get(|| async { "ok" }));

    let result = tokio::time::timeout(
        Duration::from_secs(5),
        api::serve(listener, app, std::future::ready(()), Duration::from_secs(30)),
    )
    .await;

    assert!(matches!(result, Ok(Ok(()))));
}

#[tokio::test]
async fn test_drain_timeout_bounds_shutdown() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let in_flight = Arc::new(Notify::new());
    let handler_started = in_flight.clone();
    let app = Router::new().route(
        "/slow",
        get(move || {
            let started = handler_started.clone();
            async move {
                started.notify_one();
                tokio::time::sleep(Duration::from_secs(60)).await;
                "done"
            }
        }),
    );

    // Accepted from the backlog once serving starts
    let mut client = TcpStream::connect(addr).await.unwrap();
    client
        .write_all(b"GET /slow HTTP/1.1\r\nHost: localhost\r\n\r\n")
        .await
        .unwrap();

    let signal = async move { in_flight.notified().await };

    let result = tokio::time::timeout(
        Duration::from_secs(10),
        api::serve(listener, app, signal, Duration::from_millis(200)),
    )
    .await;

    assert!(matches!(result, Ok(Ok(()))));
    drop(client);
}
