//! Shutdown drain behavior of the HTTP server loop.

use std::time::{Duration, Instant};

use axum::Router;
use axum::routing::get;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;

async fn stall() -> &'static str {
    tokio::time::sleep(Duration::from_secs(60)).await;
    "late"
}

#[tokio::test]
async fn shutdown_does_not_wait_past_the_grace_period() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = Router::new().route("/stall", get(stall));

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let server = tokio::spawn(mercato::infra::http::serve(
        listener,
        router,
        Duration::from_millis(200),
        async move {
            let _ = shutdown_rx.await;
        },
    ));

    // Park a request on the stalling handler so a connection stays open
    // across the shutdown signal.
    let mut conn = TcpStream::connect(addr).await.unwrap();
    conn.write_all(b"GET /stall HTTP/1.1\r\nHost: localhost\r\n\r\n")
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let started = Instant::now();
    shutdown_tx.send(()).unwrap();
    let result = tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .expect("server did not stop within the grace period");
    result.unwrap().unwrap();
    assert!(started.elapsed() >= Duration::from_millis(200));

    drop(conn);
}
