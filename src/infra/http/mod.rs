//! HTTP surface: axum router, handlers, and the response envelope.

pub mod error;
pub mod extract;
pub mod handlers;
pub mod models;

use std::future::{Future, IntoFuture};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing::warn;

use crate::application::catalog::CatalogService;
use crate::application::likes::LikeService;
use crate::application::users::UserService;

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<CatalogService>,
    pub likes: Arc<LikeService>,
    pub users: Arc<UserService>,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/products", get(handlers::list_products))
        .route("/api/v1/products/{product_id}", get(handlers::get_product))
        .route("/api/v1/like/products", get(handlers::liked_products))
        .route(
            "/api/v1/like/products/{product_id}",
            post(handlers::register_like).delete(handlers::cancel_like),
        )
        .route("/api/v1/users", post(handlers::signup))
        .route("/health", get(handlers::health))
        .with_state(state)
}

/// Serve the router until `shutdown` resolves, then stop accepting and
/// drain in-flight requests for at most `grace` before returning.
pub async fn serve(
    listener: TcpListener,
    router: Router,
    grace: Duration,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let (signal_tx, signal_rx) = oneshot::channel::<()>();
    let server = axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            shutdown.await;
            let _ = signal_tx.send(());
        })
        .into_future();

    let server = std::pin::pin!(server);
    tokio::select! {
        result = server => result,
        _ = async {
            let _ = signal_rx.await;
            tokio::time::sleep(grace).await;
        } => {
            warn!(grace_secs = grace.as_secs_f64(), "drain deadline reached, dropping open connections");
            Ok(())
        }
    }
}
