//! Shared harness: an axum router wired to in-memory repositories.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::Value;
use time::OffsetDateTime;
use time::macros::datetime;
use tower::ServiceExt;

use mercato::application::brands::BrandDirectory;
use mercato::application::catalog::{CatalogService, CatalogSettings};
use mercato::application::likes::LikeService;
use mercato::application::users::UserService;
use mercato::cache::{CacheStore, MemoryCache};
use mercato::domain::catalog::Product;
use mercato::infra::http::{AppState, build_router};
use mercato::infra::memory::MemoryRepositories;
use mercato::resilience::{BreakerSettings, DependencyGuard, GuardSettings};

pub const BASE_TS: OffsetDateTime = datetime!(2026-05-01 09:00 UTC);

pub fn test_guard_settings() -> GuardSettings {
    GuardSettings {
        timeout: Duration::from_millis(500),
        max_attempts: 2,
        backoff_base: Duration::from_millis(1),
        breaker: BreakerSettings {
            failure_threshold: 3,
            cooldown: Duration::from_millis(100),
        },
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub repos: MemoryRepositories,
}

pub fn build_app() -> TestApp {
    build_app_with_cache(Arc::new(MemoryCache::new()))
}

pub fn build_app_with_cache(cache: Arc<dyn CacheStore>) -> TestApp {
    let repos = MemoryRepositories::new();
    let settings = CatalogSettings::default();
    let counter_ttl = settings.counter_ttl;
    let guards = test_guard_settings();

    let brands = Arc::new(BrandDirectory::new(
        Arc::new(repos.clone()),
        Arc::new(DependencyGuard::new("brand-db", guards)),
    ));
    let state = AppState {
        catalog: Arc::new(CatalogService::new(
            Arc::new(repos.clone()),
            Arc::clone(&brands),
            cache.clone(),
            Arc::new(DependencyGuard::new("catalog-db", guards)),
            settings,
        )),
        likes: Arc::new(LikeService::new(
            Arc::new(repos.clone()),
            brands,
            cache,
            Arc::new(DependencyGuard::new("like-db", guards)),
            counter_ttl,
        )),
        users: Arc::new(UserService::new(
            Arc::new(repos.clone()),
            Arc::new(DependencyGuard::new("user-db", guards)),
        )),
    };

    TestApp {
        router: build_router(state.clone()),
        state,
        repos,
    }
}

pub fn product(id: i64, brand_id: i64, price: i64, like_count: i64) -> Product {
    Product {
        id,
        brand_id,
        name: format!("product-{id}"),
        price,
        like_count,
        created_at: BASE_TS + time::Duration::minutes(id),
    }
}

impl TestApp {
    pub fn seed_catalog(&self) {
        self.repos.seed_brand(1, "acme");
        self.repos.seed_brand(2, "umbrella");
        self.repos.seed_product(product(1, 1, 300, 5));
        self.repos.seed_product(product(2, 1, 100, 2));
        self.repos.seed_product(product(3, 2, 100, 5));
        self.repos.seed_product(product(4, 2, 200, 0));
        self.repos.seed_product(product(5, 1, 400, 0));
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        self.send(request).await
    }

    pub async fn post_json(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    pub async fn like(&self, product_id: i64, login_id: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(format!("/api/v1/like/products/{product_id}"))
            .header("X-USER-ID", login_id)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    pub async fn liked_products(&self, login_id: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .uri("/api/v1/like/products")
            .header("X-USER-ID", login_id)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    pub async fn unlike(&self, product_id: i64, login_id: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("DELETE")
            .uri(format!("/api/v1/like/products/{product_id}"))
            .header("X-USER-ID", login_id)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    pub async fn signup(&self, login_id: &str) -> (StatusCode, Value) {
        self.post_json(
            "/api/v1/users",
            serde_json::json!({
                "loginId": login_id,
                "email": format!("{login_id}@example.com"),
                "birthDate": "1995-04-03",
                "gender": "F",
            }),
        )
        .await
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }
}

pub fn product_ids(body: &Value) -> Vec<i64> {
    body["data"]["products"]
        .as_array()
        .expect("products array")
        .iter()
        .map(|item| item["id"].as_i64().unwrap())
        .collect()
}
