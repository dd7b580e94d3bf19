mod common;

use axum::http::StatusCode;
use common::{build_app, product, product_ids};

#[tokio::test]
async fn empty_catalog_returns_empty_success_page() {
    let app = build_app();
    let (status, body) = app.get("/api/v1/products?sort=latest&page=0&size=20").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["result"], "SUCCESS");
    assert_eq!(body["data"]["products"].as_array().unwrap().len(), 0);
    assert_eq!(body["data"]["hasMore"], false);
}

#[tokio::test]
async fn latest_orders_by_created_at_then_id_descending() {
    let app = build_app();
    app.seed_catalog();

    let (status, body) = app.get("/api/v1/products?sort=latest&size=10").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(product_ids(&body), vec![5, 4, 3, 2, 1]);
}

#[tokio::test]
async fn price_asc_breaks_ties_by_ascending_id() {
    let app = build_app();
    app.seed_catalog();

    let (_, body) = app.get("/api/v1/products?sort=price_asc&size=10").await;
    // Products 2 and 3 share price 100; the lower id comes first.
    assert_eq!(product_ids(&body), vec![2, 3, 4, 1, 5]);

    let prices: Vec<i64> = body["data"]["products"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["price"].as_i64().unwrap())
        .collect();
    assert!(prices.windows(2).all(|w| w[0] <= w[1]));
}

#[tokio::test]
async fn likes_desc_breaks_ties_by_descending_id() {
    let app = build_app();
    app.seed_catalog();

    let (_, body) = app.get("/api/v1/products?sort=likes_desc&size=10").await;
    // Products 1 and 3 share 5 likes, 4 and 5 share none; higher id wins ties.
    assert_eq!(product_ids(&body), vec![3, 1, 2, 5, 4]);

    let counts: Vec<i64> = body["data"]["products"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["likeCount"].as_i64().unwrap())
        .collect();
    assert!(counts.windows(2).all(|w| w[0] >= w[1]));
}

#[tokio::test]
async fn omitted_sort_defaults_to_latest() {
    let app = build_app();
    app.seed_catalog();

    let (status, body) = app.get("/api/v1/products?size=10").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(product_ids(&body), vec![5, 4, 3, 2, 1]);
}

#[tokio::test]
async fn pagination_truncates_to_size_and_reports_has_more() {
    let app = build_app();
    for id in 1..=25 {
        app.repos.seed_product(product(id, 1, id * 10, 0));
    }

    let (_, body) = app.get("/api/v1/products?sort=price_asc&page=0&size=10").await;
    assert_eq!(body["data"]["products"].as_array().unwrap().len(), 10);
    assert_eq!(body["data"]["hasMore"], true);

    let (_, body) = app.get("/api/v1/products?sort=price_asc&page=2&size=10").await;
    assert_eq!(body["data"]["products"].as_array().unwrap().len(), 5);
    assert_eq!(body["data"]["hasMore"], false);
}

#[tokio::test]
async fn brand_filter_returns_only_that_brand() {
    let app = build_app();
    app.seed_catalog();

    let (status, body) = app.get("/api/v1/products?brandId=1&size=10").await;
    assert_eq!(status, StatusCode::OK);
    let items = body["data"]["products"].as_array().unwrap();
    assert_eq!(items.len(), 3);
    assert!(items.iter().all(|p| p["brandId"] == 1));
    assert!(items.iter().all(|p| p["brandName"] == "acme"));
}

#[tokio::test]
async fn unknown_brand_yields_empty_page_not_error() {
    let app = build_app();
    app.seed_catalog();

    let (status, body) = app.get("/api/v1/products?brandId=999&size=10").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["result"], "SUCCESS");
    assert_eq!(body["data"]["products"].as_array().unwrap().len(), 0);
    assert_eq!(body["data"]["hasMore"], false);
}

#[tokio::test]
async fn unknown_sort_is_a_bad_request() {
    let app = build_app();
    let (status, body) = app.get("/api/v1/products?sort=popularity").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["meta"]["result"], "FAIL");
    assert_eq!(body["meta"]["errorCode"], "BAD_REQUEST");
}

#[tokio::test]
async fn disallowed_page_size_is_a_bad_request() {
    let app = build_app();
    let (status, body) = app.get("/api/v1/products?size=15").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["meta"]["errorCode"], "BAD_REQUEST");
}

#[tokio::test]
async fn product_detail_round_trip_and_404() {
    let app = build_app();
    app.seed_catalog();

    let (status, body) = app.get("/api/v1/products/3").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], 3);
    assert_eq!(body["data"]["brandName"], "umbrella");
    assert_eq!(body["data"]["likeCount"], 5);

    let (status, body) = app.get("/api/v1/products/404").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["meta"]["errorCode"], "NOT_FOUND");
}

#[tokio::test]
async fn like_registration_is_idempotent_over_the_wire() {
    let app = build_app();
    app.seed_catalog();
    app.signup("user1").await;

    let (status, body) = app.like(4, "user1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["likeCount"], 1);

    // A client retry must look identical and never double count.
    let (status, body) = app.like(4, "user1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["likeCount"], 1);

    assert_eq!(app.repos.product(4).unwrap().like_count, 1);
}

#[tokio::test]
async fn two_users_liking_the_same_product_both_count() {
    let app = build_app();
    app.repos.seed_product(product(5, 1, 100, 0));
    app.signup("user1").await;
    app.signup("user2").await;

    let (status, body) = app.like(5, "user1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["likeCount"], 1);

    let (status, body) = app.like(5, "user2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["likeCount"], 2);
}

#[tokio::test]
async fn like_on_unknown_product_is_404_never_5xx() {
    let app = build_app();
    app.signup("user1").await;

    let (status, body) = app.like(404, "user1").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["meta"]["errorCode"], "NOT_FOUND");
}

#[tokio::test]
async fn like_without_user_header_is_a_bad_request() {
    let app = build_app();
    app.seed_catalog();

    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/api/v1/like/products/1")
        .body(axum::body::Body::empty())
        .unwrap();
    let (status, body) = app.send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["meta"]["result"], "FAIL");
}

#[tokio::test]
async fn like_from_unknown_user_is_404() {
    let app = build_app();
    app.seed_catalog();

    let (status, _) = app.like(1, "ghost").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unlike_removes_the_like_and_is_idempotent() {
    let app = build_app();
    app.seed_catalog();
    app.signup("user1").await;

    app.like(4, "user1").await;
    let (status, body) = app.unlike(4, "user1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["likeCount"], 0);

    let (status, body) = app.unlike(4, "user1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["likeCount"], 0);
}

#[tokio::test]
async fn liked_products_list_most_recent_first_with_brand_names() {
    let app = build_app();
    app.seed_catalog();
    app.signup("user1").await;

    app.like(2, "user1").await;
    app.like(3, "user1").await;
    app.like(1, "user1").await;

    let (status, body) = app.liked_products("user1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["result"], "SUCCESS");
    assert_eq!(product_ids(&body), vec![1, 3, 2]);
    assert_eq!(body["data"]["products"][0]["brandName"], "acme");

    // Cancelling a like drops it from the list.
    app.unlike(3, "user1").await;
    let (_, body) = app.liked_products("user1").await;
    assert_eq!(product_ids(&body), vec![1, 2]);
}

#[tokio::test]
async fn liked_products_without_any_likes_is_404() {
    let app = build_app();
    app.seed_catalog();
    app.signup("user1").await;

    let (status, body) = app.liked_products("user1").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["meta"]["result"], "FAIL");
    assert_eq!(body["meta"]["errorCode"], "NOT_FOUND");
}

#[tokio::test]
async fn liked_products_without_user_header_is_a_bad_request() {
    let app = build_app();
    app.seed_catalog();

    let request = axum::http::Request::builder()
        .uri("/api/v1/like/products")
        .body(axum::body::Body::empty())
        .unwrap();
    let (status, body) = app.send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["meta"]["result"], "FAIL");
}

#[tokio::test]
async fn malformed_query_values_fail_with_the_envelope() {
    let app = build_app();
    let (status, body) = app.get("/api/v1/products?size=abc").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["meta"]["result"], "FAIL");
    assert_eq!(body["meta"]["errorCode"], "BAD_REQUEST");
}

#[tokio::test]
async fn signup_round_trip_and_duplicate_conflict() {
    let app = build_app();

    let (status, body) = app.signup("alice").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["result"], "SUCCESS");
    assert_eq!(body["data"]["loginId"], "alice");
    assert_eq!(body["data"]["gender"], "F");

    let (status, body) = app.signup("alice").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["meta"]["errorCode"], "CONFLICT");
}

#[tokio::test]
async fn signup_validation_rejects_bad_fields() {
    let app = build_app();

    let (status, _) = app
        .post_json(
            "/api/v1/users",
            serde_json::json!({
                "loginId": "not-allowed!",
                "email": "a@example.com",
                "birthDate": "1995-04-03",
                "gender": "M",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post_json(
            "/api/v1/users",
            serde_json::json!({
                "loginId": "bob",
                "email": "a@example.com",
                "birthDate": "yesterday",
                "gender": "M",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post_json(
            "/api/v1/users",
            serde_json::json!({
                "loginId": "bob",
                "email": "a@example.com",
                "birthDate": "1995-04-03",
                "gender": "X",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn health_endpoint_reports_up() {
    let app = build_app();
    let (status, body) = app.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["result"], "SUCCESS");
}
