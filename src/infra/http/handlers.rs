use axum::Json;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use time::Date;
use time::macros::format_description;

use crate::application::catalog::ProductListQuery;
use crate::application::repos::NewUser;
use crate::domain::catalog::ProductSort;
use crate::domain::user::{Gender, User};

use super::AppState;
use super::error::ApiError;
use super::extract::ApiQuery;
use super::models::*;

const USER_ID_HEADER: &str = "X-USER-ID";
const DEFAULT_PAGE_SIZE: u32 = 20;

pub async fn list_products(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<ProductListParams>,
) -> Result<impl IntoResponse, ApiError> {
    let sort = ProductSort::parse(params.sort.as_deref())
        .map_err(|err| ApiError::bad_request(err.to_string()))?;

    let page = state
        .catalog
        .list_products(ProductListQuery {
            sort,
            brand_id: params.brand_id,
            page: params.page.unwrap_or(0),
            size: params.size.unwrap_or(DEFAULT_PAGE_SIZE),
        })
        .await?;

    Ok(Json(Envelope::success(ProductListData::from(page))))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(product_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let summary = state.catalog.get_product(product_id).await?;
    Ok(Json(Envelope::success(ProductItem::from(summary))))
}

pub async fn register_like(
    State(state): State<AppState>,
    Path(product_id): Path<i64>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let user = resolve_user(&state, &headers).await?;
    let outcome = state.likes.register_like(product_id, user.id).await?;
    // Created and AlreadyExists both acknowledge with 200; retries must
    // look identical to the client.
    Ok(Json(Envelope::success(LikeData {
        product_id,
        like_count: outcome.like_count(),
    })))
}

pub async fn liked_products(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let user = resolve_user(&state, &headers).await?;
    let summaries = state.likes.liked_products(user.id).await?;
    Ok(Json(Envelope::success(LikedProductsData {
        products: summaries.into_iter().map(ProductItem::from).collect(),
    })))
}

pub async fn cancel_like(
    State(state): State<AppState>,
    Path(product_id): Path<i64>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let user = resolve_user(&state, &headers).await?;
    let outcome = state.likes.cancel_like(product_id, user.id).await?;
    Ok(Json(Envelope::success(LikeData {
        product_id,
        like_count: outcome.like_count(),
    })))
}

pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let gender =
        Gender::from_code(&payload.gender).map_err(|err| ApiError::bad_request(err.to_string()))?;
    let format = format_description!("[year]-[month]-[day]");
    let birth_date = Date::parse(&payload.birth_date, &format)
        .map_err(|_| ApiError::bad_request("invalid birthDate, expected YYYY-MM-DD"))?;

    let user = state
        .users
        .signup(NewUser {
            login_id: payload.login_id,
            email: payload.email,
            birth_date,
            gender,
        })
        .await?;

    Ok(Json(Envelope::success(UserData::from(user))))
}

pub async fn health() -> impl IntoResponse {
    Json(Envelope::success(serde_json::json!({ "status": "UP" })))
}

async fn resolve_user(state: &AppState, headers: &HeaderMap) -> Result<User, ApiError> {
    let login_id = headers
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| ApiError::bad_request("missing X-USER-ID header"))?;

    state
        .users
        .find_by_login(login_id)
        .await?
        .ok_or_else(|| ApiError::not_found("user not found"))
}
