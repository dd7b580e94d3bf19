//! Wire models: the `{ meta, data }` envelope and request/response DTOs.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::application::catalog::{ProductPage, ProductSummary};
use crate::domain::user::User;

pub const RESULT_SUCCESS: &str = "SUCCESS";
pub const RESULT_FAIL: &str = "FAIL";

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    pub result: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub meta: Meta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    pub fn success(data: T) -> Self {
        Self {
            meta: Meta {
                result: RESULT_SUCCESS.to_string(),
                error_code: None,
                message: None,
            },
            data: Some(data),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductItem {
    pub id: i64,
    pub brand_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand_name: Option<String>,
    pub name: String,
    pub price: i64,
    pub like_count: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<ProductSummary> for ProductItem {
    fn from(summary: ProductSummary) -> Self {
        Self {
            id: summary.id,
            brand_id: summary.brand_id,
            brand_name: summary.brand_name,
            name: summary.name,
            price: summary.price,
            like_count: summary.like_count,
            created_at: summary.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductListData {
    pub products: Vec<ProductItem>,
    pub has_more: bool,
}

impl From<ProductPage> for ProductListData {
    fn from(page: ProductPage) -> Self {
        Self {
            products: page.items.into_iter().map(ProductItem::from).collect(),
            has_more: page.has_more,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikedProductsData {
    pub products: Vec<ProductItem>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeData {
    pub product_id: i64,
    pub like_count: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductListParams {
    pub sort: Option<String>,
    pub brand_id: Option<i64>,
    pub page: Option<u32>,
    pub size: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub login_id: String,
    pub email: String,
    /// ISO 8601 calendar date, e.g. `1995-04-03`.
    pub birth_date: String,
    /// Gender code, `M` or `F`.
    pub gender: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserData {
    pub id: i64,
    pub login_id: String,
    pub email: String,
    pub birth_date: String,
    pub gender: String,
}

impl From<User> for UserData {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            login_id: user.login_id,
            email: user.email,
            birth_date: user.birth_date.to_string(),
            gender: user.gender.code().to_string(),
        }
    }
}
