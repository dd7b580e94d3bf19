//! Repository traits describing persistence adapters.

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::catalog::{Brand, Product, ProductSort};
use crate::domain::user::{Gender, User};
use time::Date;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }

    /// Whether a retry against the same store could plausibly succeed.
    /// Terminal outcomes (not found, duplicates, bad input) never do.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Persistence(_) | Self::Timeout)
    }
}

/// Result of the transactional like registration.
///
/// The Like insert and the counter increment happen inside the adapter
/// as one atomic unit; callers only ever see one of these outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeWrite {
    Created { like_count: i64 },
    AlreadyLiked { like_count: i64 },
    ProductMissing,
}

/// Result of the transactional like cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnlikeWrite {
    Removed { like_count: i64 },
    NotLiked { like_count: i64 },
    ProductMissing,
}

#[async_trait]
pub trait ProductsRepo: Send + Sync {
    /// Fetch one page of products in the given total order, optionally
    /// constrained to a brand. `limit` may exceed the page size by one
    /// so callers can detect whether more rows follow.
    async fn list_products(
        &self,
        sort: ProductSort,
        brand_id: Option<i64>,
        offset: u64,
        limit: u32,
    ) -> Result<Vec<Product>, RepoError>;

    async fn find_product(&self, product_id: i64) -> Result<Option<Product>, RepoError>;
}

#[async_trait]
pub trait LikesRepo: Send + Sync {
    /// Insert a (product, user) like if absent and bump the denormalized
    /// counter with a store-side atomic increment, in one transaction.
    async fn register_like(&self, product_id: i64, user_id: i64) -> Result<LikeWrite, RepoError>;

    /// Delete the like if present and decrement the counter (floored at
    /// zero), in one transaction.
    async fn cancel_like(&self, product_id: i64, user_id: i64) -> Result<UnlikeWrite, RepoError>;

    /// Count the active like rows for a product. Reconciliation only;
    /// the read path trusts `Product::like_count`.
    async fn count_likes(&self, product_id: i64) -> Result<i64, RepoError>;

    /// Products the user has liked, most recently liked first (ties by
    /// descending product id).
    async fn liked_products(&self, user_id: i64) -> Result<Vec<Product>, RepoError>;
}

#[async_trait]
pub trait BrandsRepo: Send + Sync {
    async fn find_brand(&self, brand_id: i64) -> Result<Option<Brand>, RepoError>;

    async fn brand_names(&self, brand_ids: &[i64]) -> Result<HashMap<i64, String>, RepoError>;
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub login_id: String,
    pub email: String,
    pub birth_date: Date,
    pub gender: Gender,
}

#[async_trait]
pub trait UsersRepo: Send + Sync {
    /// Insert a new account; `RepoError::Duplicate` when the login id is
    /// already taken.
    async fn create_user(&self, user: NewUser) -> Result<User, RepoError>;

    async fn find_user_by_login(&self, login_id: &str) -> Result<Option<User>, RepoError>;
}
