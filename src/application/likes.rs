//! Like aggregator: idempotent registration with an atomic counter
//! increment, plus the cache invalidation it owes the catalog.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tracing::{info, warn};

use crate::cache::{CacheStore, keys};
use crate::resilience::{DependencyGuard, Retry};

use super::brands::BrandDirectory;
use super::catalog::{ProductSummary, summarize};
use super::error::AppError;
use super::repos::{LikeWrite, LikesRepo, UnlikeWrite};

/// Outcome of a like registration. Repeats are acknowledged, never
/// double-counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeOutcome {
    Created { like_count: i64 },
    AlreadyExists { like_count: i64 },
}

impl LikeOutcome {
    pub fn like_count(&self) -> i64 {
        match self {
            Self::Created { like_count } | Self::AlreadyExists { like_count } => *like_count,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnlikeOutcome {
    Removed { like_count: i64 },
    NotLiked { like_count: i64 },
}

impl UnlikeOutcome {
    pub fn like_count(&self) -> i64 {
        match self {
            Self::Removed { like_count } | Self::NotLiked { like_count } => *like_count,
        }
    }
}

pub struct LikeService {
    likes: Arc<dyn LikesRepo>,
    brands: Arc<BrandDirectory>,
    cache: Arc<dyn CacheStore>,
    guard: Arc<DependencyGuard>,
    counter_ttl: Duration,
}

impl LikeService {
    pub fn new(
        likes: Arc<dyn LikesRepo>,
        brands: Arc<BrandDirectory>,
        cache: Arc<dyn CacheStore>,
        guard: Arc<DependencyGuard>,
        counter_ttl: Duration,
    ) -> Self {
        Self {
            likes,
            brands,
            cache,
            guard,
            counter_ttl,
        }
    }

    /// Register a like for (product, user).
    ///
    /// The write is idempotent by contract, which is what makes it safe
    /// to retry under the guard: re-issuing a registration that already
    /// landed reports `AlreadyExists` instead of double counting.
    pub async fn register_like(
        &self,
        product_id: i64,
        user_id: i64,
    ) -> Result<LikeOutcome, AppError> {
        let likes = Arc::clone(&self.likes);
        let write = self
            .guard
            .call(Retry::Idempotent, move || {
                let likes = Arc::clone(&likes);
                async move { likes.register_like(product_id, user_id).await }
            })
            .await
            .map_err(|err| AppError::from_guard(err, "product"))?;

        match write {
            LikeWrite::Created { like_count } => {
                info!(product_id, user_id, like_count, "like registered");
                self.refresh_counter_caches(product_id, like_count).await;
                Ok(LikeOutcome::Created { like_count })
            }
            LikeWrite::AlreadyLiked { like_count } => {
                Ok(LikeOutcome::AlreadyExists { like_count })
            }
            LikeWrite::ProductMissing => Err(AppError::NotFound("product")),
        }
    }

    /// Remove a like for (product, user); the mirror of registration.
    pub async fn cancel_like(
        &self,
        product_id: i64,
        user_id: i64,
    ) -> Result<UnlikeOutcome, AppError> {
        let likes = Arc::clone(&self.likes);
        let write = self
            .guard
            .call(Retry::Idempotent, move || {
                let likes = Arc::clone(&likes);
                async move { likes.cancel_like(product_id, user_id).await }
            })
            .await
            .map_err(|err| AppError::from_guard(err, "product"))?;

        match write {
            UnlikeWrite::Removed { like_count } => {
                info!(product_id, user_id, like_count, "like removed");
                self.refresh_counter_caches(product_id, like_count).await;
                Ok(UnlikeOutcome::Removed { like_count })
            }
            UnlikeWrite::NotLiked { like_count } => Ok(UnlikeOutcome::NotLiked { like_count }),
            UnlikeWrite::ProductMissing => Err(AppError::NotFound("product")),
        }
    }

    /// List the caller's liked products, most recently liked first.
    /// An account with no liked rows reads as not found.
    pub async fn liked_products(&self, user_id: i64) -> Result<Vec<ProductSummary>, AppError> {
        let likes = Arc::clone(&self.likes);
        let rows = self
            .guard
            .call(Retry::Idempotent, move || {
                let likes = Arc::clone(&likes);
                async move { likes.liked_products(user_id).await }
            })
            .await
            .map_err(|err| AppError::from_guard(err, "liked products"))?;

        if rows.is_empty() {
            return Err(AppError::NotFound("liked products"));
        }

        let brand_names = self.brands.names_for(&rows).await;
        Ok(rows
            .into_iter()
            .map(|product| summarize(product, &brand_names))
            .collect())
    }

    /// After a counter change: write the fresh counter through, drop the
    /// stale detail entry, and drop every listing page (a like can move
    /// rows across any likes_desc page boundary). All best-effort.
    async fn refresh_counter_caches(&self, product_id: i64, like_count: i64) {
        let counter_key = keys::like_count(product_id);
        let encoded = serde_json::to_vec(&like_count).unwrap_or_default();
        if let Err(err) = self
            .cache
            .set(&counter_key, Bytes::from(encoded), self.counter_ttl)
            .await
        {
            warn!(key = counter_key, error = %err, "counter cache write failed");
        }

        let detail_key = keys::product_detail(product_id);
        if let Err(err) = self.cache.remove(&detail_key).await {
            warn!(key = detail_key, error = %err, "detail cache invalidation failed");
        }

        if let Err(err) = self.cache.remove_prefix(keys::PRODUCT_LIST_PREFIX).await {
            warn!(error = %err, "list cache invalidation failed");
        }
    }
}
