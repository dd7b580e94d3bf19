//! Catalog query engine: sorted, filtered, paginated product reads with
//! a cache-aside path over the persistent store.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::warn;

use crate::cache::{CacheStore, keys};
use crate::domain::catalog::{Product, ProductSort};
use crate::domain::error::DomainError;
use crate::resilience::{DependencyGuard, Retry};

use super::brands::BrandDirectory;
use super::error::AppError;
use super::repos::ProductsRepo;

#[derive(Debug, Clone)]
pub struct CatalogSettings {
    /// TTL for cached listing pages; short, they churn on every like.
    pub page_ttl: Duration,
    /// TTL for cached product detail entries.
    pub detail_ttl: Duration,
    /// TTL for cached like counters; refreshed write-through on likes.
    pub counter_ttl: Duration,
    pub allowed_page_sizes: Vec<u32>,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            page_ttl: Duration::from_secs(60),
            detail_ttl: Duration::from_secs(600),
            counter_ttl: Duration::from_secs(300),
            allowed_page_sizes: vec![10, 20, 50],
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ProductListQuery {
    pub sort: ProductSort,
    pub brand_id: Option<i64>,
    pub page: u32,
    pub size: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSummary {
    pub id: i64,
    pub brand_id: i64,
    /// Enrichment from the brand store; absent when that dependency is
    /// unavailable, which must not fail the read.
    pub brand_name: Option<String>,
    pub name: String,
    pub price: i64,
    pub like_count: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// One page of the catalog listing, the unit the cache stores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductPage {
    pub items: Vec<ProductSummary>,
    pub has_more: bool,
}

pub struct CatalogService {
    products: Arc<dyn ProductsRepo>,
    brands: Arc<BrandDirectory>,
    cache: Arc<dyn CacheStore>,
    catalog_guard: Arc<DependencyGuard>,
    settings: CatalogSettings,
}

impl CatalogService {
    pub fn new(
        products: Arc<dyn ProductsRepo>,
        brands: Arc<BrandDirectory>,
        cache: Arc<dyn CacheStore>,
        catalog_guard: Arc<DependencyGuard>,
        settings: CatalogSettings,
    ) -> Self {
        Self {
            products,
            brands,
            cache,
            catalog_guard,
            settings,
        }
    }

    /// Resolve a (sort, filter, page, size) request into a page of
    /// product summaries.
    ///
    /// The cache is consulted first; on miss the persistent store is
    /// queried through the resilience wrapper and the result is cached
    /// best-effort. An unknown brand yields an empty page, not an error.
    pub async fn list_products(&self, query: ProductListQuery) -> Result<ProductPage, AppError> {
        if !self.settings.allowed_page_sizes.contains(&query.size) {
            return Err(DomainError::PageSizeNotAllowed {
                size: query.size,
                allowed: self.settings.allowed_page_sizes.clone(),
            }
            .into());
        }

        let key = keys::product_list(query.brand_id, query.sort, query.page, query.size);
        if let Some(page) = self.cached_page(&key).await {
            return Ok(page);
        }

        let products = Arc::clone(&self.products);
        let offset = u64::from(query.page) * u64::from(query.size);
        let limit = query.size + 1;
        let mut rows = self
            .catalog_guard
            .call(Retry::Idempotent, move || {
                let products = Arc::clone(&products);
                async move {
                    products
                        .list_products(query.sort, query.brand_id, offset, limit)
                        .await
                }
            })
            .await
            .map_err(|err| AppError::from_guard(err, "product"))?;

        let has_more = rows.len() > query.size as usize;
        rows.truncate(query.size as usize);

        let brand_names = self.brands.names_for(&rows).await;
        let items = rows
            .into_iter()
            .map(|product| summarize(product, &brand_names))
            .collect();

        let page = ProductPage { items, has_more };
        self.store_page(&key, &page, self.settings.page_ttl).await;
        Ok(page)
    }

    /// Single-product read, cache-aside over the detail entry.
    ///
    /// A fresher cached like counter, maintained write-through by the
    /// like service, overlays the (longer-lived) detail entry.
    pub async fn get_product(&self, product_id: i64) -> Result<ProductSummary, AppError> {
        let key = keys::product_detail(product_id);
        match self.cache.get(&key).await {
            Ok(Some(bytes)) => match serde_json::from_slice::<ProductSummary>(&bytes) {
                Ok(mut summary) => {
                    if let Some(count) = self.cached_like_count(product_id).await {
                        summary.like_count = count;
                    }
                    return Ok(summary);
                }
                Err(err) => warn!(key, error = %err, "discarding undecodable cache entry"),
            },
            Ok(None) => {}
            Err(err) => warn!(key, error = %err, "cache read failed, falling through"),
        }

        let products = Arc::clone(&self.products);
        let product = self
            .catalog_guard
            .call(Retry::Idempotent, move || {
                let products = Arc::clone(&products);
                async move { products.find_product(product_id).await }
            })
            .await
            .map_err(|err| AppError::from_guard(err, "product"))?
            .ok_or(AppError::NotFound("product"))?;

        let brand_names = self.brands.names_for(std::slice::from_ref(&product)).await;
        let summary = summarize(product, &brand_names);

        match serde_json::to_vec(&summary) {
            Ok(bytes) => {
                if let Err(err) = self
                    .cache
                    .set(&key, Bytes::from(bytes), self.settings.detail_ttl)
                    .await
                {
                    warn!(key, error = %err, "cache populate failed");
                }
            }
            Err(err) => warn!(key, error = %err, "cache encode failed"),
        }
        Ok(summary)
    }

    async fn cached_page(&self, key: &str) -> Option<ProductPage> {
        match self.cache.get(key).await {
            Ok(Some(bytes)) => match serde_json::from_slice(&bytes) {
                Ok(page) => Some(page),
                Err(err) => {
                    warn!(key, error = %err, "discarding undecodable cache entry");
                    None
                }
            },
            Ok(None) => None,
            Err(err) => {
                // Cache trouble degrades to a direct store read.
                warn!(key, error = %err, "cache read failed, falling through");
                None
            }
        }
    }

    async fn store_page(&self, key: &str, page: &ProductPage, ttl: Duration) {
        match serde_json::to_vec(page) {
            Ok(bytes) => {
                if let Err(err) = self.cache.set(key, Bytes::from(bytes), ttl).await {
                    warn!(key, error = %err, "cache populate failed");
                }
            }
            Err(err) => warn!(key, error = %err, "cache encode failed"),
        }
    }

    async fn cached_like_count(&self, product_id: i64) -> Option<i64> {
        let key = keys::like_count(product_id);
        match self.cache.get(&key).await {
            Ok(Some(bytes)) => serde_json::from_slice(&bytes).ok(),
            _ => None,
        }
    }
}

pub(crate) fn summarize(product: Product, brand_names: &HashMap<i64, String>) -> ProductSummary {
    ProductSummary {
        id: product.id,
        brand_id: product.brand_id,
        brand_name: brand_names.get(&product.brand_id).cloned(),
        name: product.name,
        price: product.price,
        like_count: product.like_count,
        created_at: product.created_at,
    }
}
