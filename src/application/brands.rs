//! Brand-name enrichment shared by the catalog and like read paths.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::warn;

use crate::domain::catalog::Product;
use crate::resilience::{DependencyGuard, Retry};

use super::repos::BrandsRepo;

/// Brand lookups run under their own guard; when the brand store is
/// down the caller still answers, just without names.
pub struct BrandDirectory {
    brands: Arc<dyn BrandsRepo>,
    guard: Arc<DependencyGuard>,
}

impl BrandDirectory {
    pub fn new(brands: Arc<dyn BrandsRepo>, guard: Arc<DependencyGuard>) -> Self {
        Self { brands, guard }
    }

    pub async fn names_for(&self, rows: &[Product]) -> HashMap<i64, String> {
        let mut brand_ids: Vec<i64> = rows.iter().map(|p| p.brand_id).collect();
        brand_ids.sort_unstable();
        brand_ids.dedup();
        if brand_ids.is_empty() {
            return HashMap::new();
        }

        let brands = Arc::clone(&self.brands);
        let result = self
            .guard
            .call(Retry::Idempotent, move || {
                let brands = Arc::clone(&brands);
                let brand_ids = brand_ids.clone();
                async move { brands.brand_names(&brand_ids).await }
            })
            .await;

        match result {
            Ok(names) => names,
            Err(err) => {
                warn!(error = %err, "brand enrichment unavailable, serving without names");
                HashMap::new()
            }
        }
    }
}
