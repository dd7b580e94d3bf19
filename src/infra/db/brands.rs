use std::collections::HashMap;

use async_trait::async_trait;

use crate::application::repos::{BrandsRepo, RepoError};
use crate::domain::catalog::Brand;

use super::{PostgresRepositories, map_sqlx_error};

#[async_trait]
impl BrandsRepo for PostgresRepositories {
    async fn find_brand(&self, brand_id: i64) -> Result<Option<Brand>, RepoError> {
        let row: Option<(i64, String)> =
            sqlx::query_as("SELECT id, name FROM brands WHERE id = $1")
                .bind(brand_id)
                .fetch_optional(self.pool())
                .await
                .map_err(map_sqlx_error)?;
        Ok(row.map(|(id, name)| Brand { id, name }))
    }

    async fn brand_names(&self, brand_ids: &[i64]) -> Result<HashMap<i64, String>, RepoError> {
        if brand_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows: Vec<(i64, String)> =
            sqlx::query_as("SELECT id, name FROM brands WHERE id = ANY($1)")
                .bind(brand_ids)
                .fetch_all(self.pool())
                .await
                .map_err(map_sqlx_error)?;
        Ok(rows.into_iter().collect())
    }
}
