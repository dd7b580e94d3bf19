use async_trait::async_trait;
use sqlx::FromRow;
use time::OffsetDateTime;

use crate::application::repos::{ProductsRepo, RepoError};
use crate::domain::catalog::{Product, ProductSort};

use super::{PostgresRepositories, map_sqlx_error};

#[derive(FromRow)]
pub(super) struct ProductRow {
    id: i64,
    brand_id: i64,
    name: String,
    price: i64,
    like_count: i64,
    created_at: OffsetDateTime,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            brand_id: row.brand_id,
            name: row.name,
            price: row.price,
            like_count: row.like_count,
            created_at: row.created_at,
        }
    }
}

const SELECT_COLUMNS: &str = "id, brand_id, name, price, like_count, created_at";

/// ORDER BY clause per sort key. The id tie-break keeps page windows
/// stable under concurrent inserts.
fn order_clause(sort: ProductSort) -> &'static str {
    match sort {
        ProductSort::Latest => "created_at DESC, id DESC",
        ProductSort::PriceAsc => "price ASC, id ASC",
        ProductSort::LikesDesc => "like_count DESC, id DESC",
    }
}

#[async_trait]
impl ProductsRepo for PostgresRepositories {
    async fn list_products(
        &self,
        sort: ProductSort,
        brand_id: Option<i64>,
        offset: u64,
        limit: u32,
    ) -> Result<Vec<Product>, RepoError> {
        let order = order_clause(sort);
        let rows: Vec<ProductRow> = match brand_id {
            Some(brand_id) => {
                let sql = format!(
                    "SELECT {SELECT_COLUMNS} FROM products \
                     WHERE brand_id = $1 ORDER BY {order} LIMIT $2 OFFSET $3"
                );
                sqlx::query_as(&sql)
                    .bind(brand_id)
                    .bind(i64::from(limit))
                    .bind(offset as i64)
                    .fetch_all(self.pool())
                    .await
            }
            None => {
                let sql = format!(
                    "SELECT {SELECT_COLUMNS} FROM products \
                     ORDER BY {order} LIMIT $1 OFFSET $2"
                );
                sqlx::query_as(&sql)
                    .bind(i64::from(limit))
                    .bind(offset as i64)
                    .fetch_all(self.pool())
                    .await
            }
        }
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn find_product(&self, product_id: i64) -> Result<Option<Product>, RepoError> {
        let sql = format!("SELECT {SELECT_COLUMNS} FROM products WHERE id = $1");
        let row: Option<ProductRow> = sqlx::query_as(&sql)
            .bind(product_id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.map(Product::from))
    }
}
