use async_trait::async_trait;

use crate::application::repos::{LikeWrite, LikesRepo, RepoError, UnlikeWrite};
use crate::domain::catalog::Product;

use super::products::ProductRow;
use super::{PostgresRepositories, map_sqlx_error};

#[async_trait]
impl LikesRepo for PostgresRepositories {
    async fn register_like(&self, product_id: i64, user_id: i64) -> Result<LikeWrite, RepoError> {
        let mut tx = self.pool().begin().await.map_err(map_sqlx_error)?;

        let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM products WHERE id = $1")
            .bind(product_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
        if exists.is_none() {
            tx.rollback().await.map_err(map_sqlx_error)?;
            return Ok(LikeWrite::ProductMissing);
        }

        // ON CONFLICT makes the registration idempotent: a concurrent or
        // repeated insert for the same pair affects zero rows.
        let inserted = sqlx::query(
            "INSERT INTO likes (product_id, user_id) VALUES ($1, $2) \
             ON CONFLICT (product_id, user_id) DO NOTHING",
        )
        .bind(product_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?
        .rows_affected()
            == 1;

        let like_count: i64 = if inserted {
            // Store-side atomic increment; never read-modify-write here.
            sqlx::query_scalar(
                "UPDATE products SET like_count = like_count + 1 WHERE id = $1 \
                 RETURNING like_count",
            )
            .bind(product_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(map_sqlx_error)?
        } else {
            sqlx::query_scalar("SELECT like_count FROM products WHERE id = $1")
                .bind(product_id)
                .fetch_one(&mut *tx)
                .await
                .map_err(map_sqlx_error)?
        };

        tx.commit().await.map_err(map_sqlx_error)?;

        Ok(if inserted {
            LikeWrite::Created { like_count }
        } else {
            LikeWrite::AlreadyLiked { like_count }
        })
    }

    async fn cancel_like(&self, product_id: i64, user_id: i64) -> Result<UnlikeWrite, RepoError> {
        let mut tx = self.pool().begin().await.map_err(map_sqlx_error)?;

        let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM products WHERE id = $1")
            .bind(product_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
        if exists.is_none() {
            tx.rollback().await.map_err(map_sqlx_error)?;
            return Ok(UnlikeWrite::ProductMissing);
        }

        let removed = sqlx::query("DELETE FROM likes WHERE product_id = $1 AND user_id = $2")
            .bind(product_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?
            .rows_affected()
            == 1;

        let like_count: i64 = if removed {
            sqlx::query_scalar(
                "UPDATE products SET like_count = GREATEST(like_count - 1, 0) WHERE id = $1 \
                 RETURNING like_count",
            )
            .bind(product_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(map_sqlx_error)?
        } else {
            sqlx::query_scalar("SELECT like_count FROM products WHERE id = $1")
                .bind(product_id)
                .fetch_one(&mut *tx)
                .await
                .map_err(map_sqlx_error)?
        };

        tx.commit().await.map_err(map_sqlx_error)?;

        Ok(if removed {
            UnlikeWrite::Removed { like_count }
        } else {
            UnlikeWrite::NotLiked { like_count }
        })
    }

    async fn count_likes(&self, product_id: i64) -> Result<i64, RepoError> {
        sqlx::query_scalar("SELECT COUNT(*) FROM likes WHERE product_id = $1")
            .bind(product_id)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)
    }

    async fn liked_products(&self, user_id: i64) -> Result<Vec<Product>, RepoError> {
        let rows: Vec<ProductRow> = sqlx::query_as(
            "SELECT p.id, p.brand_id, p.name, p.price, p.like_count, p.created_at \
             FROM products p JOIN likes l ON l.product_id = p.id \
             WHERE l.user_id = $1 ORDER BY l.created_at DESC, p.id DESC",
        )
        .bind(user_id)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;
        Ok(rows.into_iter().map(Product::from).collect())
    }
}
