//! In-memory repository implementations.
//!
//! Back the integration tests and the `--in-memory` dev mode with the
//! same contracts as the Postgres adapters. One mutex guards the whole
//! state so the like write path is atomic exactly like its SQL
//! transaction counterpart.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use time::OffsetDateTime;

use crate::application::repos::{
    BrandsRepo, LikeWrite, LikesRepo, NewUser, ProductsRepo, RepoError, UnlikeWrite, UsersRepo,
};
use crate::domain::catalog::{Brand, Product, ProductSort};
use crate::domain::like::Like;
use crate::domain::user::User;

#[derive(Default)]
struct MemoryState {
    products: BTreeMap<i64, Product>,
    brands: BTreeMap<i64, Brand>,
    // Like rows keyed by (product, user); the sequence number stands in
    // for insertion order so recency sorts are deterministic.
    likes: BTreeMap<(i64, i64), (i64, Like)>,
    like_seq: i64,
    users: BTreeMap<i64, User>,
    next_user_id: i64,
}

#[derive(Clone, Default)]
pub struct MemoryRepositories {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryRepositories {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn seed_brand(&self, id: i64, name: &str) {
        self.lock().brands.insert(
            id,
            Brand {
                id,
                name: name.to_string(),
            },
        );
    }

    pub fn seed_product(&self, product: Product) {
        self.lock().products.insert(product.id, product);
    }

    /// Direct mutation outside the like write path; test setup only.
    pub fn set_like_count(&self, product_id: i64, like_count: i64) {
        if let Some(product) = self.lock().products.get_mut(&product_id) {
            product.like_count = like_count;
        }
    }

    pub fn product(&self, product_id: i64) -> Option<Product> {
        self.lock().products.get(&product_id).cloned()
    }
}

#[async_trait]
impl ProductsRepo for MemoryRepositories {
    async fn list_products(
        &self,
        sort: ProductSort,
        brand_id: Option<i64>,
        offset: u64,
        limit: u32,
    ) -> Result<Vec<Product>, RepoError> {
        let state = self.lock();
        let mut rows: Vec<Product> = state
            .products
            .values()
            .filter(|p| brand_id.is_none_or(|id| p.brand_id == id))
            .cloned()
            .collect();
        rows.sort_by(|a, b| sort.compare(a, b));
        Ok(rows
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn find_product(&self, product_id: i64) -> Result<Option<Product>, RepoError> {
        Ok(self.lock().products.get(&product_id).cloned())
    }
}

#[async_trait]
impl LikesRepo for MemoryRepositories {
    async fn register_like(&self, product_id: i64, user_id: i64) -> Result<LikeWrite, RepoError> {
        let mut state = self.lock();
        if !state.products.contains_key(&product_id) {
            return Ok(LikeWrite::ProductMissing);
        }
        let inserted = if state.likes.contains_key(&(product_id, user_id)) {
            false
        } else {
            state.like_seq += 1;
            let seq = state.like_seq;
            state.likes.insert(
                (product_id, user_id),
                (
                    seq,
                    Like {
                        product_id,
                        user_id,
                        created_at: OffsetDateTime::now_utc(),
                    },
                ),
            );
            true
        };
        let product = state
            .products
            .get_mut(&product_id)
            .ok_or(RepoError::NotFound)?;
        if inserted {
            product.like_count += 1;
            Ok(LikeWrite::Created {
                like_count: product.like_count,
            })
        } else {
            Ok(LikeWrite::AlreadyLiked {
                like_count: product.like_count,
            })
        }
    }

    async fn cancel_like(&self, product_id: i64, user_id: i64) -> Result<UnlikeWrite, RepoError> {
        let mut state = self.lock();
        if !state.products.contains_key(&product_id) {
            return Ok(UnlikeWrite::ProductMissing);
        }
        let removed = state.likes.remove(&(product_id, user_id)).is_some();
        let product = state
            .products
            .get_mut(&product_id)
            .ok_or(RepoError::NotFound)?;
        if removed {
            product.like_count = (product.like_count - 1).max(0);
            Ok(UnlikeWrite::Removed {
                like_count: product.like_count,
            })
        } else {
            Ok(UnlikeWrite::NotLiked {
                like_count: product.like_count,
            })
        }
    }

    async fn count_likes(&self, product_id: i64) -> Result<i64, RepoError> {
        let state = self.lock();
        Ok(state
            .likes
            .keys()
            .filter(|(pid, _)| *pid == product_id)
            .count() as i64)
    }

    async fn liked_products(&self, user_id: i64) -> Result<Vec<Product>, RepoError> {
        let state = self.lock();
        let mut liked: Vec<(i64, i64)> = state
            .likes
            .iter()
            .filter(|((_, uid), _)| *uid == user_id)
            .map(|((pid, _), (seq, _))| (*seq, *pid))
            .collect();
        liked.sort_unstable_by(|a, b| b.cmp(a));
        Ok(liked
            .into_iter()
            .filter_map(|(_, pid)| state.products.get(&pid).cloned())
            .collect())
    }
}

#[async_trait]
impl BrandsRepo for MemoryRepositories {
    async fn find_brand(&self, brand_id: i64) -> Result<Option<Brand>, RepoError> {
        Ok(self.lock().brands.get(&brand_id).cloned())
    }

    async fn brand_names(&self, brand_ids: &[i64]) -> Result<HashMap<i64, String>, RepoError> {
        let state = self.lock();
        Ok(brand_ids
            .iter()
            .filter_map(|id| state.brands.get(id).map(|b| (b.id, b.name.clone())))
            .collect())
    }
}

#[async_trait]
impl UsersRepo for MemoryRepositories {
    async fn create_user(&self, user: NewUser) -> Result<User, RepoError> {
        let mut state = self.lock();
        if state.users.values().any(|u| u.login_id == user.login_id) {
            return Err(RepoError::Duplicate {
                constraint: "users_login_id_key".to_string(),
            });
        }
        state.next_user_id += 1;
        let id = state.next_user_id;
        let record = User {
            id,
            login_id: user.login_id,
            email: user.email,
            birth_date: user.birth_date,
            gender: user.gender,
            created_at: OffsetDateTime::now_utc(),
        };
        state.users.insert(id, record.clone());
        Ok(record)
    }

    async fn find_user_by_login(&self, login_id: &str) -> Result<Option<User>, RepoError> {
        Ok(self
            .lock()
            .users
            .values()
            .find(|u| u.login_id == login_id)
            .cloned())
    }
}
