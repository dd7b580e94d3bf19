//! Account service backing signup and `X-USER-ID` resolution.

use std::sync::Arc;

use crate::domain::user::{User, validate_email, validate_login_id};
use crate::resilience::{DependencyGuard, Retry};

use super::error::AppError;
use super::repos::{NewUser, UsersRepo};

pub struct UserService {
    users: Arc<dyn UsersRepo>,
    guard: Arc<DependencyGuard>,
}

impl UserService {
    pub fn new(users: Arc<dyn UsersRepo>, guard: Arc<DependencyGuard>) -> Self {
        Self { users, guard }
    }

    /// Create an account; duplicate login ids are a conflict, not a
    /// retryable failure.
    pub async fn signup(&self, new_user: NewUser) -> Result<User, AppError> {
        validate_login_id(&new_user.login_id)?;
        validate_email(&new_user.email)?;

        let users = Arc::clone(&self.users);
        // Plain insert without an idempotency contract: one attempt.
        self.guard
            .call(Retry::None, move || {
                let users = Arc::clone(&users);
                let new_user = new_user.clone();
                async move { users.create_user(new_user).await }
            })
            .await
            .map_err(|err| AppError::from_guard(err, "user"))
    }

    pub async fn find_by_login(&self, login_id: &str) -> Result<Option<User>, AppError> {
        let users = Arc::clone(&self.users);
        let login_id = login_id.to_string();
        self.guard
            .call(Retry::Idempotent, move || {
                let users = Arc::clone(&users);
                let login_id = login_id.clone();
                async move { users.find_user_by_login(&login_id).await }
            })
            .await
            .map_err(|err| AppError::from_guard(err, "user"))
    }
}
