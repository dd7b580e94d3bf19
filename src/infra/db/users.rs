use async_trait::async_trait;
use sqlx::FromRow;
use time::{Date, OffsetDateTime};

use crate::application::repos::{NewUser, RepoError, UsersRepo};
use crate::domain::user::{Gender, User};

use super::{PostgresRepositories, map_sqlx_error};

#[derive(FromRow)]
struct UserRow {
    id: i64,
    login_id: String,
    email: String,
    birth_date: Date,
    gender: String,
    created_at: OffsetDateTime,
}

impl UserRow {
    fn into_user(self) -> Result<User, RepoError> {
        let gender = Gender::from_code(&self.gender)
            .map_err(|_| RepoError::from_persistence(format!("bad gender code `{}`", self.gender)))?;
        Ok(User {
            id: self.id,
            login_id: self.login_id,
            email: self.email,
            birth_date: self.birth_date,
            gender,
            created_at: self.created_at,
        })
    }
}

const SELECT_COLUMNS: &str = "id, login_id, email, birth_date, gender, created_at";

#[async_trait]
impl UsersRepo for PostgresRepositories {
    async fn create_user(&self, user: NewUser) -> Result<User, RepoError> {
        let sql = format!(
            "INSERT INTO users (login_id, email, birth_date, gender) \
             VALUES ($1, $2, $3, $4) RETURNING {SELECT_COLUMNS}"
        );
        let row: UserRow = sqlx::query_as(&sql)
            .bind(&user.login_id)
            .bind(&user.email)
            .bind(user.birth_date)
            .bind(user.gender.code())
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        row.into_user()
    }

    async fn find_user_by_login(&self, login_id: &str) -> Result<Option<User>, RepoError> {
        let sql = format!("SELECT {SELECT_COLUMNS} FROM users WHERE login_id = $1");
        let row: Option<UserRow> = sqlx::query_as(&sql)
            .bind(login_id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        row.map(UserRow::into_user).transpose()
    }
}
