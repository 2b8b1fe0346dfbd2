//! User account persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::{error::AppError, models::user::User, types::UserId};

const SELECT_COLUMNS: &str = "id, username, email, password_hash, role, employee_code, is_active, \
     setup_token, setup_token_expires_at, last_login_at, created_at, updated_at";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepositoryTrait: Send + Sync {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, AppError>;

    /// Looks up a user by username or email, ignoring case.
    async fn find_by_login(&self, login: &str) -> Result<Option<User>, AppError>;

    async fn find_by_setup_token(&self, token: &str) -> Result<Option<User>, AppError>;

    async fn find_by_employee_code(&self, code: &str) -> Result<Option<User>, AppError>;

    async fn create(&self, user: &User) -> Result<User, AppError>;

    /// Stores the first password, activates the account and burns the setup token.
    async fn complete_setup(
        &self,
        id: UserId,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<(), AppError>;

    async fn set_password(
        &self,
        id: UserId,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<(), AppError>;

    async fn refresh_setup_token(
        &self,
        id: UserId,
        token: &str,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<(), AppError>;

    async fn touch_last_login(&self, id: UserId, now: DateTime<Utc>) -> Result<(), AppError>;
}

#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_where(&self, clause: &str, value: &str) -> Result<Option<User>, AppError> {
        let query = format!("SELECT {} FROM users WHERE {}", SELECT_COLUMNS, clause);
        let user = sqlx::query_as::<_, User>(&query)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }
}

fn ensure_updated(rows: u64) -> Result<(), AppError> {
    if rows == 0 {
        return Err(AppError::NotFound("User not found".into()));
    }
    Ok(())
}

#[async_trait]
impl UserRepositoryTrait for UserRepository {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, AppError> {
        let query = format!("SELECT {} FROM users WHERE id = $1", SELECT_COLUMNS);
        let user = sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_by_login(&self, login: &str) -> Result<Option<User>, AppError> {
        self.find_where("LOWER(username) = LOWER($1) OR LOWER(email) = LOWER($1)", login)
            .await
    }

    async fn find_by_setup_token(&self, token: &str) -> Result<Option<User>, AppError> {
        self.find_where("setup_token = $1", token).await
    }

    async fn find_by_employee_code(&self, code: &str) -> Result<Option<User>, AppError> {
        self.find_where("employee_code = $1", code).await
    }

    async fn create(&self, user: &User) -> Result<User, AppError> {
        let query = format!(
            "INSERT INTO users (id, username, email, password_hash, role, employee_code, \
             is_active, setup_token, setup_token_expires_at, last_login_at, created_at, \
             updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
             RETURNING {}",
            SELECT_COLUMNS
        );
        let created = sqlx::query_as::<_, User>(&query)
            .bind(user.id)
            .bind(&user.username)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.role.as_str())
            .bind(&user.employee_code)
            .bind(user.is_active)
            .bind(&user.setup_token)
            .bind(user.setup_token_expires_at)
            .bind(user.last_login_at)
            .bind(user.created_at)
            .bind(user.updated_at)
            .fetch_one(&self.pool)
            .await?;
        Ok(created)
    }

    async fn complete_setup(
        &self,
        id: UserId,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE users SET password_hash = $2, is_active = TRUE, setup_token = NULL, \
             setup_token_expires_at = NULL, updated_at = $3 WHERE id = $1",
        )
        .bind(id)
        .bind(password_hash)
        .bind(now)
        .execute(&self.pool)
        .await?;
        ensure_updated(result.rows_affected())
    }

    async fn set_password(
        &self,
        id: UserId,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let result =
            sqlx::query("UPDATE users SET password_hash = $2, updated_at = $3 WHERE id = $1")
                .bind(id)
                .bind(password_hash)
                .bind(now)
                .execute(&self.pool)
                .await?;
        ensure_updated(result.rows_affected())
    }

    async fn refresh_setup_token(
        &self,
        id: UserId,
        token: &str,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE users SET setup_token = $2, setup_token_expires_at = $3, updated_at = $4 \
             WHERE id = $1",
        )
        .bind(id)
        .bind(token)
        .bind(expires_at)
        .bind(now)
        .execute(&self.pool)
        .await?;
        ensure_updated(result.rows_affected())
    }

    async fn touch_last_login(&self, id: UserId, now: DateTime<Utc>) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET last_login_at = $2 WHERE id = $1")
            .bind(id)
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
