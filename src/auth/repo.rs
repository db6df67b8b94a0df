use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use crate::auth::repo_types::{NewUser, User};
use crate::error::RepoError;

/// Persistence contract for user records.
///
/// Implementations must enforce email uniqueness themselves; callers may
/// pre-check with `get_by_email` but that check is not a guarantee.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a user. Fails with `Duplicate` if the email is taken.
    async fn create(&self, user: NewUser) -> Result<User, RepoError>;

    async fn get_by_id(&self, id: Uuid) -> Result<User, RepoError>;

    async fn get_by_email(&self, email: &str) -> Result<User, RepoError>;

    /// Overwrite name, email and hash of an existing user.
    async fn update(&self, user: &User) -> Result<User, RepoError>;

    async fn delete(&self, id: Uuid) -> Result<(), RepoError>;
}

/// Postgres-backed store; every query is bounded by `query_timeout`.
#[derive(Clone)]
pub struct PgUserRepository {
    db: PgPool,
    query_timeout: Duration,
}

impl PgUserRepository {
    pub fn new(db: PgPool, query_timeout: Duration) -> Self {
        Self { db, query_timeout }
    }

    async fn bounded<T, F>(&self, fut: F) -> Result<T, RepoError>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        match tokio::time::timeout(self.query_timeout, fut).await {
            Ok(res) => res.map_err(RepoError::from),
            Err(_) => Err(RepoError::Timeout),
        }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, user: NewUser) -> Result<User, RepoError> {
        let created = self
            .bounded(
                sqlx::query_as::<_, User>(
                    r#"
                    INSERT INTO users (name, email, password_hash)
                    VALUES ($1, $2, $3)
                    RETURNING id, name, email, password_hash, created_at, updated_at
                    "#,
                )
                .bind(&user.name)
                .bind(&user.email)
                .bind(&user.password_hash)
                .fetch_one(&self.db),
            )
            .await?;
        debug!(user_id = %created.id, "user row inserted");
        Ok(created)
    }

    async fn get_by_id(&self, id: Uuid) -> Result<User, RepoError> {
        self.bounded(
            sqlx::query_as::<_, User>(
                r#"
                SELECT id, name, email, password_hash, created_at, updated_at
                FROM users
                WHERE id = $1
                "#,
            )
            .bind(id)
            .fetch_optional(&self.db),
        )
        .await?
        .ok_or(RepoError::NotFound)
    }

    async fn get_by_email(&self, email: &str) -> Result<User, RepoError> {
        self.bounded(
            sqlx::query_as::<_, User>(
                r#"
                SELECT id, name, email, password_hash, created_at, updated_at
                FROM users
                WHERE email = $1
                "#,
            )
            .bind(email)
            .fetch_optional(&self.db),
        )
        .await?
        .ok_or(RepoError::NotFound)
    }

    async fn update(&self, user: &User) -> Result<User, RepoError> {
        self.bounded(
            sqlx::query_as::<_, User>(
                r#"
                UPDATE users
                   SET name = $2, email = $3, password_hash = $4, updated_at = now()
                 WHERE id = $1
                RETURNING id, name, email, password_hash, created_at, updated_at
                "#,
            )
            .bind(user.id)
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .fetch_optional(&self.db),
        )
        .await?
        .ok_or(RepoError::NotFound)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let result = self
            .bounded(
                sqlx::query("DELETE FROM users WHERE id = $1")
                    .bind(id)
                    .execute(&self.db),
            )
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}
