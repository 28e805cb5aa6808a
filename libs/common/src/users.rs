//! User records shared by the auth and events services
//!
//! The auth service writes users at signup; the events service only looks them
//! up to resolve hosts and bookers.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use tracing::info;
use uuid::Uuid;

use crate::error::{DatabaseError, DatabaseResult};

/// User entity
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Public view of the user, without the credential
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
        }
    }
}

/// New user creation payload; the password is already hashed
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

/// User fields safe to return to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

/// Storage for user accounts
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user; fails with [`DatabaseError::UniqueViolation`] on a taken email
    async fn create(&self, new_user: NewUser) -> DatabaseResult<User>;

    /// Find a user by email address
    async fn find_by_email(&self, email: &str) -> DatabaseResult<Option<User>>;

    /// Find a user by ID
    async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<User>>;
}

/// PostgreSQL-backed user store
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    /// Create a new user store
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, new_user: NewUser) -> DatabaseResult<User> {
        info!("Creating new user: {}", new_user.email);

        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, name, email, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, email, password_hash, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new_user.name)
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DatabaseError::from_query(e, "email"))
    }

    async fn find_by_email(&self, email: &str) -> DatabaseResult<Option<User>> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::Query)
    }

    async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<User>> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::Query)
    }
}
