//! In-memory store doubles for service tests

use async_trait::async_trait;
use chrono::Utc;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
    error::{DatabaseError, DatabaseResult},
    users::{NewUser, User, UserStore},
};

/// User store kept in a map
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserStore {
    users: Arc<Mutex<HashMap<Uuid, User>>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a user directly, bypassing password hashing
    pub async fn seed(&self, name: &str, email: &str) -> User {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: email.to_string(),
            password_hash: String::new(),
            created_at: now,
            updated_at: now,
        };
        self.users.lock().await.insert(user.id, user.clone());
        user
    }

    /// Drop a user, leaving any references to it dangling
    pub async fn remove(&self, id: Uuid) {
        self.users.lock().await.remove(&id);
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn create(&self, new_user: NewUser) -> DatabaseResult<User> {
        let mut users = self.users.lock().await;
        if users.values().any(|u| u.email == new_user.email) {
            return Err(DatabaseError::UniqueViolation {
                field: "email".to_string(),
            });
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: new_user.name,
            email: new_user.email,
            password_hash: new_user.password_hash,
            created_at: now,
            updated_at: now,
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> DatabaseResult<Option<User>> {
        let users = self.users.lock().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<User>> {
        Ok(self.users.lock().await.get(&id).cloned())
    }
}
