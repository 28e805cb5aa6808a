//! PostgreSQL event repository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::error::{DatabaseError, DatabaseResult};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use super::EventStore;
use crate::models::Event;

/// Event repository for database operations
#[derive(Clone)]
pub struct PgEventRepository {
    pool: PgPool,
}

impl PgEventRepository {
    /// Create a new event repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventStore for PgEventRepository {
    async fn list(&self) -> DatabaseResult<Vec<Event>> {
        sqlx::query_as::<_, Event>(
            r#"
            SELECT id, title, event_date, time, location, description, category, image_url,
                   host_id, attendees, capacity, is_public, price, booked_by,
                   created_at, updated_at
            FROM events
            ORDER BY event_date ASC, created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::Query)
    }

    async fn insert(&self, event: &Event) -> DatabaseResult<Event> {
        info!("Creating event {} for host {}", event.id, event.host_id);

        sqlx::query_as::<_, Event>(
            r#"
            INSERT INTO events (id, title, event_date, time, location, description, category,
                                image_url, host_id, attendees, capacity, is_public, price,
                                booked_by, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            RETURNING id, title, event_date, time, location, description, category, image_url,
                      host_id, attendees, capacity, is_public, price, booked_by,
                      created_at, updated_at
            "#,
        )
        .bind(event.id)
        .bind(&event.title)
        .bind(event.date)
        .bind(&event.time)
        .bind(&event.location)
        .bind(&event.description)
        .bind(&event.category)
        .bind(&event.image_url)
        .bind(event.host_id)
        .bind(event.attendees)
        .bind(event.capacity)
        .bind(event.is_public)
        .bind(event.price)
        .bind(&event.booked_by)
        .bind(event.created_at)
        .bind(event.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DatabaseError::from_query(e, "id"))
    }

    async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<Event>> {
        sqlx::query_as::<_, Event>(
            r#"
            SELECT id, title, event_date, time, location, description, category, image_url,
                   host_id, attendees, capacity, is_public, price, booked_by,
                   created_at, updated_at
            FROM events
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::Query)
    }

    async fn update(&self, event: &Event) -> DatabaseResult<Option<Event>> {
        info!("Updating event {}", event.id);

        sqlx::query_as::<_, Event>(
            r#"
            UPDATE events
            SET title = $2, event_date = $3, time = $4, location = $5, description = $6,
                category = $7, image_url = $8, capacity = $9, is_public = $10, price = $11,
                updated_at = $12
            WHERE id = $1
            RETURNING id, title, event_date, time, location, description, category, image_url,
                      host_id, attendees, capacity, is_public, price, booked_by,
                      created_at, updated_at
            "#,
        )
        .bind(event.id)
        .bind(&event.title)
        .bind(event.date)
        .bind(&event.time)
        .bind(&event.location)
        .bind(&event.description)
        .bind(&event.category)
        .bind(&event.image_url)
        .bind(event.capacity)
        .bind(event.is_public)
        .bind(event.price)
        .bind(event.updated_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::Query)
    }

    async fn delete(&self, id: Uuid) -> DatabaseResult<bool> {
        info!("Deleting event {}", id);

        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::Query)?;

        Ok(result.rows_affected() > 0)
    }

    async fn book(
        &self,
        id: Uuid,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> DatabaseResult<Option<Event>> {
        // Capacity is checked by the same statement that consumes the slot
        sqlx::query_as::<_, Event>(
            r#"
            UPDATE events
            SET attendees = attendees + 1,
                booked_by = array_append(booked_by, $2),
                updated_at = $3
            WHERE id = $1 AND attendees < capacity
            RETURNING id, title, event_date, time, location, description, category, image_url,
                      host_id, attendees, capacity, is_public, price, booked_by,
                      created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::Query)
    }

    async fn count_booked_events(&self, user_id: Uuid) -> DatabaseResult<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM events WHERE $1 = ANY(booked_by)")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(DatabaseError::Query)
    }
}
