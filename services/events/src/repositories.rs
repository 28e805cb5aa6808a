//! Repositories for event persistence

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::error::DatabaseResult;
use uuid::Uuid;

use crate::models::Event;

pub mod event;
#[cfg(test)]
pub mod memory;

pub use event::PgEventRepository;

/// Storage for events
#[async_trait]
pub trait EventStore: Send + Sync {
    /// All events, date ascending and newest-created first within a date
    async fn list(&self) -> DatabaseResult<Vec<Event>>;

    /// Persist a freshly built event
    async fn insert(&self, event: &Event) -> DatabaseResult<Event>;

    async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<Event>>;

    /// Write the host-editable fields of `event`.
    ///
    /// Host, attendees, bookers and creation time are never written here.
    /// Returns `None` if the event no longer exists.
    async fn update(&self, event: &Event) -> DatabaseResult<Option<Event>>;

    /// Returns whether a row was removed
    async fn delete(&self, id: Uuid) -> DatabaseResult<bool>;

    /// Consume one slot for `user_id` as a single conditional write.
    ///
    /// Returns `None` when the event is gone or already at capacity.
    async fn book(
        &self,
        id: Uuid,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> DatabaseResult<Option<Event>>;

    /// Number of distinct events whose bookers include `user_id`
    async fn count_booked_events(&self, user_id: Uuid) -> DatabaseResult<i64>;
}
