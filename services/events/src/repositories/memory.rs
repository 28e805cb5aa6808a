//! In-memory event store for router tests

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::error::{DatabaseError, DatabaseResult};
use std::{
    cmp::Ordering,
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering as AtomicOrdering},
    },
};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::EventStore;
use crate::models::Event;

#[derive(Debug, Clone, Default)]
pub struct InMemoryEventStore {
    events: Arc<Mutex<HashMap<Uuid, Event>>>,
    fail_next_count: Arc<AtomicBool>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count_booked_events` call fail with a query error
    pub fn fail_next_count(&self) {
        self.fail_next_count.store(true, AtomicOrdering::SeqCst);
    }
}

/// Date ascending, then most recently created first
fn listing_order(a: &Event, b: &Event) -> Ordering {
    a.date
        .cmp(&b.date)
        .then_with(|| b.created_at.cmp(&a.created_at))
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn list(&self) -> DatabaseResult<Vec<Event>> {
        let mut events: Vec<Event> = self.events.lock().await.values().cloned().collect();
        events.sort_by(listing_order);
        Ok(events)
    }

    async fn insert(&self, event: &Event) -> DatabaseResult<Event> {
        self.events.lock().await.insert(event.id, event.clone());
        Ok(event.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<Event>> {
        Ok(self.events.lock().await.get(&id).cloned())
    }

    async fn update(&self, event: &Event) -> DatabaseResult<Option<Event>> {
        let mut events = self.events.lock().await;
        let Some(stored) = events.get_mut(&event.id) else {
            return Ok(None);
        };

        stored.title = event.title.clone();
        stored.date = event.date;
        stored.time = event.time.clone();
        stored.location = event.location.clone();
        stored.description = event.description.clone();
        stored.category = event.category.clone();
        stored.image_url = event.image_url.clone();
        stored.capacity = event.capacity;
        stored.is_public = event.is_public;
        stored.price = event.price;
        stored.updated_at = event.updated_at;

        Ok(Some(stored.clone()))
    }

    async fn delete(&self, id: Uuid) -> DatabaseResult<bool> {
        Ok(self.events.lock().await.remove(&id).is_some())
    }

    async fn book(
        &self,
        id: Uuid,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> DatabaseResult<Option<Event>> {
        let mut events = self.events.lock().await;
        match events.get_mut(&id) {
            Some(event) if !event.is_sold_out() => {
                event.attendees += 1;
                event.booked_by.push(user_id);
                event.updated_at = now;
                Ok(Some(event.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn count_booked_events(&self, user_id: Uuid) -> DatabaseResult<i64> {
        if self.fail_next_count.swap(false, AtomicOrdering::SeqCst) {
            return Err(DatabaseError::Query(sqlx::Error::PoolTimedOut));
        }

        let events = self.events.lock().await;
        let count = events
            .values()
            .filter(|event| event.booked_by.contains(&user_id))
            .count();
        Ok(count as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn event_on(day: u32, created_at: DateTime<Utc>, capacity: i32) -> Event {
        Event {
            id: Uuid::new_v4(),
            title: format!("Event on day {day}"),
            date: Utc.with_ymd_and_hms(2025, 6, day, 0, 0, 0).unwrap(),
            time: "18:00".to_string(),
            location: "Berlin".to_string(),
            description: "Meetup".to_string(),
            category: "Tech".to_string(),
            image_url: None,
            host_id: Uuid::new_v4(),
            attendees: 0,
            capacity,
            is_public: true,
            price: 0.0,
            booked_by: Vec::new(),
            created_at,
            updated_at: created_at,
        }
    }

    #[tokio::test]
    async fn test_list_orders_by_date_then_newest_first() {
        let store = InMemoryEventStore::new();
        let now = Utc::now();

        let same_day_old = event_on(2, now - Duration::hours(2), 10);
        let same_day_new = event_on(2, now, 10);
        let early = event_on(1, now - Duration::hours(5), 10);
        for event in [&same_day_old, &same_day_new, &early] {
            store.insert(event).await.unwrap();
        }

        let listed = store.list().await.unwrap();
        assert_eq!(listed, vec![early, same_day_new, same_day_old]);
    }

    #[tokio::test]
    async fn test_book_records_repeat_bookers() {
        let store = InMemoryEventStore::new();
        let event = store.insert(&event_on(1, Utc::now(), 5)).await.unwrap();
        let booker = Uuid::new_v4();

        store.book(event.id, booker, Utc::now()).await.unwrap();
        let booked = store
            .book(event.id, booker, Utc::now())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(booked.attendees, 2);
        assert_eq!(booked.booked_by, vec![booker, booker]);
        assert!(booked.updated_at >= event.updated_at);
        assert_eq!(store.count_booked_events(booker).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_book_refuses_full_or_missing_events() {
        let store = InMemoryEventStore::new();
        let event = store.insert(&event_on(1, Utc::now(), 1)).await.unwrap();

        assert!(store.book(event.id, Uuid::new_v4(), Utc::now()).await.unwrap().is_some());
        assert!(store.book(event.id, Uuid::new_v4(), Utc::now()).await.unwrap().is_none());
        assert!(store.book(Uuid::new_v4(), Uuid::new_v4(), Utc::now()).await.unwrap().is_none());

        let stored = store.find_by_id(event.id).await.unwrap().unwrap();
        assert_eq!(stored.attendees, 1);
    }

    #[tokio::test]
    async fn test_fail_next_count_fails_once() {
        let store = InMemoryEventStore::new();
        let user = Uuid::new_v4();

        store.fail_next_count();
        assert!(matches!(
            store.count_booked_events(user).await,
            Err(DatabaseError::Query(_))
        ));
        assert_eq!(store.count_booked_events(user).await.unwrap(), 0);
    }
}
