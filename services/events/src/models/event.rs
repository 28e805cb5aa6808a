//! Event model, request payloads and field rules

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::ApiError;

/// Event entity, serialized as the public event JSON shape
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    #[sqlx(rename = "event_date")]
    pub date: DateTime<Utc>,
    pub time: String,
    pub location: String,
    pub description: String,
    pub category: String,
    pub image_url: Option<String>,
    pub host_id: Uuid,
    pub attendees: i32,
    pub capacity: i32,
    pub is_public: bool,
    pub price: f64,
    pub booked_by: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    pub fn is_hosted_by(&self, user_id: Uuid) -> bool {
        self.host_id == user_id
    }

    pub fn is_sold_out(&self) -> bool {
        self.attendees >= self.capacity
    }

    /// Check the persisted-state rules, reporting every violation at once
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut errors = Vec::new();

        for (value, name) in [
            (&self.title, "Title"),
            (&self.time, "Time"),
            (&self.location, "Location"),
            (&self.description, "Description"),
            (&self.category, "Category"),
        ] {
            if value.trim().is_empty() {
                errors.push(format!("{} is required", name));
            }
        }

        if self.capacity < 1 {
            errors.push("Capacity must be at least 1".to_string());
        } else if self.attendees > self.capacity {
            errors.push("Capacity cannot be less than the number of attendees".to_string());
        }

        if self.attendees < 0 {
            errors.push("Attendees cannot be negative".to_string());
        }

        if !self.price.is_finite() {
            errors.push("Price must be a number".to_string());
        } else if self.price < 0.0 {
            errors.push("Price cannot be negative".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(errors))
        }
    }
}

/// Request for event creation
///
/// Numeric fields accept JSON numbers or numeric strings, and `isPublic`
/// accepts booleans or their string and 0/1 spellings.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    pub title: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub capacity: Option<Value>,
    pub is_public: Option<Value>,
    pub price: Option<Value>,
}

impl CreateEventRequest {
    /// Check that every required field is present and parse the date
    pub fn event_date(&self) -> Result<DateTime<Utc>, ApiError> {
        let present = |field: &Option<String>| field.as_deref().is_some_and(|s| !s.is_empty());

        let complete = present(&self.title)
            && present(&self.date)
            && present(&self.time)
            && present(&self.location)
            && present(&self.description)
            && present(&self.category)
            && self.capacity.is_some();

        if !complete {
            return Err(ApiError::MissingFields);
        }

        parse_event_date(self.date.as_deref().unwrap_or_default())
    }

    /// Build the event a host is about to create
    pub fn into_event(
        self,
        date: DateTime<Utc>,
        host_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Event, ApiError> {
        let mut errors = Vec::new();

        let capacity = match &self.capacity {
            Some(value) => coerce_capacity(value, &mut errors),
            None => {
                errors.push("Capacity is required".to_string());
                None
            }
        };
        let price = match &self.price {
            Some(value) => coerce_price(value, &mut errors),
            None => Some(0.0),
        };
        let is_public = match &self.is_public {
            Some(value) => coerce_flag(value, &mut errors),
            None => Some(true),
        };

        let (Some(capacity), Some(price), Some(is_public)) = (capacity, price, is_public) else {
            return Err(ApiError::Validation(errors));
        };

        let event = Event {
            id: Uuid::new_v4(),
            title: trimmed(self.title),
            date,
            time: self.time.unwrap_or_default(),
            location: trimmed(self.location),
            description: trimmed(self.description),
            category: trimmed(self.category),
            image_url: self.image_url.and_then(optional_url),
            host_id,
            attendees: 0,
            capacity,
            is_public,
            price,
            booked_by: Vec::new(),
            created_at: now,
            updated_at: now,
        };

        event.validate()?;
        Ok(event)
    }
}

/// Request for a partial event update
///
/// `hostId`, `attendees`, `bookedBy`, `createdAt` and `updatedAt` have no field
/// here, so serde drops them from the payload without complaint.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventRequest {
    pub title: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    /// Absent leaves the image alone, `null` clears it
    #[serde(default, deserialize_with = "present")]
    pub image_url: Option<Option<String>>,
    pub capacity: Option<Value>,
    pub is_public: Option<Value>,
    pub price: Option<Value>,
}

impl UpdateEventRequest {
    /// Apply the update in place and report whether any field changed.
    ///
    /// On error `event` may be partially modified and must be discarded.
    pub fn apply_to(self, event: &mut Event) -> Result<bool, ApiError> {
        let date = self.date.as_deref().map(parse_event_date).transpose()?;

        let mut errors = Vec::new();
        let capacity = self
            .capacity
            .as_ref()
            .and_then(|value| coerce_capacity(value, &mut errors));
        let price = self
            .price
            .as_ref()
            .and_then(|value| coerce_price(value, &mut errors));
        let is_public = self
            .is_public
            .as_ref()
            .and_then(|value| coerce_flag(value, &mut errors));
        if !errors.is_empty() {
            return Err(ApiError::Validation(errors));
        }

        let mut changed = false;
        changed |= assign(&mut event.title, self.title.map(Some).map(trimmed));
        changed |= assign(&mut event.date, date);
        changed |= assign(&mut event.time, self.time);
        changed |= assign(&mut event.location, self.location.map(Some).map(trimmed));
        changed |= assign(
            &mut event.description,
            self.description.map(Some).map(trimmed),
        );
        changed |= assign(&mut event.category, self.category.map(Some).map(trimmed));
        changed |= assign(
            &mut event.image_url,
            self.image_url.map(|url| url.and_then(optional_url)),
        );
        changed |= assign(&mut event.capacity, capacity);
        changed |= assign(&mut event.is_public, is_public);
        changed |= assign(&mut event.price, price);

        event.validate()?;
        Ok(changed)
    }
}

/// Deserialize a field that was present in the payload, keeping `null` as
/// `Some(None)`; combined with `#[serde(default)]` an absent field is `None`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Parse an event date.
///
/// Accepts `YYYY-MM-DD` (midnight UTC), RFC 3339 timestamps, and naive
/// `YYYY-MM-DDTHH:MM[:SS]` timestamps read as UTC.
pub fn parse_event_date(raw: &str) -> Result<DateTime<Utc>, ApiError> {
    let raw = raw.trim();

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }

    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Ok(timestamp.with_timezone(&Utc));
    }

    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.and_utc())
        .ok_or(ApiError::InvalidDate)
}

fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|n| n.is_finite())
}

fn coerce_capacity(value: &Value, errors: &mut Vec<String>) -> Option<i32> {
    match coerce_number(value) {
        None => {
            errors.push("Capacity must be a number".to_string());
            None
        }
        Some(n) if n.fract() != 0.0 || n < f64::from(i32::MIN) || n > f64::from(i32::MAX) => {
            errors.push("Capacity must be a whole number".to_string());
            None
        }
        Some(n) => Some(n as i32),
    }
}

fn coerce_price(value: &Value, errors: &mut Vec<String>) -> Option<f64> {
    let price = coerce_number(value);
    if price.is_none() {
        errors.push("Price must be a number".to_string());
    }
    price
}

fn coerce_flag(value: &Value, errors: &mut Vec<String>) -> Option<bool> {
    let flag = match value {
        Value::Bool(flag) => Some(*flag),
        Value::Number(n) => match n.as_f64() {
            Some(n) if n == 1.0 => Some(true),
            Some(n) if n == 0.0 => Some(false),
            _ => None,
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Some(true),
            "false" | "0" | "no" => Some(false),
            _ => None,
        },
        _ => None,
    };
    if flag.is_none() {
        errors.push("isPublic must be true or false".to_string());
    }
    flag
}

fn trimmed(value: Option<String>) -> String {
    value.map(|s| s.trim().to_string()).unwrap_or_default()
}

fn optional_url(url: String) -> Option<String> {
    let url = url.trim();
    (!url.is_empty()).then(|| url.to_string())
}

fn assign<T: PartialEq>(slot: &mut T, value: Option<T>) -> bool {
    match value {
        Some(value) if *slot != value => {
            *slot = value;
            true
        }
        _ => false,
    }
}
