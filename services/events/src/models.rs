//! API models for request and response payloads

pub mod event;

pub use event::{CreateEventRequest, Event, UpdateEventRequest};
