//! Common library for the EventHub backend
//!
//! This crate provides the infrastructure shared by the auth and events
//! services: database connectivity and migrations, error types, bearer token
//! handling, user storage and process settings.

pub mod database;
pub mod error;
pub mod jwt;
pub mod lifecycle;
#[cfg(any(test, feature = "testing"))]
pub mod memory;
pub mod settings;
pub mod users;
