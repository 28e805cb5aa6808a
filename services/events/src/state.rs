//! Application state shared across handlers

use common::{jwt::JwtService, users::UserStore};
use std::sync::Arc;

use crate::{notifications::Notifier, repositories::EventStore};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub events: Arc<dyn EventStore>,
    pub users: Arc<dyn UserStore>,
    pub jwt_service: JwtService,
    pub notifier: Notifier,
}
