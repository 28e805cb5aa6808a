//! Application state shared across handlers

use common::{jwt::JwtService, users::UserStore};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub jwt_service: JwtService,
}
