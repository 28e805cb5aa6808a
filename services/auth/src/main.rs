use anyhow::Result;
use std::sync::Arc;
use tracing::info;

mod error;
mod middleware;
mod models;
mod password;
mod routes;
mod state;
mod validation;

use common::{
    database::{DatabaseConfig, health_check, init_pool, run_migrations},
    jwt::{JwtConfig, JwtService},
    lifecycle::shutdown_signal,
    settings::{ServerConfig, init_tracing},
    users::PgUserStore,
};
use tokio::net::TcpListener;

use crate::state::AppState;

const DEFAULT_PORT: u16 = 5000;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing()?;

    info!("Starting authentication service");

    let server_config = ServerConfig::from_env(DEFAULT_PORT)?;

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    // Check database connectivity
    if health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    run_migrations(&pool).await?;

    // Initialize JWT service
    let jwt_service = JwtService::new(JwtConfig::from_env()?);

    let app_state = AppState {
        users: Arc::new(PgUserStore::new(pool.clone())),
        jwt_service,
    };

    let app = routes::create_router(app_state);

    let address = server_config.bind_address();
    let listener = TcpListener::bind(&address).await?;
    info!("Authentication service listening on {}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pool.close().await;
    info!("Authentication service stopped");

    Ok(())
}
