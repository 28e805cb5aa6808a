use anyhow::Result;
use std::{sync::Arc, time::Duration};
use tracing::{info, warn};

mod error;
mod middleware;
mod models;
mod notifications;
mod repositories;
mod routes;
mod state;

use common::{
    database::{DatabaseConfig, health_check, init_pool, run_migrations},
    jwt::{JwtConfig, JwtService},
    lifecycle::shutdown_signal,
    settings::{ServerConfig, env_or, init_tracing},
    users::PgUserStore,
};
use tokio::net::TcpListener;

use crate::{
    notifications::{ConsoleMailer, EmailConfig, Mailer, Notifier, SmtpMailer},
    repositories::PgEventRepository,
    state::AppState,
};

const DEFAULT_PORT: u16 = 5001;

async fn build_mailer() -> Result<Arc<dyn Mailer>> {
    let Some(config) = EmailConfig::from_env() else {
        warn!(
            "Email service is not configured. Set EMAIL_HOST, EMAIL_USER and EMAIL_PASS to send mail; logging messages instead"
        );
        return Ok(Arc::new(ConsoleMailer));
    };

    let mailer = SmtpMailer::new(&config)?;
    match mailer.verify().await {
        Ok(true) => info!("Email transport ready via {}:{}", config.host, config.port),
        Ok(false) => warn!("SMTP relay {} refused the connection test", config.host),
        Err(e) => warn!("SMTP relay {} could not be verified: {}", config.host, e),
    }

    Ok(Arc::new(mailer))
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing()?;

    info!("Starting events service");

    let server_config = ServerConfig::from_env(DEFAULT_PORT)?;

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    if health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    run_migrations(&pool).await?;

    let jwt_service = JwtService::new(JwtConfig::from_env()?);

    let send_timeout = env_or("EMAIL_SEND_TIMEOUT_SECS", 10);
    let notifier = Notifier::new(build_mailer().await?, Duration::from_secs(send_timeout));

    let app_state = AppState {
        events: Arc::new(PgEventRepository::new(pool.clone())),
        users: Arc::new(PgUserStore::new(pool.clone())),
        jwt_service,
        notifier,
    };

    let app = routes::create_router(app_state);

    let address = server_config.bind_address();
    let listener = TcpListener::bind(&address).await?;
    info!("Events service listening on {}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pool.close().await;
    info!("Events service stopped");

    Ok(())
}
