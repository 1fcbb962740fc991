use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use summit_api::{app, state::{AppState, AuthConfig}};
use summit_store::{
    DbClient, LocalMedia, StoreBookingRepository, StoreCatalogRepository, StoreCheckInRepository,
    StoreUserRepository,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "summit_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = summit_store::Config::load().context("Failed to load config")?;
    tracing::info!("Starting Summit API on port {}", config.server.port);

    let db = DbClient::new(&config.database)
        .await
        .context("Failed to connect to Postgres")?;
    db.migrate().await.context("Failed to run migrations")?;

    if config.auth.admin_secret_code.is_empty() {
        tracing::warn!("auth.admin_secret_code is empty; staff registration is disabled");
    }

    let app_state = AppState {
        users: Arc::new(StoreUserRepository::new(db.pool.clone())),
        catalog: Arc::new(StoreCatalogRepository::new(db.pool.clone())),
        bookings: Arc::new(StoreBookingRepository::new(db.pool.clone())),
        checkins: Arc::new(StoreCheckInRepository::new(db.pool.clone())),
        media: LocalMedia::new(&config.media.root),
        auth: AuthConfig::from(&config.auth),
        rules: config.booking_rules.clone(),
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
