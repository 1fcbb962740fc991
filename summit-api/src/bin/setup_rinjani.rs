//! Seeds Gunung Rinjani and the Senaru route. Safe to run repeatedly.

use anyhow::Context;
use summit_store::{setup_rinjani, DbClient, StoreCatalogRepository};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "summit_store=info,setup_rinjani=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = summit_store::Config::load().context("Failed to load config")?;
    let db = DbClient::new(&config.database)
        .await
        .context("Failed to connect to Postgres")?;
    db.migrate().await.context("Failed to run migrations")?;

    let catalog = StoreCatalogRepository::new(db.pool.clone());
    let report = setup_rinjani(&catalog).await?;

    let verb = |created: bool| if created { "Created" } else { "Already exists" };
    println!("{}: {}", verb(report.mountain_created), report.mountain.name);
    println!(
        "{}: {} ({}, Rp {} per orang)",
        verb(report.route_created),
        report.route.name,
        report.route.duration_text(),
        report.route.price_per_person
    );
    println!("Booking URL: /bookings/create?package=populer");
    Ok(())
}
