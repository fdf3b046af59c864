//! Seed the first Seatbook administrator.
//!
//! # Usage
//!
//! ```bash
//! DATABASE_URL=postgres://… SEED_ADMIN_EMAIL=ops@example.com cargo run --bin seed_admin
//! ```
//!
//! Prints the administrator's id, which the gateway then sends as
//! `X-Person-Id`.

use anyhow::Context;
use seatbook_postgres::PostgresStore;
use seatbook_server::{Config, SeedAdmin, seed_admin};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let dotenv = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "seatbook_server=info,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
    tracing::debug!(dotenv = dotenv.is_ok(), "Environment loaded");

    let config = Config::from_env();
    let settings = SeedAdmin::from_lookup(|key| std::env::var(key).ok())?;

    let store = PostgresStore::connect(&config.database.url, &config.pool_options())
        .await
        .context("connecting to PostgreSQL")?;
    store.migrate().await.context("running migrations")?;

    let admin = seed_admin(&store, settings).await?;
    println!("{}", admin.id);
    Ok(())
}
