//! Applies pending database migrations.

use diesel::{Connection, PgConnection};
use diesel_migrations::MigrationHarness;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use tutorium_core::config::load_config;
use tutorium_db::MIGRATIONS;

fn main() -> anyhow::Result<()> {
    let config = load_config()?;

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_new(config.logging.level.as_str())
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(fmt::layer().with_target(true))
        .init();

    tracing::info!("Running pending migrations");

    let mut conn = PgConnection::establish(&config.database.url)?;
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|err| anyhow::anyhow!("migration failed: {err}"))?;

    for version in &applied {
        tracing::info!(%version, "applied migration");
    }
    tracing::info!(count = applied.len(), "migrations complete");

    Ok(())
}
