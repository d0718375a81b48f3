//! Backend entry-point: reads settings, prepares the database, and serves the
//! REST API with its OpenAPI docs.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

mod server;

use actix_web::web;
use mockable::DefaultEnv;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use cks_backend::inbound::http::health::HealthState;
use cks_backend::outbound::persistence::{DbPool, PoolConfig, run_migrations};
use cks_backend::settings::{BuildMode, DatabaseSettings, RuntimeSettings};
use server::{ListenerSettings, ServerConfig, create_server};

async fn prepare_database(
    database: &DatabaseSettings,
    apply_migrations: bool,
) -> std::io::Result<DbPool> {
    if apply_migrations {
        let applied = run_migrations(database.url.to_string())
            .await
            .map_err(|err| std::io::Error::other(err.to_string()))?;
        info!(applied, "database migrations complete");
    }
    DbPool::new(PoolConfig::new(database.url.as_str()).with_max_size(database.pool_max))
        .await
        .map_err(|err| std::io::Error::other(format!("create database pool: {err}")))
}

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = RuntimeSettings::from_env(&DefaultEnv::new(), BuildMode::from_debug_assertions())
        .map_err(|err| std::io::Error::other(err.to_string()))?;
    let listener = ListenerSettings::load_from_iter(std::env::args_os())
        .map_err(|err| std::io::Error::other(format!("listener settings: {err}")))?;

    let RuntimeSettings {
        database,
        identity,
        session,
    } = settings;
    if identity.is_dev_mock() {
        warn!("DEV_MOCK_AUTH enabled: development identity headers are trusted");
    }

    let mut config = ServerConfig::new(session, identity, listener.bind_addr());
    match database {
        Some(database) => {
            let pool = prepare_database(&database, listener.run_migrations).await?;
            config = config.with_db_pool(pool);
        }
        None => warn!("DATABASE_URL not set; persistence-backed routes use fixtures"),
    }

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state.clone(), config)?;
    info!(addr = %listener.bind_addr(), "listening");
    let result = server.await;
    health_state.mark_unhealthy();
    result
}
