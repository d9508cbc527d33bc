//! Waymark Server — application entry point.
//!
//! Composition root for the redemption engine: structured logging,
//! environment configuration, store connection, schema migrations, and
//! engine wiring. The API surface in front of the engine lives
//! elsewhere; this binary owns process lifecycle.

use std::env;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::EnvFilter;
use waymark_db::repository::{
    SurrealBeaconRepository, SurrealScanEventRepository, SurrealScanQuotaRepository,
    SurrealXpAccountRepository,
};
use waymark_db::{DbConfig, DbManager};
use waymark_engine::{EngineConfig, ScanService};
use waymark_token::TokenConfig;

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn db_config_from_env() -> DbConfig {
    let defaults = DbConfig::default();
    DbConfig {
        url: env_or("WAYMARK_DB_URL", &defaults.url),
        namespace: env_or("WAYMARK_DB_NS", &defaults.namespace),
        database: env_or("WAYMARK_DB_NAME", &defaults.database),
        username: env_or("WAYMARK_DB_USER", &defaults.username),
        password: env_or("WAYMARK_DB_PASS", &defaults.password),
    }
}

/// Token signing configuration from the environment. The signing
/// secret is mandatory; `WAYMARK_TOKEN_SECRETS_PREVIOUS` is an optional
/// comma-separated list of still-accepted rotated-out secrets.
fn token_config_from_env() -> Option<TokenConfig> {
    let secret = env::var("WAYMARK_TOKEN_SECRET").ok()?;
    let mut config = TokenConfig::new(secret);
    if let Ok(previous) = env::var("WAYMARK_TOKEN_SECRETS_PREVIOUS") {
        for old in previous.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            config = config.with_previous(old);
        }
    }
    Some(config)
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("waymark=info".parse().unwrap()),
        )
        .json()
        .init();

    tracing::info!("Starting Waymark server...");

    let Some(tokens) = token_config_from_env() else {
        tracing::error!("WAYMARK_TOKEN_SECRET is not set; refusing to start");
        std::process::exit(1);
    };

    let db_config = db_config_from_env();
    let manager = match DbManager::connect(&db_config).await {
        Ok(manager) => manager,
        Err(e) => {
            tracing::error!(error = %e, "Failed to connect to SurrealDB");
            std::process::exit(1);
        }
    };

    if let Err(e) = waymark_db::run_migrations(manager.client()).await {
        tracing::error!(error = %e, "Schema migration failed");
        std::process::exit(1);
    }

    let db = manager.client().clone();
    let service = Arc::new(ScanService::new(
        SurrealBeaconRepository::new(db.clone()),
        SurrealScanEventRepository::new(db.clone()),
        SurrealXpAccountRepository::new(db.clone()),
        SurrealScanQuotaRepository::new(db),
        tokens,
        EngineConfig::default(),
    ));

    // Sweep idle per-beacon and per-user lock entries so the registries
    // stay proportional to the active key set.
    let sweeper = Arc::clone(&service);
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(Duration::from_secs(300));
        loop {
            tick.tick().await;
            sweeper.purge_idle_locks();
        }
    });

    tracing::info!("Waymark redemption engine ready");

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }

    tracing::info!("Waymark server stopped.");
}
