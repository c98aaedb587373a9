//! Ouverture du pool PostgreSQL et exécution des migrations.

use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use log::{info, LevelFilter};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{ConnectOptions, PgPool};

use crate::consts::{
    DB_ACQUIRE_TIMEOUT, DB_IDLE_TIMEOUT, DB_MAX_CONNECTIONS, DB_STATEMENT_TIMEOUT,
};

/// Ouvre le pool de connexions avec les limites de l'application.
/// Chaque connexion reçoit un `statement_timeout` côté serveur pour borner
/// les requêtes non paginées.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    let options = PgConnectOptions::from_str(database_url)
        .context("DATABASE_URL invalide")?
        .options([("statement_timeout", DB_STATEMENT_TIMEOUT)])
        .log_statements(LevelFilter::Debug)
        .log_slow_statements(LevelFilter::Warn, Duration::from_secs(1));

    let pool = PgPoolOptions::new()
        .max_connections(DB_MAX_CONNECTIONS)
        .idle_timeout(DB_IDLE_TIMEOUT)
        .acquire_timeout(DB_ACQUIRE_TIMEOUT)
        .connect_with(options)
        .await
        .context("Connexion à PostgreSQL impossible")?;

    info!("Pool PostgreSQL ouvert ({} connexions max)", DB_MAX_CONNECTIONS);
    Ok(pool)
}

/// Applique les migrations embarquées dans le binaire.
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::migrate!()
        .run(pool)
        .await
        .context("Échec des migrations")?;
    info!("Migrations appliquées");
    Ok(())
}
