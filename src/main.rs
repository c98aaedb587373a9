//! Point d'entrée : configuration, pool, migrations, routeur, puis service
//! HTTP avec arrêt gracieux sur SIGINT/SIGTERM.

use std::net::SocketAddr;

use anyhow::Result;
use dotenv::dotenv;
use log::info;

use dialyse_api::backend::router::get_router;
use dialyse_api::backend::AppState;
use dialyse_api::config::Config;
use dialyse_api::db;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let config = Config::from_env()?;
    let pool = db::create_pool(&config.database_url).await?;
    db::run_migrations(&pool).await?;

    let port = config.port;
    let env_name = config.env.clone();
    let state = AppState::new(config, pool.clone());
    let app = get_router(state)?;

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("API Gestion Patients - Dialyse en écoute sur {} ({})", addr, env_name);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pool.close().await;
    info!("Pool PostgreSQL fermé");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.ok();
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(_) => std::future::pending().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    info!("Arrêt du serveur en cours");
}
