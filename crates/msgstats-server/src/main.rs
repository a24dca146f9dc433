mod api;
mod middleware;
mod scheduler;

use std::sync::Arc;

use msgstats_refresh::RefreshOrchestrator;
use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, AppState},
    middleware::BearerAuth,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = msgstats_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = msgstats_db::PoolConfig::from_app_config(&config);
    let pool = msgstats_db::connect_pool(&config.database_url, pool_config).await?;
    let applied = msgstats_db::run_migrations(&pool).await?;
    tracing::info!(applied, "migrations up to date");

    let orchestrator = Arc::new(RefreshOrchestrator::from_app_config(&config)?);

    let _scheduler = scheduler::build_scheduler(
        pool.clone(),
        Arc::clone(&orchestrator),
        config.refresh_cron.as_deref(),
    )
    .await?;

    let auth = BearerAuth::from_keys(
        config.api_keys.as_deref(),
        matches!(config.env, msgstats_core::Environment::Development),
    )?;
    let app = build_app(AppState { pool, orchestrator }, auth);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, env = %config.env, "msgstats-server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
