use anyhow::Context;
use local_deployment::LocalDeployment;
use server::routes;
use services::services::config::Config;
use tracing_subscriber::{EnvFilter, prelude::*};
use utils::sentry::{init as init_sentry, sentry_layer};

const DEFAULT_LOG_FILTER: &str = "info,server=debug,services=debug,db=info";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::from_env().context("failed to load configuration")?;
    let environment = if cfg!(debug_assertions) { "dev" } else { "production" };
    let _sentry = init_sentry(config.sentry_dsn.as_deref(), environment);

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(DEFAULT_LOG_FILTER))
        .context("failed to build log filter")?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_filter(env_filter))
        .with(sentry_layer())
        .init();

    let addr = config.socket_addr()?;
    let deployment = LocalDeployment::from_config(config).await?;
    let app = routes::router(deployment);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("Server running on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to install Ctrl+C handler: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
