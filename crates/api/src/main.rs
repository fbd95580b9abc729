use anyhow::Context;

use jobdeck_api::app;
use jobdeck_api::config::ServerConfig;
use jobdeck_infra::StoreConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    jobdeck_observability::init();

    let server = ServerConfig::from_env()?;
    let stores = StoreConfig::from_env()?;

    let services = app::services::build_services(&stores)
        .await
        .context("failed to build services")?;
    let app = app::build_app(std::sync::Arc::new(services));

    let listener = tokio::net::TcpListener::bind(server.addr)
        .await
        .with_context(|| format!("failed to bind {}", server.addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
