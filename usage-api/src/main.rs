use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use usage_api::{api, config::AppConfig, metrics_server, observability};
use usage_db::db::ensure_schema;
use usage_db::UsageQueries;

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    // Load configuration
    let cfg = AppConfig::load()?;

    // Start metrics server if configured
    if let Some(metrics_cfg) = &cfg.metrics {
        let addr: SocketAddr = metrics_cfg
            .bind_addr
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid metrics.bind_addr: {e}"))?;
        metrics_server::init(addr);
    }

    let pool = PgPoolOptions::new()
        .max_connections(cfg.database.max_connections)
        .connect(&cfg.database.uri)
        .await?;
    ensure_schema(&pool).await?;

    let state = api::AppState {
        queries: UsageQueries::new(pool),
        auth_bearer_token: cfg.http.auth_bearer_token.clone(),
    };

    let addr: SocketAddr = cfg
        .http
        .bind_addr
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid http.bind_addr: {e}"))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "usage api listening");
    axum::serve(listener, api::router(state).into_make_service()).await?;

    Ok(())
}
