//! FnmRelay ingress binary entrypoint.

use std::net::SocketAddr;

use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use fnm_common::config::AppConfig;
use fnm_common::redis_pool::create_redis_pool;

use fnm_api::mitigation::MitigationClient;
use fnm_api::routes::create_router;
use fnm_api::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("fnm_api=debug,tower_http=debug")),
        )
        .init();

    tracing::info!("Starting FnmRelay ingress...");

    // Load configuration
    let config = AppConfig::from_env()?;

    // Connect to Redis (the durable queues)
    let redis = create_redis_pool(&config.redis_url).await?;

    let mitigation = MitigationClient::new(
        config.fnm_api_url.clone(),
        config.fnm_api_username.clone(),
        config.fnm_api_password.clone(),
    );

    if config.slack_signing_secret.is_none() {
        tracing::warn!("SLACK_SIGNING_SECRET not set; interactive endpoint will answer 501");
    }

    // Build application state and router
    let addr: SocketAddr = config.listen_addr.parse()?;
    let state = AppState::new(redis, mitigation, config);
    let app = create_router(state).layer(TraceLayer::new_for_http());

    tracing::info!("Ingress listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
