use redis::Client;
use redis::aio::ConnectionManager;

/// Open a Redis connection manager shared by the queue and the
/// thread-correlation store. The manager reconnects on its own, so both
/// binaries hold a single clone-able handle.
pub async fn create_redis_pool(redis_url: &str) -> anyhow::Result<ConnectionManager> {
    let client = Client::open(redis_url)?;
    let manager = ConnectionManager::new(client).await?;

    tracing::info!("Connected to Redis");
    Ok(manager)
}
