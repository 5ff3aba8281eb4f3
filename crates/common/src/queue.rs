//! Durable FIFO queues over Redis lists.
//!
//! The queue is the single source of truth for pending work: `RPUSH` at
//! the ingress, blocking `BLPOP` in the worker. The pop is the commit —
//! once popped, an event belongs exclusively to the worker and is never
//! re-enqueued.

use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use serde::Serialize;

use crate::error::AppError;

/// Serialize an event and append it to the named queue.
pub async fn push<T: Serialize>(
    redis: &mut ConnectionManager,
    queue: &str,
    event: &T,
) -> Result<(), AppError> {
    let body = serde_json::to_string(event)
        .map_err(|e| AppError::Queue(format!("failed to serialize event: {e}")))?;
    redis.rpush::<_, _, ()>(queue, body).await?;
    Ok(())
}

/// Block until an event is available on any of `queues`.
///
/// Returns the queue the event came from and its raw JSON payload.
/// Redis services the keys in argument order, so callers control
/// cross-queue priority by ordering `queues`. Blocks indefinitely —
/// this is the worker's sole suspension point.
pub async fn pop_blocking(
    redis: &mut ConnectionManager,
    queues: &[&str],
) -> Result<(String, String), AppError> {
    let (queue, payload): (String, String) = redis::cmd("BLPOP")
        .arg(queues)
        .arg(0)
        .query_async(redis)
        .await?;
    Ok((queue, payload))
}
