//! Integration tests for the worker's Redis-backed pieces.
//!
//! Requires a running Redis instance.
//!
//! ```bash
//! REDIS_URL="redis://localhost:6379" \
//!   cargo test -p fnm-worker --test integration -- --ignored --nocapture
//! ```

use std::time::Duration;

use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use serde_json::json;
use uuid::Uuid;

use fnm_common::queue;
use fnm_common::types::{ATTACK_QUEUE, AttackEvent, CorrelationKey, UPDATE_QUEUE, UpdateEvent};
use fnm_worker::correlation::ThreadStore;

async fn connect() -> ConnectionManager {
    let url =
        std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());
    redis::Client::open(url.as_str())
        .unwrap()
        .get_connection_manager()
        .await
        .unwrap()
}

fn ban_event(uuid: &str) -> AttackEvent {
    serde_json::from_value(json!({
        "action": "ban",
        "ip": "192.0.2.7",
        "attack_details": {"attack_uuid": uuid},
    }))
    .unwrap()
}

// ============================================================
// Thread-correlation store
// ============================================================

#[tokio::test]
#[ignore]
async fn test_store_round_trip() {
    let redis = connect().await;
    let mut store = ThreadStore::new(redis, 3600);

    let event = ban_event(&Uuid::new_v4().to_string());
    let key = CorrelationKey::for_event(&event).unwrap();

    assert_eq!(store.get(&key).await.unwrap(), None);
    store.set(&key, "1700.0001").await.unwrap();
    assert_eq!(store.get(&key).await.unwrap().as_deref(), Some("1700.0001"));
}

#[tokio::test]
#[ignore]
async fn test_store_record_expires_after_ttl() {
    let redis = connect().await;
    let mut store = ThreadStore::new(redis, 3600);

    let event: AttackEvent = serde_json::from_value(json!({
        "action": "partial_block",
        "ip": "192.0.2.8",
        "attack_details": {
            "attack_uuid": Uuid::new_v4().to_string(),
            "attack_direction": "incoming",
        },
    }))
    .unwrap();
    let key = CorrelationKey::for_event(&event).unwrap();

    store.set_with_ttl(&key, "1700.0002", 1).await.unwrap();
    assert_eq!(store.get(&key).await.unwrap().as_deref(), Some("1700.0002"));

    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert_eq!(store.get(&key).await.unwrap(), None);
}

#[tokio::test]
#[ignore]
async fn test_store_overwrite_replaces_handle() {
    let redis = connect().await;
    let mut store = ThreadStore::new(redis, 3600);

    let event = ban_event(&Uuid::new_v4().to_string());
    let key = CorrelationKey::for_event(&event).unwrap();

    store.set(&key, "1700.0001").await.unwrap();
    store.set(&key, "1700.0009").await.unwrap();
    assert_eq!(store.get(&key).await.unwrap().as_deref(), Some("1700.0009"));
}

// ============================================================
// Durable queues
// ============================================================

#[tokio::test]
#[ignore]
async fn test_queue_push_pop_preserves_order_and_content() {
    let mut redis = connect().await;
    redis
        .del::<_, ()>(&[ATTACK_QUEUE, UPDATE_QUEUE])
        .await
        .unwrap();

    let first = ban_event("uuid-first");
    let second = ban_event("uuid-second");
    queue::push(&mut redis, ATTACK_QUEUE, &first).await.unwrap();
    queue::push(&mut redis, ATTACK_QUEUE, &second).await.unwrap();

    let (origin, raw) = queue::pop_blocking(&mut redis, &[ATTACK_QUEUE, UPDATE_QUEUE])
        .await
        .unwrap();
    assert_eq!(origin, ATTACK_QUEUE);
    let event: AttackEvent = serde_json::from_str(&raw).unwrap();
    assert_eq!(event.attack_uuid(), Some("uuid-first"));

    let (_, raw) = queue::pop_blocking(&mut redis, &[ATTACK_QUEUE, UPDATE_QUEUE])
        .await
        .unwrap();
    let event: AttackEvent = serde_json::from_str(&raw).unwrap();
    assert_eq!(event.attack_uuid(), Some("uuid-second"));
}

#[tokio::test]
#[ignore]
async fn test_pop_reports_queue_of_origin() {
    let mut redis = connect().await;
    redis
        .del::<_, ()>(&[ATTACK_QUEUE, UPDATE_QUEUE])
        .await
        .unwrap();

    let update = UpdateEvent {
        channel_id: "C123".to_string(),
        message_ts: "1700.0001".to_string(),
        message_blocks: vec![json!({"type": "divider"})],
    };
    queue::push(&mut redis, UPDATE_QUEUE, &update).await.unwrap();

    let (origin, raw) = queue::pop_blocking(&mut redis, &[ATTACK_QUEUE, UPDATE_QUEUE])
        .await
        .unwrap();
    assert_eq!(origin, UPDATE_QUEUE);
    let event: UpdateEvent = serde_json::from_str(&raw).unwrap();
    assert_eq!(event.message_ts, "1700.0001");
}
