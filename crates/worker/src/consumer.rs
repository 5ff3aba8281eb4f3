//! Queue consumer — the worker's single sequential loop.
//!
//! Intentionally not parallelized: Slack's per-channel rate limit and
//! the correlation read-then-write sequence are only safe under strict
//! ordering. Per-event failures (malformed payloads, rejected Slack
//! calls, unknown actions) are logged and skipped; only infrastructure
//! failures (Redis unreachable) escape `run()` so supervision can
//! restart the process.

use redis::aio::ConnectionManager;

use fnm_common::queue;
use fnm_common::types::{
    ATTACK_QUEUE, AttackAction, AttackEvent, CorrelationKey, UPDATE_QUEUE, UpdateEvent,
};

use crate::composer::{ComposeError, MessageComposer};
use crate::correlation::ThreadStore;
use crate::notifier::Notifier;

pub struct Consumer {
    redis: ConnectionManager,
    composer: MessageComposer,
    notifier: Notifier,
    store: ThreadStore,
    flowspec_ttl_secs: u64,
    /// Flipped every iteration to alternate BLPOP key order; Redis
    /// services multi-key pops in argument order, so a fixed order
    /// would starve the second queue under sustained load.
    prefer_updates: bool,
}

impl Consumer {
    pub fn new(
        redis: ConnectionManager,
        composer: MessageComposer,
        notifier: Notifier,
        store: ThreadStore,
        flowspec_ttl_secs: u64,
    ) -> Self {
        Self {
            redis,
            composer,
            notifier,
            store,
            flowspec_ttl_secs,
            prefer_updates: false,
        }
    }

    /// Main loop; never returns under normal operation. Pops exactly one
    /// event per iteration — the pop is the commit, there is no
    /// re-enqueue on failure.
    pub async fn run(&mut self) -> anyhow::Result<()> {
        tracing::info!(
            attack_queue = ATTACK_QUEUE,
            update_queue = UPDATE_QUEUE,
            "Queue consumer started"
        );

        loop {
            let order = pop_order(self.prefer_updates);
            self.prefer_updates = !self.prefer_updates;

            let (origin, raw) = queue::pop_blocking(&mut self.redis, &order).await?;
            match origin.as_str() {
                UPDATE_QUEUE => self.handle_update(&raw).await?,
                _ => self.handle_attack(&raw).await?,
            }
        }
    }

    async fn handle_attack(&mut self, raw: &str) -> anyhow::Result<()> {
        let event: AttackEvent = match serde_json::from_str(raw) {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!(error = %e, "Dropping malformed attack event");
                return Ok(());
            }
        };

        let key = CorrelationKey::for_event(&event);
        let existing_thread = match &key {
            Some(key) => self.store.get(key).await?,
            None => None,
        };

        let payload = match self.composer.compose_attack(&event, existing_thread) {
            Ok(payload) => payload,
            Err(ComposeError::UnrecognizedAction) => {
                tracing::warn!(ip = %event.ip, "Data for unknown action type");
                return Ok(());
            }
        };

        let handle = match self.notifier.notify(&payload).await {
            Ok(handle) => handle,
            Err(e) => {
                // Store left untouched: the next related event starts a
                // fresh top-level thread instead of vanishing.
                tracing::warn!(
                    error = %e,
                    action = %event.action,
                    ip = %event.ip,
                    "Slack delivery failed, notification lost"
                );
                return Ok(());
            }
        };

        if let Some(key) = &key {
            match event.action {
                AttackAction::Ban => self.store.set(key, &handle).await?,
                AttackAction::PartialBlock => {
                    self.store
                        .set_with_ttl(key, &handle, self.flowspec_ttl_secs)
                        .await?
                }
                AttackAction::Unban | AttackAction::Unknown => {}
            }
        }
        tracing::info!(
            action = %event.action,
            ip = %event.ip,
            correlation_key = ?key,
            thread = %handle,
            "Notification delivered"
        );

        Ok(())
    }

    async fn handle_update(&mut self, raw: &str) -> anyhow::Result<()> {
        let event: UpdateEvent = match serde_json::from_str(raw) {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!(error = %e, "Dropping malformed update event");
                return Ok(());
            }
        };

        let blocks = self.composer.compose_update(&event);
        match self
            .notifier
            .update(&event.channel_id, &event.message_ts, &blocks)
            .await
        {
            Ok(()) => {
                tracing::info!(
                    channel = %event.channel_id,
                    ts = %event.message_ts,
                    "Removal control retracted"
                );
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    channel = %event.channel_id,
                    ts = %event.message_ts,
                    "Slack message update failed"
                );
            }
        }

        Ok(())
    }
}

/// BLPOP key order for one iteration. Redis services multi-key pops in
/// argument order, so the preferred queue goes first.
fn pop_order(prefer_updates: bool) -> [&'static str; 2] {
    if prefer_updates {
        [UPDATE_QUEUE, ATTACK_QUEUE]
    } else {
        [ATTACK_QUEUE, UPDATE_QUEUE]
    }
}
