//! Outbound notifier — delivers composed payloads through the outbound
//! gate to the Slack API.
//!
//! Slack renders one rich attachment per call cleanly, so a payload is
//! split into an initial post carrying the core blocks and one threaded
//! follow-up per attachment. A mid-sequence failure leaves a partially
//! illustrated message; accepted, the thread handle was already
//! resolved by the first post.

use serde_json::{Value, json};

use fnm_common::types::MessagePayload;
use fnm_slack::{SlackClient, SlackError};

use crate::gate::OutboundGate;

pub struct Notifier {
    client: SlackClient,
    gate: OutboundGate,
}

impl Notifier {
    pub fn new(client: SlackClient, gate: OutboundGate) -> Self {
        Self { client, gate }
    }

    /// Deliver a composed payload and return the resolved thread handle:
    /// the pre-existing `thread_ts` for replies, otherwise the timestamp
    /// Slack assigned to the initial post.
    pub async fn notify(&mut self, payload: &MessagePayload) -> Result<String, SlackError> {
        self.gate.pace().await;

        let mut body = json!({
            "channel": payload.channel,
            "username": payload.username,
            "icon_emoji": payload.icon_emoji,
            "blocks": payload.blocks,
        });
        if let Some(fallback) = &payload.fallback {
            body["text"] = json!(fallback);
        }
        if let Some(ts) = &payload.thread_ts {
            body["thread_ts"] = json!(ts);
        }

        let posted_ts = self.client.post_message(&body).await?;
        let thread = payload.thread_ts.clone().unwrap_or(posted_ts);

        for attachment in &payload.attachments {
            self.gate.pace().await;
            let follow_up = json!({
                "channel": payload.channel,
                "username": payload.username,
                "icon_emoji": payload.icon_emoji,
                "thread_ts": thread,
                "text": attachment.fallback,
                "attachments": [{
                    "fallback": attachment.fallback,
                    "blocks": attachment.blocks,
                }],
            });
            self.client.post_message(&follow_up).await?;
        }

        Ok(thread)
    }

    /// Edit a previously posted message in place (button retraction).
    pub async fn update(
        &mut self,
        channel: &str,
        ts: &str,
        blocks: &[Value],
    ) -> Result<(), SlackError> {
        self.gate.pace().await;
        let body = json!({
            "channel": channel,
            "ts": ts,
            "blocks": blocks,
        });
        self.client.update_message(&body).await
    }
}
