//! Interactive intake — Slack posts button clicks here.
//!
//! A valid removal click triggers a synchronous blackhole delete against
//! the mitigation API; only when the block is verifiably gone does an
//! update event go onto the queue so the worker retracts the button.

use std::collections::HashMap;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::Router;
use serde::Deserialize;
use serde_json::Value;

use fnm_common::error::AppError;
use fnm_common::queue;
use fnm_common::types::{UPDATE_QUEUE, UpdateEvent};

use crate::middleware::auth::verify_slack_request;
use crate::mitigation::RemoveOutcome;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/slack_interaction", post(slack_interaction))
}

/// Wire shape of the parts of Slack's interaction payload the relay
/// consumes.
#[derive(Debug, Deserialize)]
struct Interaction {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    actions: Vec<InteractionAction>,
    channel: Option<InteractionChannel>,
    message: Option<InteractionMessage>,
}

#[derive(Debug, Deserialize)]
struct InteractionAction {
    #[serde(default)]
    value: String,
}

#[derive(Debug, Deserialize)]
struct InteractionChannel {
    id: String,
}

#[derive(Debug, Deserialize)]
struct InteractionMessage {
    ts: String,
    #[serde(default)]
    blocks: Vec<Value>,
}

/// POST /slack_interaction — signature-verified interactive callback.
async fn slack_interaction(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    // Refusing unsigned input beats silently accepting it.
    let Some(secret) = state.config.slack_signing_secret.as_deref() else {
        return Err(AppError::NotImplemented(
            "signature verification is not configured".to_string(),
        ));
    };
    if !verify_slack_request(secret, &headers, &body) {
        return Err(AppError::Signature("invalid request".to_string()));
    }

    let params: HashMap<String, String> = form_urlencoded::parse(&body).into_owned().collect();
    let Some(payload) = params.get("payload") else {
        return Ok(().into_response());
    };
    let interaction: Interaction = serde_json::from_str(payload)
        .map_err(|e| AppError::Validation(format!("malformed interaction payload: {e}")))?;

    if interaction.kind != "block_actions" || interaction.actions.is_empty() {
        return Ok(().into_response());
    }
    let attack_uuid = &interaction.actions[0].value;
    tracing::info!(attack_uuid = %attack_uuid, "Operator requested block removal");

    let outcome = match state.mitigation.remove_blackhole(attack_uuid).await {
        Ok(outcome) => outcome,
        Err(e) => {
            // A 500 here would make Slack retry the interaction and
            // double-delete; acknowledge instead.
            tracing::error!(error = %e, attack_uuid = %attack_uuid, "Mitigation API unreachable");
            return Ok(().into_response());
        }
    };

    match outcome {
        RemoveOutcome::Removed | RemoveOutcome::AlreadyGone => {
            let (Some(channel), Some(message)) = (interaction.channel, interaction.message) else {
                tracing::warn!(
                    attack_uuid = %attack_uuid,
                    "Interaction payload carried no message to retract"
                );
                return Ok(().into_response());
            };

            let update = UpdateEvent {
                channel_id: channel.id,
                message_ts: message.ts,
                message_blocks: message.blocks,
            };
            let mut redis = state.redis.clone();
            queue::push(&mut redis, UPDATE_QUEUE, &update).await?;

            tracing::info!(attack_uuid = %attack_uuid, "Block removed, retraction enqueued");
            Ok(().into_response())
        }
        RemoveOutcome::Rejected { status, body } => {
            tracing::warn!(
                attack_uuid = %attack_uuid,
                status,
                body = %body,
                "Mitigation API rejected block removal"
            );
            Err(AppError::MitigationRejected("invalid request".to_string()))
        }
    }
}
