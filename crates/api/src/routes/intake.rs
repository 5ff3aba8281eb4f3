//! Lifecycle intake — the detection engine pushes mitigation events here.

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::Value;

use fnm_common::error::AppError;
use fnm_common::queue;
use fnm_common::types::{ATTACK_QUEUE, AttackAction, AttackEvent};

use crate::middleware::auth::NotifyAuth;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/receive_message", post(receive_message))
}

/// POST /receive_message — validate and enqueue a lifecycle event.
///
/// Responds success as soon as the event is on the queue; delivery to
/// the chat channel is asynchronous and not awaited.
async fn receive_message(
    State(state): State<AppState>,
    _auth: NotifyAuth,
    Json(body): Json<Value>,
) -> Result<String, AppError> {
    let event: AttackEvent = serde_json::from_value(body)
        .map_err(|e| AppError::Validation(format!("invalid event: {e}")))?;
    if event.action == AttackAction::Unknown {
        return Err(AppError::Validation(
            "unrecognized action value".to_string(),
        ));
    }

    let mut redis = state.redis.clone();
    queue::push(&mut redis, ATTACK_QUEUE, &event).await?;

    tracing::info!(action = %event.action, ip = %event.ip, "Lifecycle event enqueued");
    Ok("Success".to_string())
}
