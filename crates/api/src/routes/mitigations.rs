//! Operator read-through of the mitigation API's active entries.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};

use fnm_common::error::AppError;

use crate::middleware::auth::NotifyAuth;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/active_mitigations", get(active_mitigations))
}

/// GET /active_mitigations — currently active blackholes and flowspec
/// rules, straight from the mitigation API.
async fn active_mitigations(
    State(state): State<AppState>,
    _auth: NotifyAuth,
) -> Result<Json<Value>, AppError> {
    let blackholes = state.mitigation.list_blackholes().await?;
    let flowspecs = state.mitigation.list_flowspecs().await?;
    Ok(Json(json!({
        "blackholes": blackholes,
        "flowspecs": flowspecs,
    })))
}
