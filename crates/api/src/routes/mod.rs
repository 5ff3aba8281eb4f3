pub mod health;
pub mod intake;
pub mod interaction;
pub mod mitigations;

use axum::Router;

use crate::state::AppState;

/// Build the complete ingress router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(intake::router())
        .merge(interaction::router())
        .merge(mitigations::router())
        .with_state(state)
}
